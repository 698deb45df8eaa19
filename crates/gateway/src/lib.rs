//! Administrative HTTP API.
//!
//! Exposes a health probe and a `trigger` endpoint that scripts the whole
//! channel + session + first-exchange flow without any chat interaction.

pub mod auth;
pub mod server;

pub use server::{AppState, build_router, serve};

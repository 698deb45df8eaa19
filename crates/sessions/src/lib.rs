//! Channel-to-session bindings.
//!
//! A binding associates one chat channel with one OpenCode session id.
//! The registry is memory-resident only; every process restart starts
//! with an empty map.

pub mod error;
pub mod registry;

pub use {
    error::{Error, Result},
    registry::SessionRegistry,
};

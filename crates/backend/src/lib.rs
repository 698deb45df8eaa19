//! Supervisor and HTTP client for a local `opencode serve` process.
//!
//! The supervisor owns the subprocess lifecycle (spawn, health poll,
//! graceful stop); the client it hands out is the only way the rest of the
//! bridge talks to the server, so no request can be issued before the
//! server has reported healthy.

pub mod client;
pub mod error;
pub mod process;
pub mod wire;

pub use {
    client::OpencodeClient,
    error::{Error, Result},
    process::{ServerSettings, ServerState, Supervisor},
    wire::{MessageResponse, Part, Session, extract_text},
};

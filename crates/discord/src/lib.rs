//! Discord side of the bridge: gateway event handling, the
//! `!start` / `!stop` / `!status` command surface, message relay into
//! OpenCode sessions, and the scripted trigger flow used by the
//! administrative API.

pub mod chunk;
pub mod commands;
pub mod error;
pub mod handler;
pub mod relay;
pub mod state;
pub mod trigger;

pub use {
    chunk::{DISCORD_MAX_MESSAGE_LEN, chunk_message},
    error::{Error, Result},
    handler::OpencordHandler,
    state::{BotState, DiscordSettings, SharedBotState},
    trigger::{TriggerOutcome, run_trigger},
};

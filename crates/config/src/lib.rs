//! Configuration schema and loading for the opencord bridge.

pub mod env_subst;
pub mod loader;
pub mod schema;

pub use {
    loader::{find_config_file, load, load_config},
    schema::{ApiConfig, DiscordConfig, OpencodeConfig, OpencordConfig},
};

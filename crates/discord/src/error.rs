use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    /// The gateway handshake has not completed yet.
    #[error("discord connection is not ready yet")]
    NotReady,

    /// The bot is not a member of any guild, so there is nowhere to
    /// create channels.
    #[error("bot is not a member of any guild")]
    NoGuildAvailable,

    #[error(transparent)]
    Backend(#[from] opencord_backend::Error),

    #[error(transparent)]
    Session(#[from] opencord_sessions::Error),

    #[error("discord API call failed: {0}")]
    Discord(#[from] serenity::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

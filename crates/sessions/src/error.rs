use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    /// A channel already has a live session bound to it.
    #[error("a session is already active for channel {channel_id}")]
    SessionAlreadyActive {
        channel_id: u64,
        /// The session holding the existing binding.
        session_id: String,
    },
}

pub type Result<T> = std::result::Result<T, Error>;

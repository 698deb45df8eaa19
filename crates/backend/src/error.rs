use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    /// `start()` was called while a server process is already live.
    #[error("opencode server is already running (pid {pid})")]
    AlreadyRunning { pid: u32 },

    /// The spawned server never reported healthy within the poll budget.
    #[error("opencode server did not become healthy after {attempts} attempts")]
    StartupTimeout { attempts: u32 },

    /// The server could not be reached (connection refused, timeout).
    #[error("opencode server unreachable: {source}")]
    Unavailable {
        #[from]
        source: reqwest::Error,
    },

    /// The server answered with a non-2xx status.
    #[error("opencode request failed with status {status}: {body}")]
    Backend { status: u16, body: String },

    /// Spawning the server executable failed.
    #[error("failed to spawn opencode server: {source}")]
    Spawn {
        #[source]
        source: std::io::Error,
    },
}

pub type Result<T> = std::result::Result<T, Error>;

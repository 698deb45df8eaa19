//! Lifecycle management for the `opencode serve` subprocess.

use std::{path::PathBuf, process::Stdio, time::Duration};

use {
    secrecy::Secret,
    tokio::{
        io::{AsyncBufReadExt, BufReader},
        process::{Child, Command},
    },
    tracing::{info, warn},
};

use crate::{
    client::OpencodeClient,
    error::{Error, Result},
};

/// Executable launched by the supervisor.
const OPENCODE_BIN: &str = "opencode";

/// Health poll cadence and budget after spawn.
const HEALTH_POLL_INTERVAL: Duration = Duration::from_secs(1);
const HEALTH_POLL_ATTEMPTS: u32 = 30;

/// How long a SIGTERM'd server gets before it is force-killed.
const STOP_GRACE_PERIOD: Duration = Duration::from_secs(10);

/// Where and how the server runs.
#[derive(Clone)]
pub struct ServerSettings {
    pub hostname: String,
    pub port: u16,
    pub working_directory: PathBuf,
    /// Optional HTTP Basic credentials, forwarded to every API request.
    pub username: Option<String>,
    pub password: Option<Secret<String>>,
}

impl std::fmt::Debug for ServerSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServerSettings")
            .field("hostname", &self.hostname)
            .field("port", &self.port)
            .field("working_directory", &self.working_directory)
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            hostname: "127.0.0.1".into(),
            port: 4096,
            working_directory: PathBuf::from("."),
            username: None,
            password: None,
        }
    }
}

impl ServerSettings {
    pub fn base_url(&self) -> String {
        format!("http://{}:{}", self.hostname, self.port)
    }
}

/// Supervisor lifecycle states. There is no path back to `NotStarted`;
/// a failed or stopped server stays `Stopped`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServerState {
    NotStarted,
    Starting,
    Healthy,
    Stopping,
    Stopped,
}

/// Owns the single `opencode serve` subprocess for this bridge instance.
///
/// `start` and `stop` take `&mut self`; the binary calls both from one
/// place (startup and shutdown), so the two can never race.
pub struct Supervisor {
    settings: ServerSettings,
    child: Option<Child>,
    state: ServerState,
}

impl Supervisor {
    pub fn new(settings: ServerSettings) -> Self {
        Self {
            settings,
            child: None,
            state: ServerState::NotStarted,
        }
    }

    pub fn state(&self) -> ServerState {
        self.state
    }

    /// Whether the child process is currently alive.
    pub fn is_running(&mut self) -> bool {
        match self.child {
            Some(ref mut child) => matches!(child.try_wait(), Ok(None)),
            None => false,
        }
    }

    /// Spawn the server and wait for it to report healthy.
    ///
    /// Returns the API client scoped to the new process; handing the client
    /// out only here keeps requests from racing ahead of a healthy server.
    pub async fn start(&mut self) -> Result<OpencodeClient> {
        if let Some(ref child) = self.child {
            return Err(Error::AlreadyRunning {
                pid: child.id().unwrap_or_default(),
            });
        }

        self.state = ServerState::Starting;
        info!(
            hostname = %self.settings.hostname,
            port = self.settings.port,
            working_directory = %self.settings.working_directory.display(),
            "starting opencode server"
        );

        let mut cmd = Command::new(OPENCODE_BIN);
        cmd.arg("serve")
            .arg("--hostname")
            .arg(&self.settings.hostname)
            .arg("--port")
            .arg(self.settings.port.to_string())
            .current_dir(&self.settings.working_directory)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let mut child = match cmd.spawn() {
            Ok(child) => child,
            Err(source) => {
                self.state = ServerState::Stopped;
                return Err(Error::Spawn { source });
            },
        };

        forward_output(&mut child);
        info!(pid = child.id().unwrap_or_default(), "opencode server spawned");
        self.child = Some(child);

        let client = OpencodeClient::new(&self.settings)?;
        for attempt in 1..=HEALTH_POLL_ATTEMPTS {
            if let Ok(health) = client.health().await
                && health.healthy
            {
                self.state = ServerState::Healthy;
                info!(attempt, "opencode server healthy");
                return Ok(client);
            }
            tokio::time::sleep(HEALTH_POLL_INTERVAL).await;
        }

        // The server never came up; reap it and report the timeout.
        warn!(
            attempts = HEALTH_POLL_ATTEMPTS,
            "opencode server never became healthy, killing it"
        );
        if let Some(mut child) = self.child.take() {
            let _ = child.kill().await;
            let _ = child.wait().await;
        }
        self.state = ServerState::Stopped;
        Err(Error::StartupTimeout {
            attempts: HEALTH_POLL_ATTEMPTS,
        })
    }

    /// Stop the server: SIGTERM, bounded wait, then force kill.
    ///
    /// A no-op when nothing is running. Infallible so shutdown sequencing
    /// can never be aborted from here.
    pub async fn stop(&mut self) {
        let Some(mut child) = self.child.take() else {
            return;
        };

        self.state = ServerState::Stopping;
        info!(
            pid = child.id().unwrap_or_default(),
            "stopping opencode server"
        );

        terminate(&child);

        match tokio::time::timeout(STOP_GRACE_PERIOD, child.wait()).await {
            Ok(Ok(status)) => {
                info!(?status, "opencode server exited");
            },
            Ok(Err(e)) => {
                warn!(error = %e, "error waiting for opencode server");
            },
            Err(_) => {
                warn!("opencode server did not exit gracefully, killing");
                let _ = child.kill().await;
                let _ = child.wait().await;
            },
        }

        self.state = ServerState::Stopped;
    }
}

/// Ask the child to shut down gracefully.
#[cfg(unix)]
fn terminate(child: &Child) {
    use nix::{
        sys::signal::{Signal, kill},
        unistd::Pid,
    };

    if let Some(pid) = child.id() {
        let _ = kill(Pid::from_raw(pid as i32), Signal::SIGTERM);
    }
}

/// No SIGTERM off unix; the bounded wait in `stop` falls through to kill.
#[cfg(not(unix))]
fn terminate(_child: &Child) {}

/// Forward server stdout/stderr to tracing so its logs interleave with ours.
fn forward_output(child: &mut Child) {
    if let Some(stdout) = child.stdout.take() {
        tokio::spawn(async move {
            let mut lines = BufReader::new(stdout).lines();
            while let Ok(Some(line)) = lines.next_line().await {
                info!(target: "opencode_server", "{line}");
            }
        });
    }

    if let Some(stderr) = child.stderr.take() {
        tokio::spawn(async move {
            let mut lines = BufReader::new(stderr).lines();
            while let Ok(Some(line)) = lines.next_line().await {
                warn!(target: "opencode_server", "{line}");
            }
        });
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn settings_base_url() {
        let settings = ServerSettings {
            hostname: "localhost".into(),
            port: 4242,
            ..Default::default()
        };
        assert_eq!(settings.base_url(), "http://localhost:4242");
    }

    #[test]
    fn new_supervisor_is_not_started() {
        let mut supervisor = Supervisor::new(ServerSettings::default());
        assert_eq!(supervisor.state(), ServerState::NotStarted);
        assert!(!supervisor.is_running());
    }

    #[tokio::test]
    async fn stop_without_start_is_a_noop() {
        let mut supervisor = Supervisor::new(ServerSettings::default());
        supervisor.stop().await;
        // State is untouched: stop only transitions when a child existed.
        assert_eq!(supervisor.state(), ServerState::NotStarted);
    }

    #[tokio::test]
    async fn start_with_unusable_working_directory_reports_spawn_error() {
        let settings = ServerSettings {
            working_directory: PathBuf::from("/nonexistent/opencord-test-dir"),
            ..Default::default()
        };
        let mut supervisor = Supervisor::new(settings);

        let result = supervisor.start().await;
        assert!(matches!(result, Err(Error::Spawn { .. })));
        assert_eq!(supervisor.state(), ServerState::Stopped);
        assert!(!supervisor.is_running());
    }
}

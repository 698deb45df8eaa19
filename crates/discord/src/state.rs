use std::sync::{Arc, PoisonError, RwLock};

use {
    serenity::all::{GuildId, Http},
    tracing::{info, warn},
};

use {opencord_backend::OpencodeClient, opencord_sessions::SessionRegistry};

/// Bot-side settings carved out of the loaded config.
#[derive(Debug, Clone)]
pub struct DiscordSettings {
    /// Command prefix (`!` by default).
    pub prefix: String,
    /// Channel-name allowlist; empty allows every channel.
    pub allowed_channels: Vec<String>,
}

impl Default for DiscordSettings {
    fn default() -> Self {
        Self {
            prefix: "!".into(),
            allowed_channels: Vec::new(),
        }
    }
}

/// Gateway handles cached once the `ready` event fires.
struct GatewayConnection {
    http: Arc<Http>,
    guilds: Vec<GuildId>,
}

/// State shared between the event handler, the command surface, and the
/// administrative trigger path.
pub struct BotState {
    pub settings: DiscordSettings,
    pub backend: OpencodeClient,
    pub registry: SessionRegistry,
    connection: RwLock<Option<GatewayConnection>>,
}

pub type SharedBotState = Arc<BotState>;

impl BotState {
    pub fn new(settings: DiscordSettings, backend: OpencodeClient) -> Self {
        Self {
            settings,
            backend,
            registry: SessionRegistry::new(),
            connection: RwLock::new(None),
        }
    }

    /// Record the gateway connection once the handshake has completed.
    pub fn mark_ready(&self, http: Arc<Http>, guilds: Vec<GuildId>) {
        let mut connection = self
            .connection
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        *connection = Some(GatewayConnection { http, guilds });
    }

    pub fn is_ready(&self) -> bool {
        self.connection
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }

    /// HTTP handle and guild list, if the gateway handshake has completed.
    pub fn gateway(&self) -> Option<(Arc<Http>, Vec<GuildId>)> {
        self.connection
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .map(|conn| (Arc::clone(&conn.http), conn.guilds.clone()))
    }

    /// Whether the bot should operate in a channel with this name.
    pub fn channel_allowed(&self, channel_name: &str) -> bool {
        self.settings.allowed_channels.is_empty()
            || self
                .settings
                .allowed_channels
                .iter()
                .any(|allowed| allowed == channel_name)
    }

    /// Best-effort deletion of every registered session (shutdown path).
    /// Failures are logged and swallowed; the registry always ends empty.
    pub async fn cleanup_sessions(&self) {
        for (channel_id, session_id) in self.registry.drain() {
            match self.backend.delete_session(&session_id).await {
                Ok(()) => info!(channel_id, %session_id, "cleaned up session"),
                Err(e) => {
                    warn!(channel_id, %session_id, error = %e, "failed to clean up session");
                },
            }
        }
    }
}

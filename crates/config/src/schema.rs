use std::path::PathBuf;

use {
    secrecy::{ExposeSecret, Secret},
    serde::Deserialize,
};

/// Top-level config for the bridge.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct OpencordConfig {
    pub discord: DiscordConfig,
    pub opencode: OpencodeConfig,
    pub api: ApiConfig,
}

impl OpencordConfig {
    /// Reject configs the bridge cannot run with.
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.discord.token.expose_secret().is_empty() {
            anyhow::bail!("discord.token is required");
        }
        if self.discord.prefix.is_empty() {
            anyhow::bail!("discord.prefix must not be empty");
        }
        if self.opencode.username.is_some() != self.opencode.password.is_some() {
            anyhow::bail!("opencode.username and opencode.password must be set together");
        }
        Ok(())
    }
}

/// Discord connection and command surface.
#[derive(Clone, Deserialize)]
#[serde(default)]
pub struct DiscordConfig {
    /// Bot token from the Discord developer portal.
    pub token: Secret<String>,

    /// Command prefix for `start` / `stop` / `status`.
    pub prefix: String,

    /// Channel-name allowlist. Empty means every channel is allowed.
    pub allowed_channels: Vec<String>,
}

impl std::fmt::Debug for DiscordConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DiscordConfig")
            .field("token", &"[REDACTED]")
            .field("prefix", &self.prefix)
            .field("allowed_channels", &self.allowed_channels)
            .finish()
    }
}

impl Default for DiscordConfig {
    fn default() -> Self {
        Self {
            token: Secret::new(String::new()),
            prefix: "!".into(),
            allowed_channels: Vec::new(),
        }
    }
}

/// Where the supervised `opencode serve` process runs.
#[derive(Clone, Deserialize)]
#[serde(default)]
pub struct OpencodeConfig {
    pub hostname: String,
    pub port: u16,
    pub working_directory: PathBuf,

    /// Optional HTTP Basic credentials for the server API.
    pub username: Option<String>,
    pub password: Option<Secret<String>>,
}

impl std::fmt::Debug for OpencodeConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpencodeConfig")
            .field("hostname", &self.hostname)
            .field("port", &self.port)
            .field("working_directory", &self.working_directory)
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

impl Default for OpencodeConfig {
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

/// Administrative HTTP API.
#[derive(Clone, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    pub enabled: bool,
    pub bind: String,
    pub port: u16,

    /// Bearer token protecting `/api/trigger`. Empty disables auth
    /// (the server logs a warning at startup).
    pub secret_key: Secret<String>,
}

impl ApiConfig {
    /// The configured secret, or `None` when auth is disabled.
    pub fn secret(&self) -> Option<Secret<String>> {
        if self.secret_key.expose_secret().is_empty() {
            None
        } else {
            Some(self.secret_key.clone())
        }
    }
}

impl std::fmt::Debug for ApiConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiConfig")
            .field("enabled", &self.enabled)
            .field("bind", &self.bind)
            .field("port", &self.port)
            .field("secret_key", &"[REDACTED]")
            .finish()
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            bind: "127.0.0.1".into(),
            port: 8080,
            secret_key: Secret::new(String::new()),
        }
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let cfg = OpencordConfig::default();
        assert_eq!(cfg.discord.prefix, "!");
        assert!(cfg.discord.allowed_channels.is_empty());
        assert_eq!(cfg.opencode.hostname, "127.0.0.1");
        assert_eq!(cfg.opencode.port, 4096);
        assert!(cfg.api.enabled);
        assert_eq!(cfg.api.port, 8080);
        assert!(cfg.api.secret().is_none());
    }

    #[test]
    fn validate_requires_token() {
        let cfg = OpencordConfig::default();
        let err = cfg.validate().unwrap_err();
        assert!(err.to_string().contains("discord.token"));
    }

    #[test]
    fn validate_accepts_minimal_config() {
        let cfg: OpencordConfig = toml::from_str(
            r#"
            [discord]
            token = "abc"
            "#,
        )
        .unwrap();
        cfg.validate().unwrap();
    }

    #[test]
    fn validate_rejects_half_configured_basic_auth() {
        let cfg: OpencordConfig = toml::from_str(
            r#"
            [discord]
            token = "abc"

            [opencode]
            username = "admin"
            "#,
        )
        .unwrap();
        let err = cfg.validate().unwrap_err();
        assert!(err.to_string().contains("password"));
    }

    #[test]
    fn deserialize_fills_unspecified_sections() {
        let cfg: OpencordConfig = toml::from_str(
            r#"
            [discord]
            token = "abc"
            prefix = "?"
            allowed_channels = ["dev", "ops"]
            "#,
        )
        .unwrap();
        assert_eq!(cfg.discord.prefix, "?");
        assert_eq!(cfg.discord.allowed_channels, vec!["dev", "ops"]);
        // untouched sections get defaults
        assert_eq!(cfg.opencode.port, 4096);
        assert_eq!(cfg.api.bind, "127.0.0.1");
    }

    #[test]
    fn api_secret_present_when_configured() {
        let cfg: OpencordConfig = toml::from_str(
            r#"
            [discord]
            token = "abc"

            [api]
            secret_key = "s3cret"
            "#,
        )
        .unwrap();
        let secret = cfg.api.secret().unwrap();
        assert_eq!(secret.expose_secret(), "s3cret");
    }

    #[test]
    fn debug_output_redacts_secrets() {
        let cfg: OpencordConfig = toml::from_str(
            r#"
            [discord]
            token = "very-secret-token"

            [opencode]
            username = "admin"
            password = "hunter2"
            "#,
        )
        .unwrap();
        let rendered = format!("{cfg:?}");
        assert!(!rendered.contains("very-secret-token"));
        assert!(!rendered.contains("hunter2"));
        assert!(rendered.contains("[REDACTED]"));
    }
}

use std::path::{Path, PathBuf};

use tracing::debug;

use crate::{env_subst::substitute_env, schema::OpencordConfig};

/// Standard config file names, checked in order.
const CONFIG_FILENAMES: &[&str] = &[
    "opencord.toml",
    "opencord.yaml",
    "opencord.yml",
    "opencord.json",
];

/// Load and validate config, from an explicit path or standard locations.
///
/// Any failure here (missing file, parse error, failed validation) is meant
/// to abort startup.
pub fn load(explicit: Option<&Path>) -> anyhow::Result<OpencordConfig> {
    let path = match explicit {
        Some(path) => path.to_path_buf(),
        None => find_config_file().ok_or_else(|| {
            anyhow::anyhow!(
                "no config file found; copy opencord.toml.example to opencord.toml \
                 and fill in your values"
            )
        })?,
    };

    debug!(path = %path.display(), "loading config");
    let config = load_config(&path)?;
    config.validate()?;
    Ok(config)
}

/// Load config from the given path (any supported format).
pub fn load_config(path: &Path) -> anyhow::Result<OpencordConfig> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| anyhow::anyhow!("failed to read {}: {e}", path.display()))?;
    let raw = substitute_env(&raw);
    parse_config(&raw, path)
}

/// Find the first config file in standard locations.
///
/// Search order:
/// 1. `./opencord.{toml,yaml,yml,json}` (project-local)
/// 2. `~/.config/opencord/opencord.{toml,yaml,yml,json}` (user-global)
pub fn find_config_file() -> Option<PathBuf> {
    for name in CONFIG_FILENAMES {
        let p = PathBuf::from(name);
        if p.exists() {
            return Some(p);
        }
    }

    if let Some(dirs) = directories::ProjectDirs::from("", "", "opencord") {
        let config_dir = dirs.config_dir();
        for name in CONFIG_FILENAMES {
            let p = config_dir.join(name);
            if p.exists() {
                return Some(p);
            }
        }
    }

    None
}

fn parse_config(raw: &str, path: &Path) -> anyhow::Result<OpencordConfig> {
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("toml");

    match ext {
        "toml" => Ok(toml::from_str(raw)?),
        "yaml" | "yml" => Ok(serde_yaml::from_str(raw)?),
        "json" => Ok(serde_json::from_str(raw)?),
        _ => anyhow::bail!("unsupported config format: .{ext}"),
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use {super::*, secrecy::ExposeSecret, std::io::Write};

    fn write_config(dir: &tempfile::TempDir, name: &str, contents: &str) -> PathBuf {
        let path = dir.path().join(name);
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        path
    }

    #[test]
    fn loads_toml() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_config(
            &dir,
            "opencord.toml",
            r#"
            [discord]
            token = "tok"
            prefix = "$"
            "#,
        );

        let cfg = load_config(&path).unwrap();
        assert_eq!(cfg.discord.token.expose_secret(), "tok");
        assert_eq!(cfg.discord.prefix, "$");
    }

    #[test]
    fn loads_yaml() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_config(
            &dir,
            "opencord.yaml",
            "discord:\n  token: tok\nopencode:\n  port: 5000\n",
        );

        let cfg = load_config(&path).unwrap();
        assert_eq!(cfg.discord.token.expose_secret(), "tok");
        assert_eq!(cfg.opencode.port, 5000);
    }

    #[test]
    fn loads_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_config(
            &dir,
            "opencord.json",
            r#"{"discord": {"token": "tok"}, "api": {"enabled": false}}"#,
        );

        let cfg = load_config(&path).unwrap();
        assert_eq!(cfg.discord.token.expose_secret(), "tok");
        assert!(!cfg.api.enabled);
    }

    #[test]
    fn load_with_missing_explicit_path_fails() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("opencord.toml");
        let err = load(Some(&missing)).unwrap_err();
        assert!(err.to_string().contains("failed to read"));
    }

    #[test]
    fn load_rejects_invalid_config() {
        let dir = tempfile::tempdir().unwrap();
        // Parses fine but has no token.
        let path = write_config(&dir, "opencord.toml", "[discord]\nprefix = \"!\"\n");
        let err = load(Some(&path)).unwrap_err();
        assert!(err.to_string().contains("discord.token"));
    }

    #[test]
    fn unsupported_extension_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_config(&dir, "opencord.ini", "[discord]\n");
        let err = load_config(&path).unwrap_err();
        assert!(err.to_string().contains("unsupported config format"));
    }
}

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct PlayboxConfig {
    #[serde(default)]
    pub store: StoreSection,
    #[serde(default)]
    pub logging: LoggingSection,
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct StoreSection {
    pub path: Option<String>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct LoggingSection {
    /// `tracing` filter directive, e.g. "warn" or "playbox_core=debug"
    pub level: Option<String>,
}

impl PlayboxConfig {
    pub fn new(store_path: &Path, log_level: Option<String>) -> Self {
        Self {
            store: StoreSection {
                path: Some(store_path.to_string_lossy().to_string()),
            },
            logging: LoggingSection { level: log_level },
        }
    }
}

const APP_DIR: &str = "playbox";

pub fn default_config_path() -> anyhow::Result<PathBuf> {
    Ok(app_dir("XDG_CONFIG_HOME", &[".config"])?.join("config.toml"))
}

pub fn default_store_path() -> anyhow::Result<PathBuf> {
    Ok(app_dir("XDG_DATA_HOME", &[".local", "share"])?.join("playbox.db"))
}

pub fn read_config(path: &Path) -> anyhow::Result<PlayboxConfig> {
    let contents = std::fs::read_to_string(path)
        .map_err(|e| anyhow::anyhow!("Failed to read config {}: {}", path.display(), e))?;
    toml::from_str(&contents)
        .map_err(|e| anyhow::anyhow!("Failed to parse config {}: {}", path.display(), e))
}

pub fn write_config(path: &Path, config: &PlayboxConfig) -> anyhow::Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| {
            anyhow::anyhow!(
                "Failed to create config directory {}: {}",
                parent.display(),
                e
            )
        })?;
    }
    let contents =
        toml::to_string_pretty(config).map_err(|e| anyhow::anyhow!("TOML error: {}", e))?;
    std::fs::write(path, contents)
        .map_err(|e| anyhow::anyhow!("Failed to write config {}: {}", path.display(), e))?;
    Ok(())
}

/// `$<var>/playbox`, or `$HOME/<fallback>/playbox` when `var` is unset or blank.
fn app_dir(var: &str, fallback: &[&str]) -> anyhow::Result<PathBuf> {
    let base = match std::env::var(var) {
        Ok(value) if !value.trim().is_empty() => PathBuf::from(value),
        _ => fallback
            .iter()
            .fold(home_dir()?, |dir, part| dir.join(part)),
    };
    Ok(base.join(APP_DIR))
}

fn home_dir() -> anyhow::Result<PathBuf> {
    let home = std::env::var("HOME")
        .map_err(|_| anyhow::anyhow!("HOME is not set; cannot resolve default paths"))?;
    Ok(PathBuf::from(home))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_config_parses() {
        let config: PlayboxConfig = toml::from_str("").unwrap();
        assert!(config.store.path.is_none());
        assert!(config.logging.level.is_none());
    }

    #[test]
    fn test_config_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");
        let config = PlayboxConfig::new(Path::new("/tmp/playbox.db"), Some("info".to_string()));

        write_config(&path, &config).unwrap();
        let loaded = read_config(&path).unwrap();

        assert_eq!(loaded.store.path.as_deref(), Some("/tmp/playbox.db"));
        assert_eq!(loaded.logging.level.as_deref(), Some("info"));
    }

    #[test]
    fn test_app_dir_falls_back_to_home() {
        let Ok(home) = std::env::var("HOME") else {
            return;
        };
        let dir = app_dir("PLAYBOX_TEST_UNSET_DIR", &[".local", "share"]).unwrap();
        assert_eq!(
            dir,
            PathBuf::from(home).join(".local").join("share").join("playbox")
        );
    }

    #[test]
    fn test_invalid_toml_reports_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[store\npath = 1").unwrap();

        let err = read_config(&path).unwrap_err().to_string();
        assert!(err.contains("Failed to parse config"), "got: {}", err);
    }
}

use std::path::{Path, PathBuf};
use std::sync::Arc;

use playbox_core::storage::{KeyValueStore, Namespace, SqliteBackend};

use crate::cli::Cli;
use crate::config::{default_config_path, default_store_path, read_config, PlayboxConfig};

pub fn resolve_config_path() -> anyhow::Result<PathBuf> {
    if let Ok(value) = std::env::var("PLAYBOX_CONFIG") {
        if !value.trim().is_empty() {
            return Ok(PathBuf::from(value));
        }
    }
    default_config_path()
}

/// Read the config file if one exists.
pub fn load_config() -> anyhow::Result<Option<PlayboxConfig>> {
    let path = resolve_config_path()?;
    if !path.exists() {
        return Ok(None);
    }
    read_config(&path).map(Some)
}

/// Store path from the flag/env, then the config file, then the XDG default.
pub fn resolve_store_path(cli: &Cli, config: Option<&PlayboxConfig>) -> anyhow::Result<PathBuf> {
    if let Some(path) = cli.store.as_deref().filter(|p| !p.trim().is_empty()) {
        return Ok(PathBuf::from(path));
    }
    if let Some(path) = config.and_then(|c| c.store.path.as_deref()) {
        return Ok(PathBuf::from(path));
    }
    default_store_path()
}

/// Everything a command needs to reach the store.
pub struct AppContext {
    pub store_path: PathBuf,
    pub quiet: bool,
}

impl AppContext {
    pub fn new(cli: &Cli, config: Option<&PlayboxConfig>) -> anyhow::Result<Self> {
        Ok(Self {
            store_path: resolve_store_path(cli, config)?,
            quiet: cli.quiet,
        })
    }

    pub fn open_backend(&self) -> anyhow::Result<Arc<SqliteBackend>> {
        let backend = SqliteBackend::open(&self.store_path)
            .map_err(|e| anyhow::anyhow!(store_error_message(&self.store_path, &e)))?;
        tracing::debug!(path = %self.store_path.display(), "opened store");
        Ok(Arc::new(backend))
    }

    /// Open the store for `namespace`, rejecting malformed names.
    pub fn store(&self, namespace: &str) -> anyhow::Result<KeyValueStore<SqliteBackend>> {
        let namespace = Namespace::new(namespace).map_err(|e| anyhow::anyhow!("{}", e))?;
        Ok(KeyValueStore::new(self.open_backend()?, namespace))
    }
}

fn store_error_message(path: &Path, err: &playbox_core::StoreError) -> String {
    format!(
        "Cannot open store at {}: {}\nHint: pass --store PATH or run `playbox init`.",
        path.display(),
        err
    )
}

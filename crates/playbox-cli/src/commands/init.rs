use playbox_core::storage::SqliteBackend;

use crate::app::resolve_config_path;
use crate::cli::{Cli, InitArgs};
use crate::config::{default_store_path, write_config, PlayboxConfig};

pub fn handle_init(cli: &Cli, args: &InitArgs) -> anyhow::Result<()> {
    let config_path = resolve_config_path()?;
    if config_path.exists() && !args.force {
        return Err(anyhow::anyhow!(
            "Config already exists at {}\nHint: pass --force to overwrite it.",
            config_path.display()
        ));
    }

    let store_path = match cli.store.as_deref().filter(|p| !p.trim().is_empty()) {
        Some(path) => std::path::PathBuf::from(path),
        None => default_store_path()?,
    };
    SqliteBackend::open(&store_path)
        .map_err(|e| anyhow::anyhow!("Cannot create store at {}: {}", store_path.display(), e))?;

    let config = PlayboxConfig::new(&store_path, None);
    write_config(&config_path, &config)?;

    if !cli.quiet {
        println!("Config: {}", config_path.display());
        println!("Store:  {}", store_path.display());
    }
    Ok(())
}

//! Playbox CLI - inspect and edit the saved data of the Playbox mini-games
//!
//! Reads and writes the same namespaced store the games use, so parents and
//! developers can look at a save, fix a corrupt entry or reset one game.

mod app;
mod cli;
mod commands;
mod config;
mod logging;
mod output;

use clap::Parser;

use crate::app::{load_config, AppContext};
use crate::cli::{Cli, Commands};

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = match load_config() {
        Ok(config) => config,
        Err(err) => {
            logging::init_logging(cli.verbose, None);
            return Err(err);
        }
    };
    logging::init_logging(
        cli.verbose,
        config.as_ref().and_then(|c| c.logging.level.as_deref()),
    );

    let ctx = || AppContext::new(&cli, config.as_ref());
    match &cli.command {
        Commands::Init(args) => commands::handle_init(&cli, args),
        Commands::Get(args) => commands::handle_get(&ctx()?, args),
        Commands::Set(args) => commands::handle_set(&ctx()?, args),
        Commands::Remove(args) => commands::handle_remove(&ctx()?, args),
        Commands::Clear(args) => commands::handle_clear(&ctx()?, args),
        Commands::Keys(args) => commands::handle_keys(&ctx()?, args),
        Commands::Dump(args) => commands::handle_dump(&ctx()?, args),
        Commands::Settings(command) => commands::handle_settings(&ctx()?, command),
        Commands::Games => commands::handle_games(&ctx()?),
        Commands::Reset(args) => commands::handle_reset(&ctx()?, args),
        Commands::Completions(args) => commands::handle_completions(args.shell),
    }
}

use clap::{Args, Parser, Subcommand, ValueEnum};
use clap_complete::Shell;

use playbox_core::VERSION;

/// Playbox - inspect and edit the saved data of the Playbox mini-games
#[derive(Parser)]
#[command(name = "playbox")]
#[command(author, version = VERSION, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to the store database
    #[arg(short, long, global = true, env = "PLAYBOX_STORE")]
    pub store: Option<String>,

    #[command(subcommand)]
    pub command: Commands,

    /// Quiet mode (minimal output)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Log debug details to stderr
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

/// Arguments for the `init` command
#[derive(Args)]
pub struct InitArgs {
    /// Overwrite an existing config file
    #[arg(long)]
    pub force: bool,
}

/// Arguments for the `get` command
#[derive(Args)]
pub struct GetArgs {
    /// Namespace (e.g., "tic-tac-toe", "settings")
    #[arg(value_name = "NAMESPACE")]
    pub namespace: String,

    /// Key inside the namespace
    #[arg(value_name = "KEY")]
    pub key: String,

    /// JSON printed when the key is absent
    #[arg(long, value_name = "JSON")]
    pub default: Option<String>,
}

/// Arguments for the `set` command
#[derive(Args)]
pub struct SetArgs {
    #[arg(value_name = "NAMESPACE")]
    pub namespace: String,

    #[arg(value_name = "KEY")]
    pub key: String,

    /// Value as JSON (quote strings: '"text"')
    #[arg(value_name = "JSON")]
    pub value: String,
}

/// Arguments for the `remove` command
#[derive(Args)]
pub struct RemoveArgs {
    #[arg(value_name = "NAMESPACE")]
    pub namespace: String,

    #[arg(value_name = "KEY")]
    pub key: String,
}

/// Arguments for the `clear` command
#[derive(Args)]
pub struct ClearArgs {
    #[arg(value_name = "NAMESPACE")]
    pub namespace: String,
}

/// Arguments for the `keys` command
#[derive(Args)]
pub struct KeysArgs {
    #[arg(value_name = "NAMESPACE")]
    pub namespace: String,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the `dump` command
#[derive(Args)]
pub struct DumpArgs {
    /// Limit to one namespace
    #[arg(value_name = "NAMESPACE")]
    pub namespace: Option<String>,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the `reset` command
#[derive(Args)]
pub struct ResetArgs {
    /// Game slug (see `playbox games`)
    #[arg(value_name = "GAME")]
    pub game: String,
}

#[derive(Clone, Copy, ValueEnum)]
pub enum Toggle {
    On,
    Off,
}

impl Toggle {
    pub fn enabled(self) -> bool {
        matches!(self, Toggle::On)
    }
}

#[derive(Subcommand)]
pub enum SettingsCommand {
    /// Show current settings
    Show {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Change settings
    Set {
        /// Language code (en, es, fr, de, pt, ja)
        #[arg(long)]
        language: Option<String>,

        /// Sound on or off
        #[arg(long, value_enum)]
        sound: Option<Toggle>,

        /// Volume 0-100
        #[arg(long, value_parser = clap::value_parser!(u8).range(0..=100))]
        volume: Option<u8>,
    },
}

/// Arguments for the `completions` command
#[derive(Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    #[arg(value_name = "SHELL")]
    pub shell: Shell,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Write a config file and create the store
    Init(InitArgs),

    /// Print a stored value
    Get(GetArgs),

    /// Store a value
    ///
    /// Writing into a game's namespace also records that game's save version.
    Set(SetArgs),

    /// Delete a key
    Remove(RemoveArgs),

    /// Delete every key in a namespace
    Clear(ClearArgs),

    /// List keys in a namespace
    Keys(KeysArgs),

    /// Show stored entries
    Dump(DumpArgs),

    /// Show or change language and sound settings
    #[command(subcommand)]
    Settings(SettingsCommand),

    /// List games and their saved data
    Games,

    /// Forget one game's saved data
    Reset(ResetArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

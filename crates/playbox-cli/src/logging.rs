//! Log output for the CLI.
//!
//! Filter precedence: `--verbose`, then `RUST_LOG`, then the config file's
//! `[logging] level`, then `warn`.

use tracing_subscriber::EnvFilter;

const DEFAULT_FILTER: &str = "warn";

pub fn init_logging(verbose: bool, configured: Option<&str>) {
    let directive = select_directive(verbose, std::env::var("RUST_LOG").ok().as_deref(), configured);
    // A second init (e.g. in tests) keeps the first subscriber.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(directive))
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

/// First usable filter directive; unparsable directives are skipped.
fn select_directive(verbose: bool, env: Option<&str>, configured: Option<&str>) -> String {
    if verbose {
        return "debug".to_string();
    }
    [env, configured]
        .into_iter()
        .flatten()
        .map(str::trim)
        .find(|directive| !directive.is_empty() && EnvFilter::try_new(directive).is_ok())
        .unwrap_or(DEFAULT_FILTER)
        .to_string()
}

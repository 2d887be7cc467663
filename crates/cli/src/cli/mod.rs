pub mod config;
pub mod run;

use clap::{Parser, Subcommand, ValueEnum};

use eco_domain::config::Config;
use eco_engine_client::SnapshotKind;

/// ecosim — drive an agent-based simulation engine from the command line.
#[derive(Debug, Parser)]
#[command(name = "ecosim", version, about)]
pub struct Cli {
    /// Path to the TOML config file.
    #[arg(long, global = true, env = "ECOSIM_CONFIG", default_value = "ecosim.toml")]
    pub config: String,

    /// Emit JSON logs and a JSON report instead of plain text.
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Start the engine, step it, collect snapshots and print metric series.
    Run {
        /// Number of ticks to advance.
        #[arg(long, default_value_t = 10)]
        steps: u32,
        /// Request a snapshot every K steps (0 disables snapshots).
        #[arg(long, default_value_t = 1)]
        snapshot_every: u32,
        /// Snapshot detail requested from the engine.
        #[arg(long, value_enum, default_value_t = KindArg::Metrics)]
        kind: KindArg,
        /// Dot path to print as a series (repeatable), e.g. `metrics.population`.
        #[arg(long = "series")]
        series: Vec<String>,
    },
    /// Configuration utilities.
    #[command(subcommand)]
    Config(ConfigCommand),
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Parse the config file and report any errors.
    Validate,
    /// Dump the resolved configuration (with defaults) as TOML.
    Show,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum KindArg {
    Metrics,
    Full,
}

impl From<KindArg> for SnapshotKind {
    fn from(kind: KindArg) -> Self {
        match kind {
            KindArg::Metrics => SnapshotKind::Metrics,
            KindArg::Full => SnapshotKind::Full,
        }
    }
}

// ── Config loading helper ─────────────────────────────────────────────

/// Load the configuration at `path`, or defaults when the file does not
/// exist. A file that exists but fails to parse is an error.
pub fn load_config(path: &str) -> anyhow::Result<Config> {
    if std::path::Path::new(path).exists() {
        Config::load(path).map_err(|e| anyhow::anyhow!("loading {path}: {e}"))
    } else {
        tracing::debug!(path = %path, "config file not found, using defaults");
        Ok(Config::default())
    }
}

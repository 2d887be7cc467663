use anyhow::Context;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use eco_cli::cli::run::{render_text, RunOptions};
use eco_cli::cli::{Cli, Command, ConfigCommand};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.json);

    match cli.command {
        Command::Run {
            steps,
            snapshot_every,
            kind,
            series,
        } => {
            let config = eco_cli::cli::load_config(&cli.config)?;
            let opts = RunOptions {
                steps,
                snapshot_every,
                kind: kind.into(),
                series,
            };
            let report = eco_cli::cli::run::run(&config, &opts).await?;
            if cli.json {
                let out = serde_json::to_string_pretty(&report).context("serializing report")?;
                println!("{out}");
            } else {
                print!("{}", render_text(&report));
            }
            Ok(())
        }
        Command::Config(ConfigCommand::Validate) => {
            let config = eco_cli::cli::load_config(&cli.config)?;
            if !eco_cli::cli::config::validate(&config, &cli.config) {
                std::process::exit(1);
            }
            Ok(())
        }
        Command::Config(ConfigCommand::Show) => {
            let config = eco_cli::cli::load_config(&cli.config)?;
            eco_cli::cli::config::show(&config)
        }
    }
}

/// Diagnostics go to stderr so stdout carries only the report.
fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("ecosim=info,eco_cli=info,eco_engine_client=info"));

    if json {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .compact()
            .init();
    }
}

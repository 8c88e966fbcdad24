//! `vidsyncctl`: run loopback sessions and inspect player configuration.

mod simulate;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use vidsync_config::{ConfigLoad, ConfigLoader, load_path};
use vidsync_core::timecode::start_offset;
use vidsync_model::parse_media_url;

#[derive(Parser, Debug)]
#[command(name = "vidsyncctl", version)]
#[command(about = "Simulate and inspect synchronized playback sessions")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run host and guests in one process and report how well they agree
    Simulate(simulate::SimulateArgs),
    /// Resolve a player config, run its guard rails and print the result
    CheckConfig {
        /// Config file (TOML or JSON); resolved from the environment when omitted
        path: Option<PathBuf>,
    },
    /// Print the start offset in seconds embedded in a media URL
    Offset {
        url: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Command::Simulate(args) => {
            let load = load_config(args.config.as_deref())?;
            init_tracing(load.config.debug_logging);
            simulate::run(args, load.config).await
        }
        Command::CheckConfig { path } => {
            init_tracing(false);
            check_config(path.as_deref())
        }
        Command::Offset { url } => {
            let url = parse_media_url(&url)?;
            println!("{}", start_offset(&url));
            Ok(())
        }
    }
}

fn init_tracing(debug_logging: bool) {
    let fallback = if debug_logging {
        "info,vidsync_core=debug"
    } else {
        "info"
    };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| fallback.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn load_config(path: Option<&Path>) -> Result<ConfigLoad> {
    match path {
        Some(path) => load_path(path)
            .with_context(|| format!("failed to load config from {}", path.display())),
        None => ConfigLoader::new()
            .load()
            .context("failed to resolve player config"),
    }
}

fn check_config(path: Option<&Path>) -> Result<()> {
    let load = load_config(path)?;
    println!("# source: {:?}", load.source);
    print!(
        "{}",
        toml::to_string_pretty(&load.config).context("failed to render config")?
    );
    for warning in load.warnings.iter() {
        println!("# warning: {warning}");
    }
    Ok(())
}

//! subkit server binary.
//!
//! Reads `config.toml` (or the path specified with `--config`), opens the
//! SQLite subscriber store, and serves the JSON API over HTTP.

use std::path::PathBuf;

use anyhow::Context as _;
use clap::Parser;
use subkit_server::ServerConfig;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about = "subkit subscriber registry server")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "config.toml")]
  config: PathBuf,

  /// Print the effective configuration and exit.
  #[arg(long)]
  check_config: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  // Initialise tracing.
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .init();

  let cli = Cli::parse();

  let server_cfg = ServerConfig::load(&cli.config)
    .with_context(|| format!("failed to load configuration from {:?}", cli.config))?;

  if cli.check_config {
    server_cfg
      .connection
      .validate()
      .context("invalid [connection] settings")?;
    println!("{server_cfg:#?}");
    return Ok(());
  }

  subkit_server::serve(server_cfg).await
}

//! `examctl`: manage the exam-score table and compute chart data.
//!
//! Reads `examctl.toml` (or the path given with `--config`) plus `EXAMS_*`
//! environment overrides, loads the dataset through the on-disk cache,
//! rehydrates the operation history, runs one command and prints its result
//! as JSON on stdout. Logs go to stderr.
//!
//! ```
//! examctl show 2000001
//! examctl update 2000001 2019 Toan=8.5 "Van=Không có"
//! examctl chart heatmap --year 2019
//! ```

mod bootstrap;
mod commands;
mod config;

use std::path::PathBuf;

use clap::Parser;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

use crate::{bootstrap::App, commands::Command, config::AppConfig};

#[derive(Parser, Debug)]
#[command(name = "examctl", version, about = "Exam score store and analytics")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "examctl.toml")]
  config: PathBuf,

  /// Print compact instead of indented JSON.
  #[arg(long)]
  compact: bool,

  #[command(subcommand)]
  command: Command,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .with_writer(std::io::stderr)
    .init();

  let cli = Cli::parse();

  let output = match commands::run_offline(&cli.command) {
    Some(value) => value,
    None => {
      let config = AppConfig::load(cli.config)?;
      let app = App::open(config).await?;
      commands::run(&app, cli.command).await?
    }
  };

  let text = if cli.compact {
    serde_json::to_string(&output)?
  } else {
    serde_json::to_string_pretty(&output)?
  };
  println!("{text}");
  Ok(())
}

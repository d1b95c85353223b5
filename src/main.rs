mod app;
mod commands;
mod config;
mod event;
mod logging;
mod sync;
mod ui;
mod upstream;

use clap::Parser;
use color_eyre::Result;
use std::path::PathBuf;
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "servedash")]
#[command(about = "A terminal dashboard for process-serving jobs, invoices and clients")]
#[command(version)]
struct Args {
  /// Path to config file (default: $XDG_CONFIG_HOME/servedash/config.yaml)
  #[arg(short, long)]
  config: Option<PathBuf>,

  /// Browse the bundled sample data without contacting any API
  #[arg(long)]
  sample_only: bool,

  /// Records per page (overrides sync.page_size)
  #[arg(long, value_parser = clap::value_parser!(u64).range(1..=500))]
  page_size: Option<u64>,
}

#[tokio::main]
async fn main() -> Result<()> {
  color_eyre::install()?;

  let args = Args::parse();

  // Keep the guard alive so buffered log lines are flushed on exit
  let _log_guard = logging::init()?;

  let mut config = if args.sample_only {
    // Sample data needs no configuration, but a broken file is still reported
    config::Config::load_optional(args.config.as_deref())?.unwrap_or_default()
  } else {
    config::Config::load(args.config.as_deref())?
  };

  if let Some(page_size) = args.page_size {
    config.sync.page_size = page_size;
  }

  info!(
    version = env!("CARGO_PKG_VERSION"),
    sample_only = args.sample_only,
    log_dir = %logging::log_dir().display(),
    "starting"
  );

  let mut app = app::App::new(config, args.sample_only);
  app.run().await?;

  Ok(())
}

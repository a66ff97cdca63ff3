mod cli;
mod engine;
mod history;
mod model;
mod orchestrator;
mod storage;
mod surface;
mod text_summary;
#[cfg(feature = "tui")]
mod tui;
mod validate;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

/// Logs go to stderr in one-shot modes and to `--log-file` (if any) under the TUI.
fn init_logging(args: &cli::Cli) -> Result<()> {
    let filter = || EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    if let Some(path) = args.log_file.as_deref() {
        let file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .with_context(|| format!("open log file {}", path.display()))?;
        tracing_subscriber::fmt()
            .with_env_filter(filter())
            .with_ansi(false)
            .with_writer(std::sync::Mutex::new(file))
            .init();
    } else if args.is_non_tui() || cfg!(not(feature = "tui")) {
        tracing_subscriber::fmt()
            .with_env_filter(filter())
            .with_writer(std::io::stderr)
            .init();
    }
    Ok(())
}

// Single-threaded: the evaluator call is the only suspension point.
#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let args = cli::Cli::parse();
    init_logging(&args)?;
    cli::run(args).await
}

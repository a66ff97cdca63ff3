use crate::engine::{Evaluator, HttpEvaluator, MockEvaluator};
use crate::history::HistoryStore;
use crate::model::{FormConfig, FormSnapshot};
use crate::orchestrator::{SubmissionController, SubmitOutcome};
use crate::storage::{FileStore, KeyValueStore, MemoryStore};
use crate::surface::TextSurface;
use anyhow::{Context, Result};
use clap::Parser;
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

/// Output line routing for stdout/stderr writer.
enum OutputLine {
    Stdout(String),
    Stderr(String),
}

/// Spawn a blocking writer for stdout/stderr to avoid blocking async tasks.
fn spawn_output_writer() -> (
    mpsc::UnboundedSender<OutputLine>,
    tokio::task::JoinHandle<()>,
) {
    let (tx, mut rx) = mpsc::unbounded_channel::<OutputLine>();
    let handle = tokio::task::spawn_blocking(move || {
        let stdout = std::io::stdout();
        let stderr = std::io::stderr();
        let mut out = std::io::LineWriter::new(stdout.lock());
        let mut err = std::io::LineWriter::new(stderr.lock());

        while let Some(line) = rx.blocking_recv() {
            match line {
                OutputLine::Stdout(msg) => {
                    let _ = writeln!(out, "{}", msg);
                }
                OutputLine::Stderr(msg) => {
                    let _ = writeln!(err, "{}", msg);
                }
            }
        }

        let _ = out.flush();
        let _ = err.flush();
    });
    (tx, handle)
}

#[derive(Debug, Parser, Clone)]
#[command(
    name = "area-check",
    version,
    about = "Submit validated points to a hit-test evaluator and keep a result history"
)]
pub struct Cli {
    /// Evaluator endpoint receiving JSON {x, y, r}
    #[arg(
        long,
        default_value = "http://localhost:8080/fcgi-bin/fastcgi-server-1.0-SNAPSHOT.jar"
    )]
    pub endpoint: String,

    /// Give up on the evaluator after this long
    #[arg(long, default_value = "10s")]
    pub timeout: humantime::Duration,

    /// X coordinate; together with --y and --r submits once without the TUI
    #[arg(long, allow_hyphen_values = true)]
    pub x: Option<String>,

    /// Y coordinate
    #[arg(long, allow_hyphen_values = true)]
    pub y: Option<String>,

    /// Radius, one of 1..5
    #[arg(long)]
    pub r: Option<String>,

    /// Print the recorded entry as JSON (one-shot mode)
    #[arg(long)]
    pub json: bool,

    /// Print the stored history and exit
    #[arg(long, conflicts_with_all = ["x", "y", "r"])]
    pub history: bool,

    /// Delete the stored history and exit
    #[arg(long, conflicts_with_all = ["x", "y", "r"])]
    pub clear_history: bool,

    /// Export history as JSON
    #[arg(long, conflicts_with_all = ["x", "y", "r"])]
    pub export_json: Option<PathBuf>,

    /// Export history as CSV
    #[arg(long, conflicts_with_all = ["x", "y", "r"])]
    pub export_csv: Option<PathBuf>,

    /// Directory holding the history file
    #[arg(long)]
    pub data_dir: Option<PathBuf>,

    /// Keep history in memory only
    #[arg(long)]
    pub ephemeral: bool,

    /// Answer locally instead of contacting the evaluator
    #[arg(long)]
    pub mock: bool,

    /// Hit value reported by --mock
    #[arg(long, requires = "mock")]
    pub mock_hit: bool,

    /// Write logs to this file (the TUI owns the terminal)
    #[arg(long)]
    pub log_file: Option<PathBuf>,
}

impl Cli {
    /// One-shot, history and export modes never start the TUI.
    pub fn is_non_tui(&self) -> bool {
        self.x.is_some()
            || self.y.is_some()
            || self.r.is_some()
            || self.history
            || self.clear_history
            || self.export_json.is_some()
            || self.export_csv.is_some()
    }
}

pub async fn run(args: Cli) -> Result<()> {
    let cfg = build_config(&args)?;

    if args.history || args.clear_history || args.export_json.is_some() || args.export_csv.is_some()
    {
        return run_history_commands(&args, &cfg);
    }

    if !args.is_non_tui() {
        #[cfg(feature = "tui")]
        {
            let controller = build_controller(cfg)?;
            return crate::tui::run(controller).await;
        }
        #[cfg(not(feature = "tui"))]
        {
            anyhow::bail!("built without TUI support; pass --x, --y and --r to submit once");
        }
    }

    run_once(&args, cfg).await
}

/// Build a `FormConfig` from CLI arguments.
pub fn build_config(args: &Cli) -> Result<FormConfig> {
    let (x, y, r) = FormConfig::default_specs()?;
    Ok(FormConfig {
        endpoint: args.endpoint.clone(),
        timeout: Duration::from(args.timeout),
        x,
        y,
        r,
        data_dir: args.data_dir.clone(),
        ephemeral: args.ephemeral,
        mock: args.mock,
        mock_hit: args.mock_hit,
        user_agent: format!("area-check/{}", env!("CARGO_PKG_VERSION")),
    })
}

/// Open the history log from the configured storage.
pub fn open_history(cfg: &FormConfig) -> Result<HistoryStore> {
    let store: Box<dyn KeyValueStore> = if cfg.ephemeral {
        Box::new(MemoryStore::default())
    } else {
        let dir = match &cfg.data_dir {
            Some(dir) => dir.clone(),
            None => crate::storage::default_data_dir()?,
        };
        let store = FileStore::new(dir);
        tracing::debug!(dir = %store.dir().display(), "using history directory");
        Box::new(store)
    };
    Ok(HistoryStore::open(store))
}

/// Wire the evaluator chosen by configuration into a controller.
pub fn build_controller(cfg: FormConfig) -> Result<SubmissionController> {
    let evaluator: Arc<dyn Evaluator> = if cfg.mock {
        Arc::new(MockEvaluator::fixed(cfg.mock_hit))
    } else {
        Arc::new(HttpEvaluator::new(&cfg.endpoint, &cfg.user_agent)?)
    };
    let history = open_history(&cfg)?;
    Ok(SubmissionController::new(cfg, evaluator, history))
}

fn run_history_commands(args: &Cli, cfg: &FormConfig) -> Result<()> {
    let mut history = open_history(cfg)?;

    if let Some(p) = args.export_json.as_deref() {
        crate::history::export_json(p, history.records())?;
        eprintln!("Exported JSON: {}", p.display());
    }
    if let Some(p) = args.export_csv.as_deref() {
        crate::history::export_csv(p, history.records())?;
        eprintln!("Exported CSV: {}", p.display());
    }
    if args.history {
        for line in crate::text_summary::build_history_table(history.records()).lines {
            println!("{line}");
        }
    }
    if args.clear_history {
        let removed = history.len();
        history.clear()?;
        eprintln!("История очищена ({removed})");
    }
    Ok(())
}

async fn run_once(args: &Cli, cfg: FormConfig) -> Result<()> {
    let mut controller = build_controller(cfg)?;
    let (out_tx, out_handle) = spawn_output_writer();
    let mut surface = TextSurface::default();

    let snapshot = FormSnapshot {
        x: args.x.clone().unwrap_or_default(),
        y: args.y.clone().unwrap_or_default(),
        r: args.r.clone(),
    };
    let outcome = controller.handle_submit(&snapshot, &mut surface).await;

    for err in &surface.errors {
        let _ = out_tx.send(OutputLine::Stderr(err.clone()));
    }
    let result = match outcome {
        SubmitOutcome::Recorded(record) => {
            if args.json {
                let out = serde_json::to_string_pretty(&record)?;
                let _ = out_tx.send(OutputLine::Stdout(out));
            } else {
                let table = crate::text_summary::build_history_table(std::slice::from_ref(&record));
                for line in table.lines {
                    let _ = out_tx.send(OutputLine::Stdout(line));
                }
            }
            Ok(())
        }
        SubmitOutcome::Rejected => Err(anyhow::anyhow!("submission rejected by validation")),
        SubmitOutcome::Failed(msg) => Err(anyhow::anyhow!(msg)).context("submission failed"),
    };

    drop(out_tx);
    let _ = out_handle.await;
    result
}

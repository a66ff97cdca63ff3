use crate::model::HistoryRecord;
use anyhow::{Context, Result};
use std::path::PathBuf;

/// Timestamped file name in the current directory.
fn default_export_path(ext: &str) -> Result<PathBuf> {
    let stamp = time::OffsetDateTime::now_utc()
        .format(&time::format_description::well_known::Rfc3339)
        .unwrap_or_else(|_| "now".into());
    let default_name = format!(
        "area-check-history-{}.{ext}",
        stamp.replace(':', "-").replace('T', "_")
    );
    let current_dir = std::env::current_dir().context("get current directory")?;
    Ok(current_dir.join(default_name))
}

/// Export the history as JSON. Returns the absolute path written.
pub fn export_history_json(records: &[HistoryRecord]) -> Result<PathBuf> {
    let path = default_export_path("json")?;
    crate::history::export_json(&path, records)?;
    Ok(path)
}

/// Export the history as CSV. Returns the absolute path written.
pub fn export_history_csv(records: &[HistoryRecord]) -> Result<PathBuf> {
    let path = default_export_path("csv")?;
    crate::history::export_csv(&path, records)?;
    Ok(path)
}

//! Text rendering of the history log for CLI output.

use crate::model::HistoryRecord;

/// Pre-formatted lines for text output.
pub(crate) struct TextSummary {
    pub lines: Vec<String>,
}

const HEADERS: [&str; 6] = ["X", "Y", "R", "Попадание", "Время", "Выполнение"];

fn columns(r: &HistoryRecord) -> [&str; 6] {
    [&r.x, &r.y, &r.r, &r.hit, &r.timestamp, &r.exec_time]
}

fn pad(s: &str, width: usize) -> String {
    let len = s.chars().count();
    format!("{s}{}", " ".repeat(width.saturating_sub(len)))
}

/// Build an aligned table of history records, oldest first.
pub(crate) fn build_history_table(records: &[HistoryRecord]) -> TextSummary {
    if records.is_empty() {
        return TextSummary {
            lines: vec!["История пуста".to_string()],
        };
    }

    let mut widths = HEADERS.map(|h| h.chars().count());
    for r in records {
        for (w, col) in widths.iter_mut().zip(columns(r)) {
            *w = (*w).max(col.chars().count());
        }
    }

    let render = |cells: [&str; 6]| -> String {
        cells
            .iter()
            .zip(widths)
            .map(|(c, w)| pad(c, w))
            .collect::<Vec<_>>()
            .join("  ")
            .trim_end()
            .to_string()
    };

    let mut lines = Vec::with_capacity(records.len() + 2);
    lines.push(render(HEADERS));
    lines.push(
        widths
            .iter()
            .map(|w| "-".repeat(*w))
            .collect::<Vec<_>>()
            .join("  "),
    );
    for r in records {
        lines.push(render(columns(r)));
    }
    TextSummary { lines }
}

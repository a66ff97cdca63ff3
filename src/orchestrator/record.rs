//! Turning an evaluator response into a displayable history record.

use crate::engine::EvalResponse;
use crate::model::HistoryRecord;
use crate::validate::format_fixed2;
use time::format_description::well_known::Rfc3339;
use time::macros::format_description;
use time::{OffsetDateTime, PrimitiveDateTime, UtcOffset};

pub const HIT_LABEL: &str = "Да";
pub const MISS_LABEL: &str = "Нет";
/// Canonical timing unit: nanoseconds.
pub const TIMING_UNIT: &str = "нс";

pub(crate) fn build_record(resp: &EvalResponse) -> HistoryRecord {
    HistoryRecord {
        x: format_fixed2(resp.x),
        y: format_fixed2(resp.y),
        r: resp.r.clone(),
        hit: hit_label(resp.hit).to_string(),
        timestamp: display_timestamp(resp.time.as_deref()),
        exec_time: exec_time_label(resp.timing_ns),
    }
}

pub fn hit_label(hit: bool) -> &'static str {
    if hit {
        HIT_LABEL
    } else {
        MISS_LABEL
    }
}

pub fn exec_time_label(ns: f64) -> String {
    format!("{ns} {TIMING_UNIT}")
}

fn local_offset() -> UtcOffset {
    UtcOffset::current_local_offset().unwrap_or(UtcOffset::UTC)
}

fn format_display(dt: PrimitiveDateTime) -> String {
    let fmt = format_description!("[day].[month].[year], [hour]:[minute]:[second]");
    dt.format(&fmt).unwrap_or_else(|_| dt.to_string())
}

/// Parse an evaluator timestamp: RFC 3339, or ISO local date-time with an
/// optional fractional part (taken as local time).
pub(crate) fn parse_server_time(s: &str) -> Option<PrimitiveDateTime> {
    let s = s.trim();
    if let Ok(dt) = OffsetDateTime::parse(s, &Rfc3339) {
        let local = dt.to_offset(local_offset());
        return Some(PrimitiveDateTime::new(local.date(), local.time()));
    }
    let whole = s.split('.').next().unwrap_or(s);
    let fmt = format_description!("[year]-[month]-[day]T[hour]:[minute]:[second]");
    PrimitiveDateTime::parse(whole, &fmt).ok()
}

/// Server time when present and readable, otherwise the local clock.
pub(crate) fn display_timestamp(server_time: Option<&str>) -> String {
    if let Some(raw) = server_time {
        match parse_server_time(raw) {
            Some(dt) => return format_display(dt),
            None => tracing::warn!(raw, "unreadable evaluator time, using local clock"),
        }
    }
    let now = OffsetDateTime::now_local().unwrap_or_else(|_| OffsetDateTime::now_utc());
    format_display(PrimitiveDateTime::new(now.date(), now.time()))
}

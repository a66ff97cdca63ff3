use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Bounds and error-slot wiring for one numeric input.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldSpec {
    id: String,
    error_target_id: String,
    min: f64,
    max: f64,
}

impl FieldSpec {
    pub fn new(
        id: impl Into<String>,
        error_target_id: impl Into<String>,
        min: f64,
        max: f64,
    ) -> Result<Self> {
        let id = id.into();
        if !(min <= max) {
            bail!("field {id}: min {min} must not exceed max {max}");
        }
        Ok(Self {
            id,
            error_target_id: error_target_id.into(),
            min,
            max,
        })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn error_target_id(&self) -> &str {
        &self.error_target_id
    }

    pub fn min(&self) -> f64 {
        self.min
    }

    pub fn max(&self) -> f64 {
        self.max
    }
}

/// Allowed tokens for the mutually-exclusive radius choice.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectionSpec {
    tokens: Vec<String>,
}

impl SelectionSpec {
    /// Every token must be an integer; the evaluator receives it as a number.
    pub fn new<I, S>(tokens: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let tokens: Vec<String> = tokens.into_iter().map(Into::into).collect();
        if tokens.is_empty() {
            bail!("selection must allow at least one token");
        }
        if let Some(bad) = tokens.iter().find(|t| t.parse::<i64>().is_err()) {
            bail!("selection token {bad:?} is not an integer");
        }
        Ok(Self { tokens })
    }

    pub fn tokens(&self) -> &[String] {
        &self.tokens
    }

    pub fn contains(&self, token: &str) -> bool {
        self.tokens.iter().any(|t| t == token)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InvalidReason {
    Empty,
    BadFormat,
    OutOfRange,
    NoneSelected,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationResult {
    Valid { normalized: String },
    Invalid { reason: InvalidReason },
}

impl ValidationResult {
    pub fn invalid(reason: InvalidReason) -> Self {
        ValidationResult::Invalid { reason }
    }

    pub fn is_valid(&self) -> bool {
        matches!(self, ValidationResult::Valid { .. })
    }

    pub fn normalized(&self) -> Option<&str> {
        match self {
            ValidationResult::Valid { normalized } => Some(normalized),
            ValidationResult::Invalid { .. } => None,
        }
    }
}

/// Focusable controls of the form, in focus-priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Control {
    X,
    Y,
    R,
    Submit,
}

/// Where a message is shown: under a field or in the request-level slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageSlot {
    Field(Control),
    Request,
}

/// Raw values read from the form at submit time.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormSnapshot {
    pub x: String,
    pub y: String,
    pub r: Option<String>,
}

/// One past submission as displayed. Field names on disk match the legacy
/// browser format (`now`, `execTime`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryRecord {
    pub x: String,
    pub y: String,
    pub r: String,
    pub hit: String,
    #[serde(rename = "now")]
    pub timestamp: String,
    #[serde(rename = "execTime")]
    pub exec_time: String,
}

/// Immutable runtime configuration assembled from CLI flags.
#[derive(Debug, Clone)]
pub struct FormConfig {
    pub endpoint: String,
    pub timeout: Duration,
    pub x: FieldSpec,
    pub y: FieldSpec,
    pub r: SelectionSpec,
    pub data_dir: Option<PathBuf>,
    pub ephemeral: bool,
    pub mock: bool,
    pub mock_hit: bool,
    pub user_agent: String,
}

impl FormConfig {
    /// X in [-5, 3], Y in [-3, 5], R in {1..5}.
    pub fn default_specs() -> Result<(FieldSpec, FieldSpec, SelectionSpec)> {
        Ok((
            FieldSpec::new("x", "xErr", -5.0, 3.0)?,
            FieldSpec::new("y", "yErr", -3.0, 5.0)?,
            SelectionSpec::new(["1", "2", "3", "4", "5"])?,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn field_spec_rejects_inverted_bounds() {
        assert!(FieldSpec::new("x", "xErr", 3.0, -5.0).is_err());
        assert!(FieldSpec::new("x", "xErr", 1.0, 1.0).is_ok());
    }

    #[test]
    fn selection_spec_requires_integer_tokens() {
        assert!(SelectionSpec::new(["1", "two"]).is_err());
        assert!(SelectionSpec::new(Vec::<String>::new()).is_err());
        let spec = SelectionSpec::new(["1", "2"]).expect("spec");
        assert!(spec.contains("2"));
        assert!(!spec.contains("3"));
    }

    #[test]
    fn history_record_uses_legacy_field_names() {
        let rec = HistoryRecord {
            x: "1.50".into(),
            y: "2.00".into(),
            r: "3".into(),
            hit: "Да".into(),
            timestamp: "01.10.2025, 12:00:00".into(),
            exec_time: "12 нс".into(),
        };
        let v = serde_json::to_value(&rec).expect("json");
        assert_eq!(v["now"], "01.10.2025, 12:00:00");
        assert_eq!(v["execTime"], "12 нс");
    }
}

//! Submission orchestration.
//!
//! The controller owns the per-attempt lifecycle (validate, evaluate, record);
//! `record` turns evaluator answers into history rows. Hosts (TUI, one-shot CLI)
//! call into this module and only provide a `FormSurface`.

mod controller;
mod record;

pub use controller::{SubmissionController, SubmitOutcome, SubmitState};
pub use record::HIT_LABEL;

//! Submission lifecycle controller.
//!
//! Validates the form, gates the submit control while a request is in flight,
//! and feeds successful evaluations into the history log.

use super::record::build_record;
use crate::engine::{EvalRequest, EvalResponse, Evaluator, SubmitError};
use crate::history::HistoryStore;
use crate::model::{Control, FormConfig, FormSnapshot, HistoryRecord, MessageSlot};
use crate::surface::{self, FormSurface};
use anyhow::Result;
use futures::future::BoxFuture;
use futures::FutureExt;
use std::sync::Arc;
use std::time::Duration;

/// Per-attempt state. Nothing but the history log outlives an attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitState {
    Idle,
    Validating,
    Rejected,
    Submitting,
    Recorded,
    Failed,
}

/// How one submission attempt ended.
#[derive(Debug, Clone, PartialEq)]
pub enum SubmitOutcome {
    Rejected,
    Recorded(HistoryRecord),
    Failed(String),
}

pub struct SubmissionController {
    cfg: FormConfig,
    evaluator: Arc<dyn Evaluator>,
    history: HistoryStore,
    state: SubmitState,
}

impl SubmissionController {
    pub fn new(cfg: FormConfig, evaluator: Arc<dyn Evaluator>, history: HistoryStore) -> Self {
        Self {
            cfg,
            evaluator,
            history,
            state: SubmitState::Idle,
        }
    }

    pub fn state(&self) -> SubmitState {
        self.state
    }

    pub fn history(&self) -> &HistoryStore {
        &self.history
    }

    pub fn config(&self) -> &FormConfig {
        &self.cfg
    }

    fn transition(&mut self, next: SubmitState) {
        tracing::debug!(from = ?self.state, to = ?next, "submission state");
        self.state = next;
    }

    /// Live validation for a single control, as the user edits it.
    pub fn check_control(
        &self,
        control: Control,
        snapshot: &FormSnapshot,
        surface: &mut dyn FormSurface,
    ) -> bool {
        let result = match control {
            Control::X => surface::check_field(surface, Control::X, &snapshot.x, &self.cfg.x),
            Control::Y => surface::check_field(surface, Control::Y, &snapshot.y, &self.cfg.y),
            Control::R => surface::check_selection(surface, snapshot.r.as_deref(), &self.cfg.r),
            Control::Submit => return true,
        };
        result.is_valid()
    }

    /// Validate every control and, when all pass, lock the submit control and
    /// return the request to send. On rejection exactly one control is focused.
    pub fn begin(
        &mut self,
        snapshot: &FormSnapshot,
        surface: &mut dyn FormSurface,
    ) -> Option<EvalRequest> {
        self.transition(SubmitState::Validating);

        // All three run so every error shows at once.
        let vx = surface::check_field(surface, Control::X, &snapshot.x, &self.cfg.x);
        let vy = surface::check_field(surface, Control::Y, &snapshot.y, &self.cfg.y);
        let vr = surface::check_selection(surface, snapshot.r.as_deref(), &self.cfg.r);

        let request = match (vx.normalized(), vy.normalized(), vr.normalized()) {
            (Some(x), Some(y), Some(r)) => build_request(x, y, r),
            _ => None,
        };

        let Some(request) = request else {
            let first_invalid = if !vx.is_valid() {
                Control::X
            } else if !vy.is_valid() {
                Control::Y
            } else {
                Control::R
            };
            surface.focus(first_invalid);
            self.transition(SubmitState::Rejected);
            self.transition(SubmitState::Idle);
            return None;
        };

        surface.set_submit_enabled(false);
        surface.set_message(MessageSlot::Request, "");
        self.transition(SubmitState::Submitting);
        tracing::info!(x = request.x, y = request.y, r = request.r, "submitting point");
        Some(request)
    }

    /// The evaluator call bounded by the configured timeout. Owns everything
    /// it needs so a host loop can poll it while still handling input.
    pub fn dispatch(
        &self,
        request: EvalRequest,
    ) -> BoxFuture<'static, Result<EvalResponse, SubmitError>> {
        let evaluator = Arc::clone(&self.evaluator);
        let limit = self.cfg.timeout;
        async move { evaluate_with_timeout(evaluator.as_ref(), request, limit).await }.boxed()
    }

    /// Record or report the result, then unlock the submit control.
    pub fn settle(
        &mut self,
        outcome: Result<EvalResponse, SubmitError>,
        surface: &mut dyn FormSurface,
    ) -> SubmitOutcome {
        let result = match outcome {
            Ok(resp) => {
                let record = build_record(&resp);
                match self.history.append(record.clone()) {
                    Ok(()) => {
                        surface.append_history_row(&record);
                        tracing::info!(hit = %record.hit, exec = %record.exec_time, "recorded result");
                        self.transition(SubmitState::Recorded);
                        SubmitOutcome::Recorded(record)
                    }
                    Err(e) => {
                        tracing::error!("history write failed: {e:#}");
                        let msg = format!("Не удалось сохранить историю: {e:#}");
                        surface.set_message(MessageSlot::Request, &msg);
                        self.transition(SubmitState::Failed);
                        SubmitOutcome::Failed(msg)
                    }
                }
            }
            Err(e) => {
                tracing::warn!("submission failed: {e}");
                let msg = e.to_string();
                surface.set_message(MessageSlot::Request, &msg);
                self.transition(SubmitState::Failed);
                SubmitOutcome::Failed(msg)
            }
        };
        surface.set_submit_enabled(true);
        self.transition(SubmitState::Idle);
        result
    }

    /// Full protocol for one attempt: validate, evaluate, record.
    pub async fn handle_submit(
        &mut self,
        snapshot: &FormSnapshot,
        surface: &mut dyn FormSurface,
    ) -> SubmitOutcome {
        let Some(request) = self.begin(snapshot, surface) else {
            return SubmitOutcome::Rejected;
        };
        let outcome = self.dispatch(request).await;
        self.settle(outcome, surface)
    }

    /// Empty the log and the visible rows together.
    pub fn clear_history(&mut self, surface: &mut dyn FormSurface) -> Result<()> {
        self.history.clear()?;
        surface.clear_history_rows();
        Ok(())
    }

    pub fn render_history(&self, surface: &mut dyn FormSurface) {
        self.history.render(surface);
    }
}

fn build_request(x: &str, y: &str, r: &str) -> Option<EvalRequest> {
    Some(EvalRequest {
        x: x.parse().ok()?,
        y: y.parse().ok()?,
        r: r.parse().ok()?,
    })
}

async fn evaluate_with_timeout(
    evaluator: &dyn Evaluator,
    request: EvalRequest,
    limit: Duration,
) -> Result<EvalResponse, SubmitError> {
    match tokio::time::timeout(limit, evaluator.evaluate(request)).await {
        Ok(res) => res,
        Err(_) => Err(SubmitError::Timeout(limit)),
    }
}

use super::{EvalRequest, EvalResponse, Evaluator, SubmitError};
use async_trait::async_trait;
use std::time::Instant;

type Answer = dyn Fn(&EvalRequest) -> Result<bool, SubmitError> + Send + Sync;

/// Local evaluator answering through an injected closure.
///
/// Echoes the request, leaves `time` unset so the caller stamps its own
/// clock, and reports how long the closure took in nanoseconds.
pub struct MockEvaluator {
    answer: Box<Answer>,
}

impl MockEvaluator {
    pub fn new<F>(answer: F) -> Self
    where
        F: Fn(&EvalRequest) -> Result<bool, SubmitError> + Send + Sync + 'static,
    {
        Self {
            answer: Box::new(answer),
        }
    }

    /// Always answers `hit`.
    pub fn fixed(hit: bool) -> Self {
        Self::new(move |_| Ok(hit))
    }
}

#[async_trait]
impl Evaluator for MockEvaluator {
    async fn evaluate(&self, req: EvalRequest) -> Result<EvalResponse, SubmitError> {
        let start = Instant::now();
        let hit = (self.answer)(&req)?;
        let timing_ns = start.elapsed().as_nanos() as f64;
        Ok(EvalResponse {
            x: req.x,
            y: req.y,
            r: req.r.to_string(),
            hit,
            time: None,
            timing_ns,
        })
    }
}

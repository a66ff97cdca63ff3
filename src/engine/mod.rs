//! Evaluator seam: the remote hit-test service and its local stand-in.

mod http;
mod mock;

pub use http::HttpEvaluator;
pub use mock::MockEvaluator;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

/// Request-level failures. All are recoverable by resubmitting.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SubmitError {
    #[error("Ошибка запроса: {0}")]
    TransportFailure(String),
    #[error("Ошибка запроса: {0}")]
    Malformed(String),
    #[error("Сервер не ответил за {}", format_timeout(.0))]
    Timeout(Duration),
}

fn format_timeout(d: &Duration) -> String {
    humantime::format_duration(*d).to_string()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvalRequest {
    pub x: f64,
    pub y: f64,
    pub r: i64,
}

/// Body as sent by the evaluator; loosely typed where the service is.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct WireResponse {
    pub x: f64,
    pub y: f64,
    pub r: serde_json::Value,
    pub hit: bool,
    #[serde(default)]
    pub time: Option<serde_json::Value>,
    #[serde(default)]
    pub timing: Option<serde_json::Value>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EvalResponse {
    pub x: f64,
    pub y: f64,
    /// Radius as displayed (`3`, not `3.0`).
    pub r: String,
    pub hit: bool,
    /// Evaluator-side timestamp, if one was sent.
    pub time: Option<String>,
    /// Evaluation time in nanoseconds.
    pub timing_ns: f64,
}

impl TryFrom<WireResponse> for EvalResponse {
    type Error = SubmitError;

    fn try_from(w: WireResponse) -> Result<Self, Self::Error> {
        let r = match &w.r {
            serde_json::Value::Number(n) => match n.as_i64() {
                Some(i) => i.to_string(),
                None => n.to_string(),
            },
            serde_json::Value::String(s) if !s.trim().is_empty() => s.trim().to_string(),
            other => return Err(SubmitError::Malformed(format!("bad r: {other}"))),
        };
        let timing_ns = match &w.timing {
            None | Some(serde_json::Value::Null) => 0.0,
            Some(serde_json::Value::Number(n)) => n.as_f64().unwrap_or(0.0),
            Some(serde_json::Value::String(s)) if s.trim().is_empty() => 0.0,
            Some(serde_json::Value::String(s)) => s
                .trim()
                .parse::<f64>()
                .map_err(|_| SubmitError::Malformed(format!("bad timing: {s:?}")))?,
            Some(other) => return Err(SubmitError::Malformed(format!("bad timing: {other}"))),
        };
        // A non-string time is ignored; the caller stamps the local clock.
        let time = match w.time {
            None | Some(serde_json::Value::Null) => None,
            Some(serde_json::Value::String(s)) => Some(s),
            Some(other) => {
                tracing::warn!(%other, "ignoring non-string evaluator time");
                None
            }
        };
        Ok(Self {
            x: w.x,
            y: w.y,
            r,
            hit: w.hit,
            time,
            timing_ns,
        })
    }
}

/// Decode a raw response body.
pub fn decode_response(body: &str) -> Result<EvalResponse, SubmitError> {
    let wire: WireResponse =
        serde_json::from_str(body).map_err(|e| SubmitError::Malformed(e.to_string()))?;
    EvalResponse::try_from(wire)
}

#[async_trait]
pub trait Evaluator: Send + Sync {
    async fn evaluate(&self, req: EvalRequest) -> Result<EvalResponse, SubmitError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_evaluator_body() {
        let body = r#"{"x":1.5,"y":2.0,"r":3,"hit":true,"time":"2025-10-01T12:34:56.123","timing":1200}"#;
        let resp = decode_response(body).expect("decode");
        assert_eq!(resp.r, "3");
        assert!(resp.hit);
        assert_eq!(resp.time.as_deref(), Some("2025-10-01T12:34:56.123"));
        assert_eq!(resp.timing_ns, 1200.0);
    }

    #[test]
    fn timing_may_be_string_or_missing() {
        let resp = decode_response(r#"{"x":0,"y":0,"r":"2","hit":false,"timing":"15"}"#)
            .expect("decode");
        assert_eq!(resp.timing_ns, 15.0);
        assert_eq!(resp.r, "2");

        let resp = decode_response(r#"{"x":0,"y":0,"r":2,"hit":false}"#).expect("decode");
        assert_eq!(resp.timing_ns, 0.0);
        assert_eq!(resp.time, None);
    }

    #[test]
    fn non_string_time_falls_back_to_none() {
        for body in [
            r#"{"x":1.5,"y":2,"r":3,"hit":true,"time":1696163696000,"timing":12}"#,
            r#"{"x":1.5,"y":2,"r":3,"hit":true,"time":{"epoch":1},"timing":12}"#,
            r#"{"x":1.5,"y":2,"r":3,"hit":true,"time":null,"timing":12}"#,
        ] {
            let resp = decode_response(body).expect("decode");
            assert_eq!(resp.time, None, "body {body}");
            assert!(resp.hit);
            assert_eq!(resp.timing_ns, 12.0);
        }
    }

    #[test]
    fn rejects_malformed_bodies() {
        for body in [
            "",
            "<html>",
            r#"{"x":0,"y":0,"r":2}"#,
            r#"{"x":0,"y":0,"r":null,"hit":true}"#,
            r#"{"x":0,"y":0,"r":2,"hit":true,"timing":"fast"}"#,
        ] {
            assert!(
                matches!(decode_response(body), Err(SubmitError::Malformed(_))),
                "body {body:?}"
            );
        }
    }

    #[test]
    fn timeout_message_names_duration() {
        let e = SubmitError::Timeout(Duration::from_secs(10));
        assert_eq!(e.to_string(), "Сервер не ответил за 10s");
    }
}

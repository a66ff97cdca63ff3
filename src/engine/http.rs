use super::{decode_response, EvalRequest, EvalResponse, Evaluator, SubmitError};
use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;

/// Evaluator reached over HTTP: one JSON POST per submission.
pub struct HttpEvaluator {
    http: reqwest::Client,
    endpoint: String,
}

impl HttpEvaluator {
    pub fn new(endpoint: &str, user_agent: &str) -> Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent(user_agent)
            .build()
            .context("build http client")?;
        Ok(Self {
            http,
            endpoint: endpoint.to_string(),
        })
    }
}

#[async_trait]
impl Evaluator for HttpEvaluator {
    async fn evaluate(&self, req: EvalRequest) -> Result<EvalResponse, SubmitError> {
        let body = serde_json::to_string(&req)
            .map_err(|e| SubmitError::TransportFailure(e.to_string()))?;
        tracing::debug!(endpoint = %self.endpoint, %body, "posting evaluation request");

        let resp = self
            .http
            .post(&self.endpoint)
            .header(CONTENT_TYPE, "application/json; charset=UTF-8")
            .body(body)
            .send()
            .await
            .map_err(|e| SubmitError::TransportFailure(e.to_string()))?;

        let status = resp.status();
        let text = resp
            .text()
            .await
            .map_err(|e| SubmitError::TransportFailure(e.to_string()))?;

        if !status.is_success() {
            // Prefer what the service said over the bare status line.
            let detail = if text.trim().is_empty() {
                status.to_string()
            } else {
                text.trim().to_string()
            };
            return Err(SubmitError::TransportFailure(detail));
        }

        decode_response(&text)
    }
}

//! Prompt-completion HTTP provider.
//!
//! For upstreams that take a flat prompt instead of a message list:
//! `POST {endpoint}` with `{model, prompt, temperature, max_tokens}` and
//! a direct `text`/`response`/`completion` field in the reply. Local
//! inference servers and older completion APIs follow this shape.

use std::time::Instant;

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;
use tracing::warn;

use super::extract;
use super::prompt;
use super::traits::AnalysisProvider;
use crate::config::ProviderSpec;
use crate::types::{AnalysisRequest, AnalysisResponse, HealthStatus};
use crate::{HuginnError, Result};

const TEMPERATURE: f32 = 0.2;
const MAX_TOKENS: u32 = 512;

/// Provider speaking a flat prompt-completion contract.
pub struct TextCompletionProvider {
    name: String,
    endpoint: String,
    model: String,
    api_key: Option<String>,
    block_marker: Option<String>,
    timeout: std::time::Duration,
    http: reqwest::Client,
}

impl TextCompletionProvider {
    /// Build a provider from its configuration entry.
    pub fn new(spec: &ProviderSpec) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(spec.timeout())
            .build()
            .map_err(|e| HuginnError::Configuration(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            name: spec.name.clone(),
            endpoint: spec.endpoint.trim_end_matches('/').to_string(),
            model: spec.model.clone(),
            api_key: spec.resolve_api_key(),
            block_marker: spec.block_marker.clone(),
            timeout: spec.timeout(),
            http,
        })
    }

    async fn post(&self, prompt_text: String, max_tokens: u32) -> Result<Value> {
        let body = CompletionBody {
            model: self.model.clone(),
            prompt: prompt_text,
            temperature: TEMPERATURE,
            max_tokens,
        };

        let mut request = self.http.post(&self.endpoint).json(&body);
        if let Some(ref key) = self.api_key {
            request = request.header("Authorization", format!("Bearer {key}"));
        }

        let response = request.send().await.map_err(|e| {
            if e.is_timeout() {
                HuginnError::Timeout {
                    elapsed: self.timeout,
                }
            } else {
                HuginnError::Http(e.to_string())
            }
        })?;
        let response = super::error_for_status(response).await?;
        response
            .json::<Value>()
            .await
            .map_err(|e| HuginnError::Http(e.to_string()))
    }
}

/// Completion APIs put the generated text in varying fields; accept the
/// common ones, including the nested choices shape for compatibility.
fn completion_text(payload: &Value) -> Option<&str> {
    payload
        .get("text")
        .and_then(Value::as_str)
        .or_else(|| payload.get("response").and_then(Value::as_str))
        .or_else(|| payload.get("completion").and_then(Value::as_str))
        .or_else(|| payload.pointer("/choices/0/text").and_then(Value::as_str))
        .or_else(|| {
            payload
                .pointer("/choices/0/message/content")
                .and_then(Value::as_str)
        })
}

#[async_trait]
impl AnalysisProvider for TextCompletionProvider {
    fn name(&self) -> &str {
        &self.name
    }

    async fn analyze(&self, request: &AnalysisRequest) -> Result<AnalysisResponse> {
        let prompt_text = prompt::transcript(request, self.block_marker.as_deref());
        let payload = self.post(prompt_text, MAX_TOKENS).await?;

        let content = completion_text(&payload).ok_or(HuginnError::EmptyResponse)?;
        if content.trim().is_empty() {
            return Err(HuginnError::EmptyResponse);
        }

        let parsed = extract::parse_analysis(content, self.block_marker.as_deref());
        if !parsed.structured {
            let excerpt: String = content.chars().take(120).collect();
            warn!(
                provider = self.name.as_str(),
                excerpt = excerpt.as_str(),
                "no structured block in provider output, using plain-text fallback"
            );
        }

        Ok(AnalysisResponse {
            summary: parsed.summary,
            impact_points: parsed.impact_points,
            confidence: parsed.confidence,
            sentiment: parsed.sentiment,
            provider: self.name.clone(),
            raw: Some(payload),
        })
    }

    async fn health_check(&self) -> HealthStatus {
        let start = Instant::now();
        let result = self.post("ping".to_string(), 1).await;
        let latency_ms = start.elapsed().as_secs_f64() * 1_000.0;
        match result {
            Ok(_) => HealthStatus::healthy(latency_ms),
            Err(e) => HealthStatus::unhealthy(latency_ms, e.to_string()),
        }
    }
}

#[derive(Serialize)]
struct CompletionBody {
    model: String,
    prompt: String,
    temperature: f32,
    max_tokens: u32,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn completion_text_reads_common_fields() {
        assert_eq!(completion_text(&json!({"text": "a"})), Some("a"));
        assert_eq!(completion_text(&json!({"response": "b"})), Some("b"));
        assert_eq!(completion_text(&json!({"completion": "c"})), Some("c"));
        assert_eq!(
            completion_text(&json!({"choices": [{"text": "d"}]})),
            Some("d")
        );
        assert_eq!(completion_text(&json!({"unrelated": true})), None);
    }
}

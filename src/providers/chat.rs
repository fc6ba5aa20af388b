//! Chat-completions HTTP provider.
//!
//! Speaks the widely-copied OpenAI chat shape: `POST
//! {endpoint}/chat/completions` with a message list, bearer auth, and a
//! `choices[0].message.content` response. Many hosted services clone
//! this contract, so one implementation covers a family of upstreams.
//! Responses carrying a direct top-level text field are tolerated too.

use std::time::Instant;

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, warn};

use super::extract;
use super::prompt;
use super::traits::AnalysisProvider;
use crate::config::ProviderSpec;
use crate::types::{AnalysisRequest, AnalysisResponse, HealthStatus, Role};
use crate::{HuginnError, Result};

const TEMPERATURE: f32 = 0.2;
const MAX_TOKENS: u32 = 512;

/// Provider speaking the chat-completions contract.
pub struct ChatCompletionProvider {
    name: String,
    endpoint: String,
    model: String,
    api_key: Option<String>,
    block_marker: Option<String>,
    timeout: std::time::Duration,
    http: reqwest::Client,
}

impl ChatCompletionProvider {
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

    fn build_body(&self, request: &AnalysisRequest) -> ChatBody {
        let mut messages = vec![ChatMessage {
            role: "system",
            content: prompt::instruction(request, self.block_marker.as_deref()),
        }];
        for turn in &request.context {
            messages.push(ChatMessage {
                role: match turn.role {
                    Role::System => "system",
                    Role::User => "user",
                    Role::Assistant => "assistant",
                },
                content: turn.content.clone(),
            });
        }
        messages.push(ChatMessage {
            role: "user",
            content: request.text.clone(),
        });

        ChatBody {
            model: self.model.clone(),
            messages,
            temperature: TEMPERATURE,
            max_tokens: MAX_TOKENS,
        }
    }

    async fn post(&self, body: &ChatBody) -> Result<Value> {
        let url = format!("{}/chat/completions", self.endpoint);
        let mut request = self.http.post(&url).json(body);
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

/// Pull the assistant text out of the payload, tolerating both the
/// nested choices shape and a direct text field.
fn content_text(payload: &Value) -> Option<&str> {
    payload
        .pointer("/choices/0/message/content")
        .and_then(Value::as_str)
        .or_else(|| payload.get("text").and_then(Value::as_str))
        .or_else(|| payload.get("content").and_then(Value::as_str))
        .or_else(|| payload.get("response").and_then(Value::as_str))
}

#[async_trait]
impl AnalysisProvider for ChatCompletionProvider {
    fn name(&self) -> &str {
        &self.name
    }

    async fn analyze(&self, request: &AnalysisRequest) -> Result<AnalysisResponse> {
        let body = self.build_body(request);
        let payload = self.post(&body).await?;

        let content = content_text(&payload).ok_or(HuginnError::EmptyResponse)?;
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
        } else {
            debug!(provider = self.name.as_str(), "structured block extracted");
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
        let body = ChatBody {
            model: self.model.clone(),
            messages: vec![ChatMessage {
                role: "user",
                content: "ping".to_string(),
            }],
            temperature: 0.0,
            max_tokens: 1,
        };

        let start = Instant::now();
        let result = self.post(&body).await;
        let latency_ms = start.elapsed().as_secs_f64() * 1_000.0;
        match result {
            Ok(_) => HealthStatus::healthy(latency_ms),
            Err(e) => HealthStatus::unhealthy(latency_ms, e.to_string()),
        }
    }
}

#[derive(Serialize)]
struct ChatBody {
    model: String,
    messages: Vec<ChatMessage>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Serialize)]
struct ChatMessage {
    role: &'static str,
    content: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn content_text_reads_nested_choices() {
        let payload = json!({
            "choices": [{"message": {"content": "nested"}}]
        });
        assert_eq!(content_text(&payload), Some("nested"));
    }

    #[test]
    fn content_text_reads_direct_fields() {
        assert_eq!(content_text(&json!({"text": "direct"})), Some("direct"));
        assert_eq!(
            content_text(&json!({"response": "also direct"})),
            Some("also direct")
        );
        assert_eq!(content_text(&json!({"other": 1})), None);
    }
}

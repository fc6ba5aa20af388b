//! Analysis request types

use serde::{Deserialize, Serialize};

/// Role of a conversation participant
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

/// One prior turn of the conversation, supplied as prompt context.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContextTurn {
    pub role: Role,
    pub content: String,
}

impl ContextTurn {
    /// Create a user turn
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    /// Create an assistant turn
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// A text-analysis request.
///
/// Immutable once created; the orchestrator validates the text against
/// the configured length bound before any provider is contacted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisRequest {
    /// Text to analyse.
    pub text: String,
    /// Opaque caller identity, used for rate limiting only.
    pub caller_id: String,
    /// Prior conversation turns, oldest first.
    #[serde(default)]
    pub context: Vec<ContextTurn>,
    /// Optional classification tags the caller already knows
    /// (e.g. "regulation", "etf").
    #[serde(default)]
    pub hints: Vec<String>,
}

impl AnalysisRequest {
    /// Create a request with no context or hints.
    pub fn new(text: impl Into<String>, caller_id: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            caller_id: caller_id.into(),
            context: Vec::new(),
            hints: Vec::new(),
        }
    }

    /// Attach prior conversation turns.
    pub fn with_context(mut self, context: Vec<ContextTurn>) -> Self {
        self.context = context;
        self
    }

    /// Attach a classification hint.
    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hints.push(hint.into());
        self
    }
}

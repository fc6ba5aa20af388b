//! Provider registry: a named factory for provider kinds.
//!
//! The registry maps a symbolic kind name ("chat", "completion", …) to a
//! constructor. New upstream services are added by registering a kind,
//! without touching orchestration code. Registration is additive and
//! idempotent — registering an existing name replaces its constructor
//! (last wins) while keeping its position in the listing order.
//!
//! Constructed providers are wrapped in [`RetryingProvider`] when their
//! spec asks for more than one attempt, so retry policy stays a
//! configuration concern rather than a per-implementation one.

use std::collections::HashMap;
use std::sync::Arc;

use super::retry::{RetryConfig, RetryingProvider};
use super::traits::AnalysisProvider;
use super::{ChatCompletionProvider, TextCompletionProvider};
use crate::config::ProviderSpec;
use crate::{HuginnError, Result};

/// Constructor for one provider kind.
pub type ProviderConstructor =
    Box<dyn Fn(&ProviderSpec) -> Result<Arc<dyn AnalysisProvider>> + Send + Sync>;

/// Named factory of provider constructors.
pub struct ProviderRegistry {
    constructors: HashMap<String, ProviderConstructor>,
    /// Registration order, for a stable `list()`.
    order: Vec<String>,
}

impl ProviderRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            constructors: HashMap::new(),
            order: Vec::new(),
        }
    }

    /// Create a registry with the built-in kinds registered:
    /// `chat` (message-list contract) and `completion` (flat prompt).
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry.register("chat", |spec| {
            Ok(Arc::new(ChatCompletionProvider::new(spec)?) as Arc<dyn AnalysisProvider>)
        });
        registry.register("completion", |spec| {
            Ok(Arc::new(TextCompletionProvider::new(spec)?) as Arc<dyn AnalysisProvider>)
        });
        registry
    }

    /// Register a provider kind. Last registration for a name wins.
    pub fn register<F>(&mut self, kind: impl Into<String>, constructor: F)
    where
        F: Fn(&ProviderSpec) -> Result<Arc<dyn AnalysisProvider>> + Send + Sync + 'static,
    {
        let kind = kind.into();
        if !self.constructors.contains_key(&kind) {
            self.order.push(kind.clone());
        }
        self.constructors.insert(kind, Box::new(constructor));
    }

    /// Construct a provider from its configuration entry.
    ///
    /// The provider is retry-wrapped when `spec.retry.max_attempts > 1`.
    pub fn create(&self, spec: &ProviderSpec) -> Result<Arc<dyn AnalysisProvider>> {
        let constructor = self
            .constructors
            .get(&spec.kind)
            .ok_or_else(|| HuginnError::UnknownProvider(spec.kind.clone()))?;
        let provider = constructor(spec)?;

        if spec.retry.max_attempts > 1 {
            let config = RetryConfig::from_settings(&spec.retry);
            return Ok(Arc::new(RetryingProvider::new(provider, config)));
        }
        Ok(provider)
    }

    /// Registered kind names, in registration order.
    pub fn list(&self) -> Vec<&str> {
        self.order.iter().map(String::as_str).collect()
    }
}

impl Default for ProviderRegistry {
    fn default() -> Self {
        Self::with_builtins()
    }
}

//! Pluggable text-generation backend
//!
//! Insight text and auto-categorization are delegated to an external model.
//! The rest of the crate only sees the [`InsightBackend`] capability, so the
//! model can be swapped or stubbed without touching the callers.
//!
//! # Architecture
//!
//! - `InsightBackend` trait: the capability (prompt in, text out)
//! - `AIClient` enum: concrete wrapper providing Clone + compile-time dispatch
//! - Backend implementations: `OpenAICompatibleBackend`, `MockBackend`
//!
//! # Configuration
//!
//! Environment variables:
//! - `AI_BACKEND`: Backend to use (openai_compatible, mock). Default: openai_compatible
//! - `OPENAI_COMPATIBLE_HOST`: Server URL (required for openai_compatible backend)
//! - `OPENAI_COMPATIBLE_MODEL`: Model name (default: gpt-3.5-turbo)
//! - `OPENAI_COMPATIBLE_API_KEY`: API key if required (optional)

mod mock;
mod openai_compatible;

pub use mock::MockBackend;
pub use openai_compatible::OpenAICompatibleBackend;

use async_trait::async_trait;

use crate::error::Result;

/// Capability that turns a prompt into generated text
///
/// Backends should be Send + Sync to allow use across async tasks.
#[async_trait]
pub trait InsightBackend: Send + Sync {
    /// Generate a completion for `prompt`
    async fn generate(&self, prompt: &str) -> Result<String>;

    /// Check if the backend is reachable
    async fn health_check(&self) -> bool;

    /// Model name (for logging)
    fn model(&self) -> &str;

    /// Host URL (for logging)
    fn host(&self) -> &str;
}

/// Concrete AI client enum
///
/// Provides Clone and compile-time dispatch without Box<dyn> overhead.
#[derive(Clone)]
pub enum AIClient {
    /// OpenAI-compatible chat completions server
    OpenAICompatible(OpenAICompatibleBackend),
    /// Mock backend for testing
    Mock(MockBackend),
}

impl AIClient {
    /// Create an AI client from environment variables
    ///
    /// Returns None if the selected backend is missing its settings.
    pub fn from_env() -> Option<Self> {
        let backend =
            std::env::var("AI_BACKEND").unwrap_or_else(|_| "openai_compatible".to_string());
        Self::from_name(&backend)
    }

    /// Create a client by backend name, reading backend settings from the environment
    pub fn from_name(backend: &str) -> Option<Self> {
        match backend.to_lowercase().as_str() {
            "openai_compatible" | "openai" | "vllm" | "localai" | "llamacpp" => {
                OpenAICompatibleBackend::from_env().map(AIClient::OpenAICompatible)
            }
            "mock" => Some(AIClient::Mock(MockBackend::new())),
            "none" | "" => None,
            _ => {
                tracing::warn!(backend = %backend, "Unknown AI backend, insights will use templates");
                None
            }
        }
    }

    /// Create a mock backend for testing
    pub fn mock() -> Self {
        AIClient::Mock(MockBackend::new())
    }

    /// Transport limit on each request (the mock has none)
    pub fn with_timeout(self, timeout: std::time::Duration) -> Self {
        match self {
            AIClient::OpenAICompatible(b) => AIClient::OpenAICompatible(b.with_timeout(timeout)),
            AIClient::Mock(b) => AIClient::Mock(b),
        }
    }
}

#[async_trait]
impl InsightBackend for AIClient {
    async fn generate(&self, prompt: &str) -> Result<String> {
        match self {
            AIClient::OpenAICompatible(b) => b.generate(prompt).await,
            AIClient::Mock(b) => b.generate(prompt).await,
        }
    }

    async fn health_check(&self) -> bool {
        match self {
            AIClient::OpenAICompatible(b) => b.health_check().await,
            AIClient::Mock(b) => b.health_check().await,
        }
    }

    fn model(&self) -> &str {
        match self {
            AIClient::OpenAICompatible(b) => b.model(),
            AIClient::Mock(b) => b.model(),
        }
    }

    fn host(&self) -> &str {
        match self {
            AIClient::OpenAICompatible(b) => b.host(),
            AIClient::Mock(b) => b.host(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ai_client_mock() {
        let client = AIClient::mock();
        assert_eq!(client.model(), "mock");
        assert_eq!(client.host(), "mock://localhost");
    }

    #[test]
    fn test_from_name() {
        assert!(matches!(AIClient::from_name("MOCK"), Some(AIClient::Mock(_))));
        assert!(AIClient::from_name("none").is_none());
        assert!(AIClient::from_name("carrier-pigeon").is_none());
    }

    #[tokio::test]
    async fn test_mock_generate_through_client() {
        let client = AIClient::mock();
        assert!(client.health_check().await);
        let text = client.generate("anything").await.unwrap();
        assert!(text.contains("SUMMARY:"));
    }
}

//! Mock backend for testing
//!
//! Returns canned text, optionally after a delay or as a failure.
//! Useful for unit tests and development without a running model server.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use crate::error::{Error, Result};

use super::InsightBackend;

const DEFAULT_RESPONSE: &str = "SUMMARY: Spending is concentrated in a few categories.
INSIGHTS:
- Your largest category accounts for most of this period's spending.
- Spending was steady week over week.
RECOMMENDATIONS:
- Set a monthly budget for your top category.
- Review recurring charges once a month.";

/// Mock AI backend for testing
#[derive(Clone)]
pub struct MockBackend {
    /// Whether health_check should return true
    pub healthy: bool,
    response: String,
    fail: bool,
    delay: Option<Duration>,
    calls: Arc<AtomicUsize>,
}

impl Default for MockBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl MockBackend {
    /// Create a new mock backend (healthy, answers with a well-formed report)
    pub fn new() -> Self {
        Self {
            healthy: true,
            response: DEFAULT_RESPONSE.to_string(),
            fail: false,
            delay: None,
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Answer every prompt with `response`
    pub fn with_response(response: impl Into<String>) -> Self {
        Self {
            response: response.into(),
            ..Self::new()
        }
    }

    /// Fail every request
    pub fn failing() -> Self {
        Self {
            healthy: false,
            fail: true,
            ..Self::new()
        }
    }

    /// Answer after sleeping for `delay`
    pub fn slow(delay: Duration) -> Self {
        Self {
            delay: Some(delay),
            ..Self::new()
        }
    }

    /// Delay every answer by `delay`
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Number of `generate` calls made so far (shared across clones)
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl InsightBackend for MockBackend {
    async fn generate(&self, _prompt: &str) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if self.fail {
            return Err(Error::Backend("mock backend configured to fail".into()));
        }
        Ok(self.response.clone())
    }

    async fn health_check(&self) -> bool {
        self.healthy
    }

    fn model(&self) -> &str {
        "mock"
    }

    fn host(&self) -> &str {
        "mock://localhost"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_failing_mock() {
        let mock = MockBackend::failing();
        assert!(!mock.health_check().await);
        assert!(matches!(mock.generate("x").await, Err(Error::Backend(_))));
        assert_eq!(mock.calls(), 1);
    }

    #[tokio::test]
    async fn test_call_count_shared_across_clones() {
        let mock = MockBackend::with_response("Travel");
        let clone = mock.clone();
        assert_eq!(clone.generate("x").await.unwrap(), "Travel");
        assert_eq!(mock.calls(), 1);
    }
}

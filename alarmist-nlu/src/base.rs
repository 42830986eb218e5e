//! Base traits for the primary prediction models

use async_trait::async_trait;
use std::future::Future;
use std::time::Duration;
use thiserror::Error;

/// Error type for primary model calls
///
/// Every variant routes the caller to the pattern fallback.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ClassifierError {
    #[error("model unavailable")]
    Unavailable,

    #[error("model timed out after {0}ms")]
    Timeout(u64),

    #[error("model failed: {0}")]
    Failed(String),

    #[error("model returned no output")]
    EmptyOutput,
}

pub type ClassifierResult<T> = Result<T, ClassifierError>;

/// Primary intent model: text in, raw label out
#[async_trait]
pub trait IntentModel: Send + Sync {
    /// Predict the model's own label for `text`
    async fn predict(&self, text: &str) -> ClassifierResult<String>;

    /// Model name for logs
    fn name(&self) -> &str {
        "intent-model"
    }
}

/// Primary token classifier: text in, `(token, tag)` pairs out
#[async_trait]
pub trait EntityModel: Send + Sync {
    /// Predict BIO tags such as `B-time` for each token of `text`
    async fn predict(&self, text: &str) -> ClassifierResult<Vec<(String, String)>>;

    fn name(&self) -> &str {
        "entity-model"
    }
}

/// Run a model call, turning an overrun into [`ClassifierError::Timeout`]
pub async fn with_timeout<T, F>(timeout_ms: u64, call: F) -> ClassifierResult<T>
where
    F: Future<Output = ClassifierResult<T>>,
{
    match tokio::time::timeout(Duration::from_millis(timeout_ms), call).await {
        Ok(result) => result,
        Err(_) => Err(ClassifierError::Timeout(timeout_ms)),
    }
}

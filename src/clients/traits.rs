use async_trait::async_trait;
use thiserror::Error;

/// Transport-level backend failures. A completion that arrives but does not
/// parse into the expected shape is NOT a BackendError; that is detected by
/// the pipeline's parse step.
#[derive(Debug, Error)]
pub enum BackendError {
    #[error("backend timed out after {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },
    #[error("http error: {0}")]
    Http(String),
    #[error("parse error: {0}")]
    ParseError(String),
    #[error("backend returned an empty completion")]
    EmptyCompletion,
}

/// The opaque text-completion capability the pipeline drives. Selected at
/// construction time; call sites never probe for availability.
#[async_trait]
pub trait GenerationBackend: Send + Sync {
    async fn complete(
        &self,
        system_instructions: &str,
        user_instructions: &str,
    ) -> Result<String, BackendError>;

    fn name(&self) -> &'static str;
}

use super::traits::{BackendError, GenerationBackend};
use async_trait::async_trait;

/// Fixed reply used when no generation backend is configured. Deliberately
/// not valid recommendation JSON; the pipeline surfaces it under the raw
/// fallback key.
pub const OFFLINE_PLACEHOLDER: &str =
    "[offline] Draft strategy generated from the profile and retrieved context.";

/// Stand-in backend for offline and demo runs. Always answers with the
/// fixed placeholder instead of raising.
pub struct OfflineBackend;

#[async_trait]
impl GenerationBackend for OfflineBackend {
    async fn complete(
        &self,
        _system_instructions: &str,
        _user_instructions: &str,
    ) -> Result<String, BackendError> {
        Ok(OFFLINE_PLACEHOLDER.to_string())
    }

    fn name(&self) -> &'static str {
        "offline"
    }
}

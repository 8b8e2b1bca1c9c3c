pub mod offline;
pub mod openai;
pub mod traits;

pub use offline::{OFFLINE_PLACEHOLDER, OfflineBackend};
pub use openai::OpenAiBackend;
pub use traits::{BackendError, GenerationBackend};

use crate::config::Config;
use crate::error::{InsuraError, Result};
use std::sync::Arc;
use tracing::info;

/// Pick the backend at construction time: OpenAI when a key is configured,
/// otherwise the offline placeholder backend. Call sites never probe.
pub fn create_backend(config: &Config) -> Result<Arc<dyn GenerationBackend>> {
    if let Some(key) = config.runtime.openai_api_key.clone() {
        let backend =
            OpenAiBackend::new(key, &config.backend, config.runtime.backend_timeout_ms).map_err(
                |e| InsuraError::BackendUnavailable {
                    message: e.to_string(),
                },
            )?;
        info!("Using OpenAI generation backend (model={})", config.backend.model);
        return Ok(Arc::new(backend));
    }
    info!("No generation backend configured, using offline placeholder");
    Ok(Arc::new(OfflineBackend))
}

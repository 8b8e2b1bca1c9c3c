use crate::config::Config;
use crate::error::{InsuraError, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info};

/// Unit-normalized text embeddings; cosine similarity is a plain inner
/// product on the output.
#[async_trait]
pub trait Embedder: Send + Sync {
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;
    fn dimensions(&self) -> usize;
}

// OpenAI API implementation
pub struct OpenAiEmbedder {
    client: reqwest::Client,
    api_key: String,
    model: String,
    dims: usize,
    retries: u32,
}

#[derive(Serialize)]
struct OpenAiRequest<'a> {
    model: &'a str,
    input: &'a str,
}

#[derive(Deserialize)]
struct OpenAiResponseData {
    embedding: Vec<f32>,
}

#[derive(Deserialize)]
struct OpenAiResponse {
    data: Vec<OpenAiResponseData>,
}

impl OpenAiEmbedder {
    pub fn new(api_key: String, model: String, dims: Option<usize>, retries: u32) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(20))
            .build()
            .map_err(|e| InsuraError::Embedding {
                message: format!("failed to build HTTP client: {}", e),
            })?;

        let dims = dims.unwrap_or(match model.as_str() {
            // Known OpenAI embedding dims
            "text-embedding-3-small" => 1536,
            "text-embedding-3-large" => 3072,
            _ => 1536,
        });

        Ok(Self {
            client,
            api_key,
            model,
            dims,
            retries: retries.clamp(1, 10),
        })
    }
}

#[async_trait]
impl Embedder for OpenAiEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        debug!(
            "Generating OpenAI embedding (model={}, chars={})",
            self.model,
            text.len()
        );

        let body = OpenAiRequest {
            model: &self.model,
            input: text,
        };

        // Retry with simple exponential backoff
        let mut last_err: Option<InsuraError> = None;
        for i in 0..self.retries {
            let send_res = self
                .client
                .post("https://api.openai.com/v1/embeddings")
                .bearer_auth(&self.api_key)
                .json(&body)
                .send()
                .await;
            let response = match send_res {
                Ok(resp) => resp,
                Err(e) => {
                    last_err = Some(e.into());
                    let delay_ms = 200u64 * (1u64 << i);
                    tokio::time::sleep(std::time::Duration::from_millis(delay_ms)).await;
                    continue;
                }
            };

            if !response.status().is_success() {
                let status = response.status();
                let error_text = response.text().await.unwrap_or_default();
                last_err = Some(InsuraError::Embedding {
                    message: format!("OpenAI API error {}: {}", status, error_text),
                });
                let delay_ms = 200u64 * (1u64 << i);
                tokio::time::sleep(std::time::Duration::from_millis(delay_ms)).await;
                continue;
            }

            match response.json::<OpenAiResponse>().await {
                Ok(result) => {
                    return result.data.into_iter().next().map(|d| d.embedding).ok_or(
                        InsuraError::Embedding {
                            message: "no embedding returned from OpenAI".to_string(),
                        },
                    );
                }
                Err(e) => {
                    last_err = Some(InsuraError::Embedding {
                        message: format!("failed to parse OpenAI response: {}", e),
                    });
                    let delay_ms = 200u64 * (1u64 << i);
                    tokio::time::sleep(std::time::Duration::from_millis(delay_ms)).await;
                }
            }
        }

        Err(last_err.unwrap_or(InsuraError::Embedding {
            message: "unknown OpenAI embedding error".to_string(),
        }))
    }

    fn dimensions(&self) -> usize {
        self.dims
    }
}

/// Deterministic local embedder (no network). Hashes the text into a stable
/// pseudo-random unit vector; identical text always maps to the identical
/// vector, so index builds and searches are reproducible offline.
pub struct HashEmbedder {
    dims: usize,
}

impl HashEmbedder {
    pub fn new(dims: Option<usize>) -> Self {
        let d = dims.unwrap_or(384).max(1);
        Self { dims: d }
    }

    // Stable stream of pseudo-random f32 values in [-1.0, 1.0)
    fn generate(&self, text: &str) -> Vec<f32> {
        use sha2::{Digest, Sha256};
        let mut out = Vec::with_capacity(self.dims);
        let mut i: u32 = 0;
        while out.len() < self.dims {
            // hash(text || i)
            let mut hasher = Sha256::new();
            hasher.update(text.as_bytes());
            hasher.update(i.to_le_bytes());
            let digest = hasher.finalize();
            for chunk in digest.chunks(4) {
                if out.len() >= self.dims {
                    break;
                }
                let mut bytes = [0u8; 4];
                bytes.copy_from_slice(chunk);
                let val_u32 = u32::from_le_bytes(bytes);
                let v01 = (val_u32 as f32) / (u32::MAX as f32 + 1.0);
                out.push(v01 * 2.0 - 1.0);
            }
            i = i.wrapping_add(1);
        }

        // Normalize to unit length so inner product equals cosine
        let norm: f32 = out.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            for v in &mut out {
                *v /= norm;
            }
        }
        out
    }
}

#[async_trait]
impl Embedder for HashEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        Ok(self.generate(text))
    }

    fn dimensions(&self) -> usize {
        self.dims
    }
}

/// Build the embedder the config asks for.
///
/// Selection order: an explicit provider wins; otherwise OpenAI when a key is
/// configured, else the deterministic hash embedder. With INSURA_EMBED_STRICT
/// set, the absence of a remote provider is an error instead of a fallback.
pub fn create_embedder(config: &Config) -> Result<Arc<dyn Embedder>> {
    let dims = config.system.embedding_dimensions;

    match config.system.embedding_provider.as_str() {
        "openai" => {
            let Some(key) = config.runtime.openai_api_key.clone() else {
                return Err(InsuraError::Config {
                    message: "embedding_provider=openai but OPENAI_API_KEY is not set".to_string(),
                });
            };
            info!("Using OpenAI embeddings (model={})", config.system.embedding_model);
            // Dimensions come from the model table; embedding_dimensions
            // only sizes the hash provider.
            Ok(Arc::new(OpenAiEmbedder::new(
                key,
                config.system.embedding_model.clone(),
                None,
                config.system.embed_retries,
            )?))
        }
        "hash" => {
            info!("Using deterministic hash embeddings ({} dims)", dims);
            Ok(Arc::new(HashEmbedder::new(Some(dims))))
        }
        _ => {
            // Auto-detect
            if let Some(key) = config.runtime.openai_api_key.clone() {
                info!("Using OpenAI embeddings (model={})", config.system.embedding_model);
                return Ok(Arc::new(OpenAiEmbedder::new(
                    key,
                    config.system.embedding_model.clone(),
                    None,
                    config.system.embed_retries,
                )?));
            }
            if config.runtime.embed_strict {
                return Err(InsuraError::Config {
                    message: "no embedding provider configured; set OPENAI_API_KEY or \
                              embedding_provider = \"hash\""
                        .to_string(),
                });
            }
            let fallback = HashEmbedder::new(Some(dims));
            info!(
                "Using deterministic hash embeddings ({} dims)",
                fallback.dimensions()
            );
            Ok(Arc::new(fallback))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn hash_embedder_is_deterministic() {
        let he = HashEmbedder::new(Some(128));
        let a1 = he.embed("hello world").await.unwrap();
        let a2 = he.embed("hello world").await.unwrap();
        assert_eq!(a1.len(), 128);
        assert_eq!(a2.len(), 128);
        assert!(a1.iter().zip(&a2).all(|(x, y)| (x - y).abs() < 1e-8));
    }

    #[tokio::test]
    async fn hash_embedder_varies_with_input() {
        let he = HashEmbedder::new(None); // default 384
        let a = he.embed("foo").await.unwrap();
        let b = he.embed("bar").await.unwrap();
        assert_eq!(a.len(), 384);
        assert_eq!(b.len(), 384);
        assert!(a.iter().zip(&b).any(|(x, y)| (x - y).abs() > 1e-6));
    }

    #[tokio::test]
    async fn hash_embedder_output_is_unit_length() {
        let he = HashEmbedder::new(Some(64));
        let v = he.embed("normalize me").await.unwrap();
        let norm: f32 = v.iter().map(|x| x * x).sum::<f32>().sqrt();
        assert!((norm - 1.0).abs() < 1e-5);
    }
}

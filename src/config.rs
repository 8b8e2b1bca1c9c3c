use serde::{Deserialize, Serialize};

/// Main configuration structure loaded from insura.toml and environment variables
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub system: SystemConfig,
    #[serde(default)]
    pub retrieval: RetrievalConfig,
    #[serde(default)]
    pub backend: BackendConfig,
    /// Runtime configuration loaded from environment variables
    #[serde(skip)]
    pub runtime: RuntimeConfig,
}

/// Embedding provider selection and dimensions
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SystemConfig {
    pub embedding_provider: String,
    pub embedding_model: String,
    /// Vector width of the deterministic hash provider; remote providers
    /// derive their width from the model
    pub embedding_dimensions: usize,
    pub embed_retries: u32,
}

impl Default for SystemConfig {
    fn default() -> Self {
        Self {
            // "hash" is the deterministic local provider; "openai" needs a key
            embedding_provider: String::new(),
            embedding_model: "text-embedding-3-small".to_string(),
            embedding_dimensions: 384,
            embed_retries: 3,
        }
    }
}

/// Knowledge corpus location, persisted index paths, and search behavior
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RetrievalConfig {
    pub knowledge_dir: String,
    pub index_path: String,
    pub top_k: usize,
    /// Documents kept when composing a backend prompt (prompt-size guard)
    pub context_docs_max: usize,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            knowledge_dir: "./knowledge".to_string(),
            index_path: "./kb_index.json".to_string(),
            top_k: 4,
            context_docs_max: 3,
        }
    }
}

/// Generation backend request parameters
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct BackendConfig {
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            model: "gpt-4o-mini".to_string(),
            temperature: 0.2,
            max_tokens: 1024,
        }
    }
}

/// Runtime configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    pub openai_api_key: Option<String>,
    pub backend_timeout_ms: u64,
    pub embed_strict: bool,
    pub log_level: String,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            openai_api_key: None,
            backend_timeout_ms: 30_000,
            embed_strict: false,
            log_level: "insura=info".to_string(),
        }
    }
}

impl RuntimeConfig {
    fn load_from_env() -> Self {
        let mut config = Self::default();

        let is_placeholder = |s: &str| {
            let t = s.trim();
            t.is_empty()
                || t.contains("${")
                || t.eq_ignore_ascii_case("your-api-key-here")
                || t.eq_ignore_ascii_case("changeme")
        };
        if let Ok(key) = std::env::var("OPENAI_API_KEY")
            && !is_placeholder(&key)
        {
            config.openai_api_key = Some(key);
        }

        if let Some(timeout) = std::env::var("INSURA_BACKEND_TIMEOUT_MS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
        {
            config.backend_timeout_ms = timeout.clamp(1_000, 300_000);
        }

        if let Ok(strict) = std::env::var("INSURA_EMBED_STRICT") {
            config.embed_strict = strict == "1" || strict.eq_ignore_ascii_case("true");
        }

        if let Ok(level) = std::env::var("INSURA_LOG") {
            config.log_level = level;
        }

        config
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            system: SystemConfig::default(),
            retrieval: RetrievalConfig::default(),
            backend: BackendConfig::default(),
            runtime: RuntimeConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration from TOML file and environment variables.
    /// Uses INSURA_CONFIG or defaults to "insura.toml"; a missing file is not
    /// an error, a malformed one is.
    pub fn load() -> anyhow::Result<Self> {
        let _ = dotenvy::dotenv();

        let config_path =
            std::env::var("INSURA_CONFIG").unwrap_or_else(|_| "insura.toml".to_string());

        let mut config: Config = if let Ok(content) = std::fs::read_to_string(&config_path) {
            toml::from_str(&content)?
        } else {
            tracing::debug!("Config file {} not found, using defaults", config_path);
            Self::default()
        };

        // Env overrides (env-first)
        if let Ok(dir) = std::env::var("INSURA_KNOWLEDGE_DIR") {
            config.retrieval.knowledge_dir = dir;
        }
        if let Ok(path) = std::env::var("INSURA_INDEX_PATH") {
            config.retrieval.index_path = path;
        }
        if let Some(top_k) = std::env::var("INSURA_TOP_K")
            .ok()
            .and_then(|v| v.parse::<usize>().ok())
        {
            config.retrieval.top_k = top_k;
        }
        if let Ok(provider) = std::env::var("INSURA_EMBED_PROVIDER") {
            config.system.embedding_provider = provider;
        }
        if let Ok(model) = std::env::var("INSURA_EMBED_MODEL") {
            config.system.embedding_model = model;
        }
        if let Some(dim) = std::env::var("INSURA_EMBED_DIM")
            .ok()
            .and_then(|v| v.parse::<usize>().ok())
        {
            config.system.embedding_dimensions = dim;
        }
        if let Ok(model) = std::env::var("INSURA_BACKEND_MODEL") {
            config.backend.model = model;
        }

        config.runtime = RuntimeConfig::load_from_env();

        config.validate()?;
        Ok(config)
    }

    fn validate(&mut self) -> anyhow::Result<()> {
        if self.retrieval.top_k == 0 {
            anyhow::bail!("retrieval.top_k must be at least 1");
        }
        if self.retrieval.context_docs_max > self.retrieval.top_k {
            tracing::warn!(
                "context_docs_max {} exceeds top_k {}, clamping",
                self.retrieval.context_docs_max,
                self.retrieval.top_k
            );
            self.retrieval.context_docs_max = self.retrieval.top_k;
        }
        if self.system.embedding_dimensions == 0 {
            anyhow::bail!("system.embedding_dimensions must be at least 1");
        }

        // Clamp embed_retries the same way for every provider
        if self.system.embed_retries == 0 {
            self.system.embed_retries = 1;
        } else if self.system.embed_retries > 10 {
            tracing::warn!(
                "embed_retries {} exceeds max 10, clamping to 10",
                self.system.embed_retries
            );
            self.system.embed_retries = 10;
        }

        if !(0.0..=2.0).contains(&self.backend.temperature) {
            anyhow::bail!("backend.temperature must be between 0.0 and 2.0");
        }

        match self.system.embedding_provider.as_str() {
            "" | "hash" | "openai" => {}
            other => {
                anyhow::bail!(
                    "unknown embedding provider '{}'; expected 'hash' or 'openai'",
                    other
                );
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_line_up_with_retrieval_contract() {
        let config = Config::default();
        assert_eq!(config.retrieval.top_k, 4);
        assert_eq!(config.retrieval.context_docs_max, 3);
        assert_eq!(config.system.embedding_dimensions, 384);
    }

    #[test]
    fn validate_clamps_context_docs_max() {
        let mut config = Config::default();
        config.retrieval.context_docs_max = 9;
        config.validate().unwrap();
        assert_eq!(config.retrieval.context_docs_max, config.retrieval.top_k);
    }
}

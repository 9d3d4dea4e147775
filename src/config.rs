use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub db: DbConfig,
    #[serde(default)]
    pub embedding: EmbeddingConfig,
    #[serde(default)]
    pub search: SearchConfig,
    #[serde(default)]
    pub tokens: TokenConfig,
    pub server: ServerConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DbConfig {
    pub path: PathBuf,
}

#[derive(Debug, Deserialize, Clone)]
pub struct EmbeddingConfig {
    #[serde(default = "default_provider")]
    pub provider: String,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub dims: Option<usize>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            provider: "disabled".to_string(),
            model: None,
            dims: None,
            url: None,
            batch_size: 64,
            max_retries: 5,
            timeout_secs: 30,
        }
    }
}

fn default_provider() -> String {
    "disabled".to_string()
}
fn default_batch_size() -> usize {
    64
}
fn default_max_retries() -> u32 {
    5
}
fn default_timeout_secs() -> u64 {
    30
}

impl EmbeddingConfig {
    pub fn is_enabled(&self) -> bool {
        self.provider != "disabled"
    }
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct SearchConfig {
    #[serde(default)]
    pub vector: VectorIndexSpec,
    #[serde(default)]
    pub fuzzy: FuzzyIndexSpec,
}

/// Typed descriptor for the vector search index.
///
/// The dimension count and similarity metric are explicit configuration,
/// checked once at startup rather than discovered at query time.
#[derive(Debug, Deserialize, Clone)]
pub struct VectorIndexSpec {
    #[serde(default = "default_dims")]
    pub dims: usize,
    #[serde(default = "default_metric")]
    pub metric: String,
    #[serde(default = "default_num_candidates")]
    pub num_candidates: i64,
    #[serde(default = "default_vector_limit")]
    pub limit: i64,
}

impl Default for VectorIndexSpec {
    fn default() -> Self {
        Self {
            dims: 768,
            metric: "cosine".to_string(),
            num_candidates: 100,
            limit: 5,
        }
    }
}

fn default_dims() -> usize {
    768
}
fn default_metric() -> String {
    "cosine".to_string()
}
fn default_num_candidates() -> i64 {
    100
}
fn default_vector_limit() -> i64 {
    5
}

/// Typed descriptor for the fuzzy text index.
#[derive(Debug, Deserialize, Clone)]
pub struct FuzzyIndexSpec {
    #[serde(default = "default_max_edits")]
    pub max_edits: usize,
    #[serde(default)]
    pub prefix_length: usize,
    #[serde(default = "default_fuzzy_limit")]
    pub limit: i64,
}

impl Default for FuzzyIndexSpec {
    fn default() -> Self {
        Self {
            max_edits: 2,
            prefix_length: 0,
            limit: 10,
        }
    }
}

fn default_max_edits() -> usize {
    2
}
fn default_fuzzy_limit() -> i64 {
    10
}

#[derive(Debug, Deserialize, Clone)]
pub struct TokenConfig {
    #[serde(default = "default_ttl_secs")]
    pub ttl_secs: u64,
    #[serde(default = "default_sweep_interval_secs")]
    pub sweep_interval_secs: u64,
}

impl Default for TokenConfig {
    fn default() -> Self {
        Self {
            ttl_secs: 3600,
            sweep_interval_secs: 60,
        }
    }
}

fn default_ttl_secs() -> u64 {
    3600
}
fn default_sweep_interval_secs() -> u64 {
    60
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub bind: String,
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: Config = toml::from_str(&content).with_context(|| "Failed to parse config file")?;

    validate(&config)?;

    Ok(config)
}

/// Validate cross-field invariants that serde defaults can't express.
pub fn validate(config: &Config) -> Result<()> {
    if config.search.vector.dims == 0 {
        anyhow::bail!("search.vector.dims must be > 0");
    }

    if config.search.vector.metric != "cosine" {
        anyhow::bail!(
            "Unsupported similarity metric: '{}'. Only cosine is supported.",
            config.search.vector.metric
        );
    }

    if config.search.vector.num_candidates < 1 {
        anyhow::bail!("search.vector.num_candidates must be >= 1");
    }

    if config.search.vector.limit < 1 {
        anyhow::bail!("search.vector.limit must be >= 1");
    }

    if config.search.fuzzy.max_edits > 2 {
        anyhow::bail!("search.fuzzy.max_edits must be <= 2");
    }

    if config.search.fuzzy.limit < 1 {
        anyhow::bail!("search.fuzzy.limit must be >= 1");
    }

    if config.tokens.ttl_secs == 0 {
        anyhow::bail!("tokens.ttl_secs must be > 0");
    }

    if config.embedding.is_enabled() {
        if config.embedding.dims.is_none() || config.embedding.dims == Some(0) {
            anyhow::bail!(
                "embedding.dims must be > 0 when provider is '{}'",
                config.embedding.provider
            );
        }
        if config.embedding.model.is_none() {
            anyhow::bail!(
                "embedding.model must be specified when provider is '{}'",
                config.embedding.provider
            );
        }
        // Stored vectors and the search index must agree on dimensionality.
        if config.embedding.dims != Some(config.search.vector.dims) {
            anyhow::bail!(
                "embedding.dims ({}) does not match search.vector.dims ({})",
                config.embedding.dims.unwrap_or(0),
                config.search.vector.dims
            );
        }
    }

    match config.embedding.provider.as_str() {
        "disabled" | "openai" | "ollama" | "local" => {}
        other => anyhow::bail!(
            "Unknown embedding provider: '{}'. Must be disabled, openai, ollama, or local.",
            other
        ),
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_config(extra: &str) -> String {
        format!(
            r#"
[db]
path = "/tmp/shelf-test.sqlite"

[server]
bind = "127.0.0.1:7878"

{}
"#,
            extra
        )
    }

    fn parse(extra: &str) -> Result<Config> {
        let config: Config = toml::from_str(&base_config(extra))?;
        validate(&config)?;
        Ok(config)
    }

    #[test]
    fn test_defaults() {
        let config = parse("").unwrap();
        assert_eq!(config.embedding.provider, "disabled");
        assert_eq!(config.search.vector.dims, 768);
        assert_eq!(config.search.vector.metric, "cosine");
        assert_eq!(config.search.vector.num_candidates, 100);
        assert_eq!(config.search.vector.limit, 5);
        assert_eq!(config.search.fuzzy.max_edits, 2);
        assert_eq!(config.search.fuzzy.prefix_length, 0);
        assert_eq!(config.search.fuzzy.limit, 10);
        assert_eq!(config.tokens.ttl_secs, 3600);
    }

    #[test]
    fn test_rejects_unknown_metric() {
        let err = parse("[search.vector]\nmetric = \"dot\"").unwrap_err();
        assert!(err.to_string().contains("similarity metric"));
    }

    #[test]
    fn test_rejects_excessive_max_edits() {
        let err = parse("[search.fuzzy]\nmax_edits = 3").unwrap_err();
        assert!(err.to_string().contains("max_edits"));
    }

    #[test]
    fn test_rejects_enabled_provider_without_model() {
        let err = parse("[embedding]\nprovider = \"ollama\"\ndims = 768").unwrap_err();
        assert!(err.to_string().contains("embedding.model"));
    }

    #[test]
    fn test_rejects_dims_mismatch() {
        let err = parse(
            "[embedding]\nprovider = \"ollama\"\nmodel = \"nomic-embed-text\"\ndims = 384",
        )
        .unwrap_err();
        assert!(err.to_string().contains("does not match"));
    }

    #[test]
    fn test_rejects_unknown_provider() {
        let err = parse("[embedding]\nprovider = \"bert\"\nmodel = \"x\"\ndims = 768").unwrap_err();
        assert!(err.to_string().contains("Unknown embedding provider"));
    }

    #[test]
    fn test_accepts_matching_dims() {
        let config = parse(
            "[embedding]\nprovider = \"ollama\"\nmodel = \"nomic-embed-text\"\ndims = 768",
        )
        .unwrap();
        assert!(config.embedding.is_enabled());
    }
}

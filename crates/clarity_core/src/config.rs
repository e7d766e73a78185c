//! Configuration management for the verdict engine.
//!
//! Loads settings from /etc/clarity/engine.toml or uses defaults. Every
//! aggregation threshold lives here: tuned values, not physical constants,
//! revalidate against a labeled set before changing them in production.

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tracing::{info, warn};

/// Config file path
pub const CONFIG_PATH: &str = "/etc/clarity/engine.toml";

/// Default config file path for fallback
pub const DEFAULT_CONFIG_PATH: &str = "/var/lib/clarity/engine.toml";

/// Aggregation rule thresholds and weights
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Candidates kept for stance scoring
    #[serde(default = "default_top_k")]
    pub top_k: usize,

    /// Minimum claim/evidence similarity for the fact-check override rule
    #[serde(default = "default_match_threshold")]
    pub match_threshold: f32,

    /// Required gap between entail and contradict averages before deciding
    #[serde(default = "default_stance_margin")]
    pub stance_margin: f32,

    /// Absolute floor the winning stance average must clear
    #[serde(default = "default_stance_floor")]
    pub stance_floor: f32,

    /// Vote weight for fact-check family items (and "fact" sources)
    #[serde(default = "default_fact_check_weight")]
    pub fact_check_weight: f32,

    /// Vote weight for plain news items
    #[serde(default = "default_news_weight")]
    pub news_weight: f32,

    /// Confidence assigned to an explicit structured rating
    #[serde(default = "default_structured_confidence")]
    pub structured_confidence: f32,

    /// Base confidence for the fact-check override rule
    #[serde(default = "default_override_base")]
    pub override_base_confidence: f32,

    /// Similarity multiplier added on top of the override base
    #[serde(default = "default_override_gain")]
    pub override_similarity_gain: f32,

    /// Hard ceiling for any evidence-derived confidence
    #[serde(default = "default_max_confidence")]
    pub max_confidence: f32,
}

fn default_top_k() -> usize {
    5
}

fn default_match_threshold() -> f32 {
    0.45
}

fn default_stance_margin() -> f32 {
    0.15
}

fn default_stance_floor() -> f32 {
    0.5
}

fn default_fact_check_weight() -> f32 {
    2.0
}

fn default_news_weight() -> f32 {
    1.0
}

fn default_structured_confidence() -> f32 {
    0.98
}

fn default_override_base() -> f32 {
    0.85
}

fn default_override_gain() -> f32 {
    0.10
}

fn default_max_confidence() -> f32 {
    0.99
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            top_k: default_top_k(),
            match_threshold: default_match_threshold(),
            stance_margin: default_stance_margin(),
            stance_floor: default_stance_floor(),
            fact_check_weight: default_fact_check_weight(),
            news_weight: default_news_weight(),
            structured_confidence: default_structured_confidence(),
            override_base_confidence: default_override_base(),
            override_similarity_gain: default_override_gain(),
            max_confidence: default_max_confidence(),
        }
    }
}

/// Embedding model server (Ollama-compatible API)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingConfig {
    /// Set false to skip probing and force the lexical fallback
    #[serde(default = "default_enabled")]
    pub enabled: bool,

    #[serde(default = "default_embedding_endpoint")]
    pub endpoint: String,

    #[serde(default = "default_embedding_model")]
    pub model: String,

    /// Per-call timeout in seconds
    #[serde(default = "default_model_timeout")]
    pub timeout_secs: u64,

    /// Bounded process-wide cache of text -> vector
    #[serde(default = "default_cache_entries")]
    pub cache_entries: usize,
}

fn default_enabled() -> bool {
    true
}

fn default_embedding_endpoint() -> String {
    "http://127.0.0.1:11434".to_string()
}

fn default_embedding_model() -> String {
    "nomic-embed-text".to_string()
}

fn default_model_timeout() -> u64 {
    8
}

fn default_cache_entries() -> usize {
    512
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            endpoint: default_embedding_endpoint(),
            model: default_embedding_model(),
            timeout_secs: default_model_timeout(),
            cache_entries: default_cache_entries(),
        }
    }
}

/// NLI stance model server
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StanceConfig {
    /// Set false to skip probing and force the similarity heuristic
    #[serde(default = "default_enabled")]
    pub enabled: bool,

    #[serde(default = "default_stance_endpoint")]
    pub endpoint: String,

    #[serde(default = "default_stance_model")]
    pub model: String,

    /// Per-call timeout in seconds
    #[serde(default = "default_model_timeout")]
    pub timeout_secs: u64,
}

fn default_stance_endpoint() -> String {
    "http://127.0.0.1:8090".to_string()
}

fn default_stance_model() -> String {
    "distilbart-mnli".to_string()
}

impl Default for StanceConfig {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            endpoint: default_stance_endpoint(),
            model: default_stance_model(),
            timeout_secs: default_model_timeout(),
        }
    }
}

/// Full engine configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub engine: EngineConfig,

    #[serde(default)]
    pub embedding: EmbeddingConfig,

    #[serde(default)]
    pub stance: StanceConfig,
}

impl Config {
    /// Load config from file, or return defaults
    pub fn load() -> Self {
        Self::load_from_path(CONFIG_PATH)
            .or_else(|_| Self::load_from_path(DEFAULT_CONFIG_PATH))
            .unwrap_or_else(|e| {
                warn!("Config not found, using defaults: {}", e);
                Config::default()
            })
    }

    /// Load config from specific path
    fn load_from_path(path: &str) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        info!("Loaded config from {}", path);
        Ok(config)
    }

    /// Save default config to path (for init)
    #[allow(dead_code)]
    pub fn save_default(path: &str) -> Result<()> {
        let config = Config::default();
        let content = toml::to_string_pretty(&config)?;
        if let Some(parent) = Path::new(path).parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, content)?;
        info!("Saved default config to {}", path);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.engine.top_k, 5);
        assert_eq!(config.engine.match_threshold, 0.45);
        assert_eq!(config.engine.fact_check_weight, 2.0);
        assert_eq!(config.engine.structured_confidence, 0.98);
        assert!(config.embedding.enabled);
        assert_eq!(config.embedding.endpoint, "http://127.0.0.1:11434");
        assert_eq!(config.stance.model, "distilbart-mnli");
    }

    #[test]
    fn test_parse_toml() {
        let toml_str = r#"
[engine]
top_k = 3
match_threshold = 0.6

[stance]
enabled = false
"#;
        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(config.engine.top_k, 3);
        assert_eq!(config.engine.match_threshold, 0.6);
        assert!(!config.stance.enabled);
        // Defaults for missing fields
        assert_eq!(config.engine.stance_margin, 0.15);
        assert_eq!(config.embedding.cache_entries, 512);
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[engine]\nnews_weight = 0.5").unwrap();
        let config = Config::load_from_path(file.path().to_str().unwrap()).unwrap();
        assert_eq!(config.engine.news_weight, 0.5);
        assert_eq!(config.engine.fact_check_weight, 2.0);
    }

    #[test]
    fn test_load_missing_file_errors() {
        assert!(Config::load_from_path("/nonexistent/clarity.toml").is_err());
    }

    #[test]
    fn test_round_trip() {
        let config = Config::default();
        let toml_str = toml::to_string_pretty(&config).unwrap();
        let back: Config = toml::from_str(&toml_str).unwrap();
        assert_eq!(back.engine.top_k, config.engine.top_k);
        assert_eq!(back.stance.endpoint, config.stance.endpoint);
    }
}

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::path::Path;
use tracing_subscriber::EnvFilter;

use crate::core::{MatchingConfig, MissingInclusionPolicy};

/// Application configuration
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub server: ServerSettings,
    #[serde(default)]
    pub matching: MatchingSettings,
    #[serde(default)]
    pub catalog: CatalogSettings,
    #[serde(default)]
    pub embedding: EmbeddingSettings,
    #[serde(default)]
    pub explainer: ExplainerSettings,
    #[serde(default)]
    pub registry: RegistrySettings,
    #[serde(default)]
    pub logging: LoggingSettings,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerSettings {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    pub workers: Option<usize>,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            workers: None,
        }
    }
}

fn default_host() -> String { "0.0.0.0".to_string() }
fn default_port() -> u16 { 8080 }

#[derive(Debug, Clone, Deserialize)]
pub struct MatchingSettings {
    #[serde(default = "default_fuzzy_threshold")]
    pub fuzzy_threshold: f64,
    #[serde(default = "default_retrieval_breadth")]
    pub retrieval_breadth: usize,
    #[serde(default = "default_top_k")]
    pub default_top_k: u16,
    #[serde(default = "default_max_top_k")]
    pub max_top_k: u16,
    #[serde(default = "default_semantic_precision")]
    pub semantic_precision: u32,
    #[serde(default)]
    pub missing_inclusion: MissingInclusionPolicy,
    #[serde(default = "default_match_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for MatchingSettings {
    fn default() -> Self {
        Self {
            fuzzy_threshold: default_fuzzy_threshold(),
            retrieval_breadth: default_retrieval_breadth(),
            default_top_k: default_top_k(),
            max_top_k: default_max_top_k(),
            semantic_precision: default_semantic_precision(),
            missing_inclusion: MissingInclusionPolicy::default(),
            timeout_secs: default_match_timeout_secs(),
        }
    }
}

impl MatchingSettings {
    /// Engine parameters derived from these settings
    pub fn engine_config(&self) -> MatchingConfig {
        MatchingConfig {
            fuzzy_threshold: self.fuzzy_threshold,
            retrieval_breadth: self.retrieval_breadth,
            semantic_precision: self.semantic_precision,
            missing_inclusion: self.missing_inclusion,
        }
    }

    /// Requested top-k, falling back to the default and capped at the maximum
    pub fn resolve_top_k(&self, requested: Option<u16>) -> usize {
        requested
            .unwrap_or(self.default_top_k)
            .min(self.max_top_k) as usize
    }
}

fn default_fuzzy_threshold() -> f64 { 0.8 }
fn default_retrieval_breadth() -> usize { 100 }
fn default_top_k() -> u16 { 10 }
fn default_max_top_k() -> u16 { 100 }
fn default_semantic_precision() -> u32 { 4 }
fn default_match_timeout_secs() -> u64 { 30 }

#[derive(Debug, Clone, Deserialize)]
pub struct CatalogSettings {
    #[serde(default = "default_catalog_path")]
    pub path: String,
    #[serde(default = "default_raw_path")]
    pub raw_path: String,
}

impl Default for CatalogSettings {
    fn default() -> Self {
        Self {
            path: default_catalog_path(),
            raw_path: default_raw_path(),
        }
    }
}

fn default_catalog_path() -> String { "data/embedded_trials.json".to_string() }
fn default_raw_path() -> String { "data/raw_trials.json".to_string() }

#[derive(Debug, Clone, Deserialize)]
pub struct EmbeddingSettings {
    #[serde(default = "default_ollama_endpoint")]
    pub endpoint: String,
    #[serde(default = "default_embedding_model")]
    pub model: String,
    #[serde(default = "default_embedding_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_cache_size")]
    pub cache_size: u64,
    #[serde(default = "default_cache_ttl_secs")]
    pub cache_ttl_secs: u64,
}

impl Default for EmbeddingSettings {
    fn default() -> Self {
        Self {
            endpoint: default_ollama_endpoint(),
            model: default_embedding_model(),
            timeout_secs: default_embedding_timeout_secs(),
            cache_size: default_cache_size(),
            cache_ttl_secs: default_cache_ttl_secs(),
        }
    }
}

fn default_ollama_endpoint() -> String { "http://localhost:11434".to_string() }
fn default_embedding_model() -> String { "all-minilm".to_string() }
fn default_embedding_timeout_secs() -> u64 { 30 }
fn default_cache_size() -> u64 { 1000 }
fn default_cache_ttl_secs() -> u64 { 3600 }

#[derive(Debug, Clone, Deserialize)]
pub struct ExplainerSettings {
    #[serde(default = "default_ollama_endpoint")]
    pub endpoint: String,
    #[serde(default = "default_explainer_model")]
    pub model: String,
    #[serde(default = "default_explainer_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for ExplainerSettings {
    fn default() -> Self {
        Self {
            endpoint: default_ollama_endpoint(),
            model: default_explainer_model(),
            timeout_secs: default_explainer_timeout_secs(),
        }
    }
}

fn default_explainer_model() -> String { "mistral".to_string() }
fn default_explainer_timeout_secs() -> u64 { 300 }

#[derive(Debug, Clone, Deserialize)]
pub struct RegistrySettings {
    #[serde(default = "default_registry_url")]
    pub base_url: String,
    #[serde(default = "default_page_size")]
    pub page_size: u32,
    #[serde(default = "default_max_trials")]
    pub max_trials: usize,
    #[serde(default = "default_request_delay_ms")]
    pub request_delay_ms: u64,
    #[serde(default = "default_excluded_statuses")]
    pub excluded_statuses: Vec<String>,
    #[serde(default = "default_search_terms")]
    pub search_terms: Vec<String>,
}

impl Default for RegistrySettings {
    fn default() -> Self {
        Self {
            base_url: default_registry_url(),
            page_size: default_page_size(),
            max_trials: default_max_trials(),
            request_delay_ms: default_request_delay_ms(),
            excluded_statuses: default_excluded_statuses(),
            search_terms: default_search_terms(),
        }
    }
}

fn default_registry_url() -> String { "https://clinicaltrials.gov/api/v2".to_string() }
fn default_page_size() -> u32 { 100 }
fn default_max_trials() -> usize { 500 }
fn default_request_delay_ms() -> u64 { 250 }

fn default_excluded_statuses() -> Vec<String> {
    ["COMPLETED", "WITHDRAWN", "TERMINATED", "SUSPENDED", "NO LONGER AVAILABLE"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

fn default_search_terms() -> Vec<String> {
    [
        "cancer", "diabetes", "asthma", "depression", "hypertension",
        "arthritis", "stroke", "epilepsy", "obesity", "HIV", "COVID-19",
        "chronic pain", "heart disease", "Parkinson's", "Alzheimer's",
        "anxiety", "bipolar disorder", "schizophrenia", "glaucoma",
        "hepatitis", "psoriasis", "multiple sclerosis", "endometriosis",
        "infertility", "osteoporosis", "lymphoma", "melanoma", "IBS",
        "GERD", "insomnia",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingSettings {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default = "default_log_format")]
    pub format: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

fn default_log_level() -> String { "info".to_string() }
fn default_log_format() -> String { "json".to_string() }

impl LoggingSettings {
    /// Install the global tracing subscriber
    ///
    /// `LOG_LEVEL` and `LOG_FORMAT` override the configured values.
    pub fn init(&self) {
        let level = std::env::var("LOG_LEVEL").unwrap_or_else(|_| self.level.clone());
        let format = std::env::var("LOG_FORMAT").unwrap_or_else(|_| self.format.clone());

        let subscriber = tracing_subscriber::fmt()
            .with_env_filter(EnvFilter::new(level))
            .with_target(false)
            .with_level(true);

        if format == "pretty" {
            subscriber.pretty().init();
        } else {
            subscriber.init();
        }
    }
}

impl Settings {
    /// Load configuration from file and environment variables
    ///
    /// Configuration is loaded in the following order (later overrides earlier):
    /// 1. Default values in the struct
    /// 2. Configuration file (config/default.toml)
    /// 3. Local override file (config/local.toml)
    /// 4. Environment variables (prefixed with TRIALMATCH)
    pub fn load() -> Result<Self, ConfigError> {
        let settings = Config::builder()
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name("config/local").required(false))
            // e.g., TRIALMATCH__MATCHING__FUZZY_THRESHOLD -> matching.fuzzy_threshold
            .add_source(environment())
            .build()?;

        settings.try_deserialize()
    }

    /// Load configuration from a custom path
    pub fn load_from<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let settings = Config::builder()
            .add_source(File::from(path.as_ref()))
            .add_source(environment())
            .build()?;

        settings.try_deserialize()
    }
}

fn environment() -> Environment {
    Environment::with_prefix("TRIALMATCH")
        .prefix_separator("__")
        .separator("__")
        .list_separator(",")
        .with_list_parse_key("registry.excluded_statuses")
        .with_list_parse_key("registry.search_terms")
        .try_parsing(true)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_matching() {
        let matching = MatchingSettings::default();
        assert_eq!(matching.fuzzy_threshold, 0.8);
        assert_eq!(matching.retrieval_breadth, 100);
        assert_eq!(matching.semantic_precision, 4);
        assert_eq!(matching.missing_inclusion, MissingInclusionPolicy::Empty);
    }

    #[test]
    fn test_resolve_top_k() {
        let matching = MatchingSettings::default();
        assert_eq!(matching.resolve_top_k(None), 10);
        assert_eq!(matching.resolve_top_k(Some(3)), 3);
        assert_eq!(matching.resolve_top_k(Some(500)), 100);
    }

    #[test]
    fn test_engine_config_mirrors_settings() {
        let matching = MatchingSettings {
            fuzzy_threshold: 0.9,
            retrieval_breadth: 50,
            ..MatchingSettings::default()
        };
        let config = matching.engine_config();
        assert_eq!(config.fuzzy_threshold, 0.9);
        assert_eq!(config.retrieval_breadth, 50);
    }

    #[test]
    fn test_default_registry() {
        let registry = RegistrySettings::default();
        assert_eq!(registry.page_size, 100);
        assert_eq!(registry.max_trials, 500);
        assert!(registry.excluded_statuses.contains(&"COMPLETED".to_string()));
        assert_eq!(registry.search_terms.len(), 30);
    }

    #[test]
    fn test_empty_source_deserializes_to_defaults() {
        let settings: Settings = Config::builder().build().unwrap().try_deserialize().unwrap();
        assert_eq!(settings.server.port, 8080);
        assert_eq!(settings.explainer.model, "mistral");
        assert_eq!(settings.catalog.path, "data/embedded_trials.json");
    }

    #[test]
    fn test_default_logging() {
        let level = default_log_level();
        let format = default_log_format();
        assert_eq!(level, "info");
        assert_eq!(format, "json");
    }
}

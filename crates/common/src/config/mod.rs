//! Configuration management for ReadForge
//!
//! Supports loading configuration from:
//! - Environment variables (prefixed with APP__)
//! - Configuration files (config/default.toml, config/{APP_ENV}.toml)
//! - Default values

use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Main application configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct AppConfig {
    /// HTTP server configuration
    #[serde(default)]
    pub server: ServerConfig,

    /// Suggestion engine settings
    #[serde(default)]
    pub suggestions: SuggestionSettings,

    /// Author resolution settings
    #[serde(default)]
    pub authors: AuthorSettings,

    /// Concept lattice settings
    #[serde(default)]
    pub concepts: ConceptSettings,

    /// Offline metadata catalog
    #[serde(default)]
    pub catalog: CatalogConfig,

    /// Observability configuration
    #[serde(default)]
    pub observability: ObservabilityConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    /// Host to bind to
    #[serde(default = "default_host")]
    pub host: String,

    /// Port to listen on
    #[serde(default = "default_port")]
    pub port: u16,

    /// Request timeout in seconds
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SuggestionSettings {
    /// Size of the visible suggestion page
    #[serde(default = "default_max_suggestions")]
    pub max_suggestions: usize,

    /// Size of the background prefetch batch
    #[serde(default = "default_load_more_increment")]
    pub load_more_increment: usize,

    /// Seed for the tie-break shuffle
    #[serde(default = "default_shuffle_seed")]
    pub shuffle_seed: u64,

    /// Maximum concurrent metadata fetches
    #[serde(default = "default_fetch_concurrency")]
    pub fetch_concurrency: usize,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AuthorSettings {
    /// Score multiplier for first-author mentions
    #[serde(default = "default_first_author_boost")]
    pub first_author_boost: f64,

    /// Score multiplier for mentions on new publications
    #[serde(default = "default_new_publication_boost")]
    pub new_publication_boost: f64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ConceptSettings {
    /// Upper bound on attributes; enumeration is exponential in this
    #[serde(default = "default_max_attributes")]
    pub max_attributes: usize,

    /// Add shared citation links as attributes
    #[serde(default)]
    pub include_citation_links: bool,

    /// Minimum number of selected publications sharing a link
    #[serde(default = "default_min_link_support")]
    pub min_link_support: usize,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct CatalogConfig {
    /// JSON file with publication metadata keyed by DOI
    pub path: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ObservabilityConfig {
    /// Log filter (e.g. "info", "readforge_engine=debug")
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Enable JSON logging
    #[serde(default = "default_json_logging")]
    pub json_logging: bool,

    /// Metrics port (0 to disable)
    #[serde(default = "default_metrics_port")]
    pub metrics_port: u16,

    /// Service name for logs
    #[serde(default = "default_service_name")]
    pub service_name: String,
}

// Default value functions
fn default_host() -> String { "0.0.0.0".to_string() }
fn default_port() -> u16 { 8080 }
fn default_request_timeout() -> u64 { 60 }
fn default_max_suggestions() -> usize { 50 }
fn default_load_more_increment() -> usize { 50 }
fn default_shuffle_seed() -> u64 { 0x5EED_CAFE }
fn default_fetch_concurrency() -> usize { 16 }
fn default_first_author_boost() -> f64 { 2.0 }
fn default_new_publication_boost() -> f64 { 2.0 }
fn default_max_attributes() -> usize { 20 }
fn default_min_link_support() -> usize { 2 }
fn default_log_level() -> String { "info".to_string() }
fn default_json_logging() -> bool { true }
fn default_metrics_port() -> u16 { 9090 }
fn default_service_name() -> String { "readforge".to_string() }

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            request_timeout_secs: default_request_timeout(),
        }
    }
}

impl Default for SuggestionSettings {
    fn default() -> Self {
        Self {
            max_suggestions: default_max_suggestions(),
            load_more_increment: default_load_more_increment(),
            shuffle_seed: default_shuffle_seed(),
            fetch_concurrency: default_fetch_concurrency(),
        }
    }
}

impl Default for AuthorSettings {
    fn default() -> Self {
        Self {
            first_author_boost: default_first_author_boost(),
            new_publication_boost: default_new_publication_boost(),
        }
    }
}

impl Default for ConceptSettings {
    fn default() -> Self {
        Self {
            max_attributes: default_max_attributes(),
            include_citation_links: false,
            min_link_support: default_min_link_support(),
        }
    }
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            json_logging: default_json_logging(),
            metrics_port: default_metrics_port(),
            service_name: default_service_name(),
        }
    }
}

impl AppConfig {
    /// Load configuration from environment and files
    pub fn load() -> Result<Self, ConfigError> {
        let env = std::env::var("APP_ENV").unwrap_or_else(|_| "development".to_string());

        let config = Config::builder()
            // Load base config file
            .add_source(File::with_name("config/default").required(false))

            // Load environment-specific config
            .add_source(File::with_name(&format!("config/{}", env)).required(false))

            // Load local overrides
            .add_source(File::with_name("config/local").required(false))

            // Load from environment variables with APP__ prefix
            // e.g., APP__SUGGESTIONS__MAX_SUGGESTIONS=100
            .add_source(
                Environment::with_prefix("APP")
                    .separator("__")
                    .try_parsing(true)
            )

            .build()?;

        config.try_deserialize()
    }

    /// Get request timeout as Duration
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.server.request_timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use config::FileFormat;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.suggestions.max_suggestions, 50);
        assert_eq!(config.suggestions.load_more_increment, 50);
        assert_eq!(config.concepts.max_attributes, 20);
        assert!(config.catalog.path.is_none());
    }

    #[test]
    fn test_partial_file_falls_back_to_defaults() {
        let config: AppConfig = Config::builder()
            .add_source(File::from_str(
                "[suggestions]\nmax_suggestions = 10\n\n[concepts]\ninclude_citation_links = true\n",
                FileFormat::Toml,
            ))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();

        assert_eq!(config.suggestions.max_suggestions, 10);
        assert_eq!(config.suggestions.fetch_concurrency, 16);
        assert!(config.concepts.include_citation_links);
        assert_eq!(config.concepts.min_link_support, 2);
        assert_eq!(config.authors.first_author_boost, 2.0);
    }

    #[test]
    fn test_request_timeout() {
        let config = AppConfig::default();
        assert_eq!(config.request_timeout(), Duration::from_secs(60));
    }
}

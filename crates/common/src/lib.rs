//! ReadForge Common Library
//!
//! Shared code for the ReadForge engines and gateway including:
//! - Publication data model
//! - Keyword group matching
//! - Error types and handling
//! - Configuration management
//! - Metrics and observability

pub mod config;
pub mod errors;
pub mod keywords;
pub mod metrics;
pub mod models;

// Re-export commonly used types
pub use config::AppConfig;
pub use errors::{AppError, Result};
pub use keywords::{KeywordMatch, KeywordMatcher};
pub use models::{Doi, PublicationMetadata, PublicationRecord};

/// Application version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

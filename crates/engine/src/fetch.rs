//! Metadata fetch abstraction
//!
//! The suggestion engine hydrates candidates through a [`MetadataFetcher`].
//! Network-backed providers live outside this crate; the bundled
//! [`CatalogFetcher`] serves metadata from an in-memory catalog.

use async_trait::async_trait;
use readforge_common::config::CatalogConfig;
use readforge_common::errors::{AppError, Result};
use readforge_common::models::{Doi, PublicationMetadata, PublicationRecord};
use std::collections::HashMap;
use std::sync::Arc;

/// Trait for candidate metadata retrieval
#[async_trait]
pub trait MetadataFetcher: Send + Sync {
    /// Fetch metadata for a single publication
    async fn fetch(&self, publication: &PublicationRecord) -> Result<PublicationMetadata>;

    /// Provider name for logs
    fn name(&self) -> &str;
}

/// Fetcher backed by a DOI-keyed metadata catalog
#[derive(Debug, Clone, Default)]
pub struct CatalogFetcher {
    entries: HashMap<Doi, PublicationMetadata>,
}

impl CatalogFetcher {
    pub fn new(entries: HashMap<Doi, PublicationMetadata>) -> Self {
        Self { entries }
    }

    /// Parse a JSON object mapping DOI to metadata
    pub fn from_json_str(json: &str) -> Result<Self> {
        let entries: HashMap<Doi, PublicationMetadata> = serde_json::from_str(json)?;
        Ok(Self::new(entries))
    }

    /// Load a catalog file
    pub fn from_json_file(path: &str) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[async_trait]
impl MetadataFetcher for CatalogFetcher {
    async fn fetch(&self, publication: &PublicationRecord) -> Result<PublicationMetadata> {
        self.entries
            .get(&publication.doi)
            .cloned()
            .ok_or_else(|| AppError::PublicationNotFound {
                doi: publication.doi.clone(),
            })
    }

    fn name(&self) -> &str {
        "catalog"
    }
}

/// Create a fetcher based on configuration
pub fn create_fetcher(config: &CatalogConfig) -> Result<Arc<dyn MetadataFetcher>> {
    match &config.path {
        Some(path) => {
            let fetcher = CatalogFetcher::from_json_file(path)?;
            tracing::info!(path = %path, entries = fetcher.len(), "Metadata catalog loaded");
            Ok(Arc::new(fetcher))
        }
        None => {
            tracing::warn!("No metadata catalog configured, candidates will stay unhydrated");
            Ok(Arc::new(CatalogFetcher::default()))
        }
    }
}

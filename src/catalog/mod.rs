//! Model catalog: searchable sources of downloadable 3D assets.
//!
//! Backends implement [`ModelCatalog`]. The live backend talks to an
//! external model-library API; the built-in backend is a small offline
//! table; the tiered backend tries live first and falls back to built-in.

pub mod builtin;
pub mod poly;

use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::config::CatalogConfig;

pub use builtin::BuiltinCatalog;
pub use poly::PolyCatalog;

/// A concrete downloadable model record.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetCandidate {
    pub id: String,
    pub title: String,
    pub author: String,
    pub download_url: String,
    #[serde(default)]
    pub thumbnail: String,
    pub license: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchOutcome {
    pub models: Vec<AssetCandidate>,
    pub total: usize,
    pub query: String,
}

impl SearchOutcome {
    pub fn empty(query: &str) -> Self {
        Self {
            models: Vec::new(),
            total: 0,
            query: query.to_string(),
        }
    }
}

#[async_trait]
pub trait ModelCatalog: Send + Sync {
    /// Search for up to `limit` candidates matching `query`.
    ///
    /// Zero results is a normal outcome, not an error; transport failures
    /// are errors and the caller decides how to degrade.
    async fn search(&self, query: &str, limit: usize) -> Result<SearchOutcome>;
}

/// Live catalog with built-in fallback on error or empty results.
pub struct TieredCatalog {
    live: Box<dyn ModelCatalog>,
    fallback: Box<dyn ModelCatalog>,
}

impl TieredCatalog {
    pub fn new(live: Box<dyn ModelCatalog>, fallback: Box<dyn ModelCatalog>) -> Self {
        Self { live, fallback }
    }
}

#[async_trait]
impl ModelCatalog for TieredCatalog {
    async fn search(&self, query: &str, limit: usize) -> Result<SearchOutcome> {
        match self.live.search(query, limit).await {
            Ok(outcome) if !outcome.models.is_empty() => Ok(outcome),
            Ok(_) => {
                debug!(query, "live catalog returned no results, trying built-in");
                self.fallback.search(query, limit).await
            }
            Err(err) => {
                warn!(query, error = %format!("{err:#}"), "live catalog unavailable, trying built-in");
                self.fallback.search(query, limit).await
            }
        }
    }
}

/// Build the catalog backend selected by config.
pub fn create_catalog(config: &CatalogConfig) -> Result<Arc<dyn ModelCatalog>> {
    match config.backend.as_str() {
        "builtin" => Ok(Arc::new(BuiltinCatalog)),
        "live" => Ok(Arc::new(PolyCatalog::new(&config.base_url, &config.api_key)?)),
        "tiered" => Ok(Arc::new(TieredCatalog::new(
            Box::new(PolyCatalog::new(&config.base_url, &config.api_key)?),
            Box::new(BuiltinCatalog),
        ))),
        other => anyhow::bail!("unknown catalog backend: {}", other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FailingCatalog;

    #[async_trait]
    impl ModelCatalog for FailingCatalog {
        async fn search(&self, _query: &str, _limit: usize) -> Result<SearchOutcome> {
            anyhow::bail!("connection refused")
        }
    }

    struct EmptyCatalog;

    #[async_trait]
    impl ModelCatalog for EmptyCatalog {
        async fn search(&self, query: &str, _limit: usize) -> Result<SearchOutcome> {
            Ok(SearchOutcome::empty(query))
        }
    }

    #[tokio::test]
    async fn tiered_falls_back_when_live_errors() {
        let catalog = TieredCatalog::new(Box::new(FailingCatalog), Box::new(BuiltinCatalog));
        let outcome = catalog.search("fox", 8).await.unwrap();
        assert!(!outcome.models.is_empty());
    }

    #[tokio::test]
    async fn tiered_falls_back_when_live_is_empty() {
        let catalog = TieredCatalog::new(Box::new(EmptyCatalog), Box::new(BuiltinCatalog));
        let outcome = catalog.search("duck", 8).await.unwrap();
        assert!(!outcome.models.is_empty());
    }

    #[test]
    fn create_catalog_rejects_unknown_backend() {
        let config = CatalogConfig {
            backend: "imaginary".to_string(),
            ..CatalogConfig::default()
        };
        assert!(create_catalog(&config).is_err());
    }
}

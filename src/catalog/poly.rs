//! Live model-library backend.
//!
//! Talks to a Poly Pizza-style search API: the keyword goes in the URL
//! path, the page size in a `Limit` query parameter, and the API key in an
//! `x-auth-token` header. The v1.1 wire format is PascalCase; this adapter
//! decodes it tolerantly into canonical [`AssetCandidate`] records so the
//! rest of the pipeline never sees the inconsistent field naming.

use anyhow::Result;
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

use super::{AssetCandidate, ModelCatalog, SearchOutcome};

pub struct PolyCatalog {
    client: Client,
    base_url: String,
    api_key: String,
}

impl PolyCatalog {
    pub fn new(base_url: &str, api_key: &str) -> Result<Self> {
        Ok(Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.trim().to_string(),
        })
    }
}

#[async_trait]
impl ModelCatalog for PolyCatalog {
    async fn search(&self, query: &str, limit: usize) -> Result<SearchOutcome> {
        let normalized = query.to_lowercase();
        let normalized = normalized.trim();
        if self.api_key.is_empty() {
            anyhow::bail!("live catalog API key not configured");
        }

        let url = format!(
            "{}/search/{}?Limit={}",
            self.base_url,
            urlencoding::encode(normalized),
            limit
        );
        debug!(%url, "live catalog search");

        let response = self
            .client
            .get(&url)
            .header("Accept", "application/json")
            .header("x-auth-token", &self.api_key)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!(
                "live catalog returned {}: {}",
                status,
                body.chars().take(200).collect::<String>()
            );
        }

        let wire: WireSearchResponse = response.json().await?;
        Ok(convert(normalized, wire))
    }
}

// -- wire format -------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct WireSearchResponse {
    #[serde(default)]
    results: Vec<WireResult>,
    #[serde(default)]
    count: Option<usize>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct WireResult {
    #[serde(rename = "ID", default)]
    id: String,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    creator: Option<WireCreator>,
    #[serde(default)]
    thumbnail: Option<String>,
    /// Direct GLB download URL. Results without one are unusable.
    #[serde(default)]
    download: Option<String>,
    #[serde(default)]
    category: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct WireCreator {
    #[serde(default)]
    username: Option<String>,
}

fn convert(query: &str, wire: WireSearchResponse) -> SearchOutcome {
    let models: Vec<AssetCandidate> = wire
        .results
        .into_iter()
        .filter_map(|result| {
            let download_url = result.download?;
            Some(AssetCandidate {
                id: result.id,
                title: result.title.unwrap_or_else(|| "Untitled".to_string()),
                author: result
                    .creator
                    .and_then(|c| c.username)
                    .unwrap_or_else(|| "Unknown".to_string()),
                download_url,
                thumbnail: result.thumbnail.unwrap_or_default(),
                license: "CC0".to_string(),
                category: result.category,
            })
        })
        .collect();

    SearchOutcome {
        total: wire.count.unwrap_or(models.len()),
        models,
        query: query.to_string(),
    }
}

//! Free model catalog.
//!
//! Fetches the OpenRouter model list (`/api/v1/models`), keeps the entries
//! whose prompt and completion prices are both zero, and tags the ones whose
//! id or name matches a small keyword list as uncensored.


use crate::config::{Config, DEFAULT_CACHE_TTL_SECS, DEFAULT_MODELS_URL};
use crate::error::FreeChatError;
use crate::http::{create_client_with_timeout, CATALOG_TIMEOUT};
use moka::future::Cache;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

/// Keywords that mark a model as uncensored, matched case-insensitively
/// against the id and the name.
pub const UNCENSORED_KEYWORDS: [&str; 5] = ["uncensored", "venice", "dolphin", "mai", "lumimaid"];

/// Maximum number of characters shown for a model description.
pub const DESCRIPTION_DISPLAY_CHARS: usize = 96;

/// Heuristic model classification.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Classification {
    Text,
    TextUncensored,
}

impl fmt::Display for Classification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Classification::Text => write!(f, "Text"),
            Classification::TextUncensored => write!(f, "Text (uncensored)"),
        }
    }
}

/// A free model from the catalog.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ModelInfo {
    pub id: String,
    pub name: String,
    pub prompt_price: f64,
    pub completion_price: f64,
    pub context_length: Option<u64>,
    pub description: Option<String>,
    pub classification: Classification,
}

impl ModelInfo {
    /// Selection label, e.g. `Dolphin 3.0 – Text (uncensored)`.
    pub fn label(&self) -> String {
        format!("{} – {}", self.name, self.classification)
    }

    /// Description cut to [`DESCRIPTION_DISPLAY_CHARS`] characters, `-` when missing.
    pub fn short_description(&self) -> String {
        match self.description.as_deref().map(str::trim) {
            Some(desc) if !desc.is_empty() => desc.chars().take(DESCRIPTION_DISPLAY_CHARS).collect(),
            _ => "-".to_string(),
        }
    }

    pub fn is_uncensored(&self) -> bool {
        self.classification == Classification::TextUncensored
    }
}

/// Classify a model by keyword match over its id and name.
pub fn classify(id: &str, name: &str) -> Classification {
    let id = id.to_lowercase();
    let name = name.to_lowercase();

    if UNCENSORED_KEYWORDS
        .iter()
        .any(|kw| id.contains(kw) || name.contains(kw))
    {
        Classification::TextUncensored
    } else {
        Classification::Text
    }
}

/// Parse a catalog price.
///
/// OpenRouter sends prices as decimal strings; plain numbers are accepted too.
/// A missing or null price counts as zero. Anything else yields `None`.
pub fn parse_price(value: &Value) -> Option<f64> {
    match value {
        Value::Null => Some(0.0),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        Value::Number(n) => n.as_f64(),
        _ => None,
    }
}

/// Keep the free entries of a raw catalog, in catalog order.
pub fn filter_free_models(entries: &[Value]) -> Vec<ModelInfo> {
    entries.iter().filter_map(free_model_from_entry).collect()
}

fn free_model_from_entry(entry: &Value) -> Option<ModelInfo> {
    let id = entry["id"].as_str()?;
    let pricing = &entry["pricing"];

    let prompt_price = parse_price(&pricing["prompt"])?;
    let completion_price = parse_price(&pricing["completion"])?;
    if prompt_price != 0.0 || completion_price != 0.0 {
        return None;
    }

    let name = entry["name"]
        .as_str()
        .filter(|n| !n.trim().is_empty())
        .unwrap_or(id);

    Some(ModelInfo {
        id: id.to_string(),
        name: name.to_string(),
        prompt_price,
        completion_price,
        context_length: entry["context_length"].as_u64(),
        description: entry["description"].as_str().map(str::to_string),
        classification: classify(id, name),
    })
}

/// Pick a model by 1-based index, exact id, or case-insensitive name.
pub fn find_model<'a>(models: &'a [ModelInfo], selector: &str) -> Result<&'a ModelInfo, FreeChatError> {
    let selector = selector.trim();

    if let Ok(index) = selector.parse::<usize>() {
        if let Some(model) = index.checked_sub(1).and_then(|i| models.get(i)) {
            return Ok(model);
        }
    }

    models
        .iter()
        .find(|m| m.id == selector)
        .or_else(|| models.iter().find(|m| m.name.eq_ignore_ascii_case(selector)))
        .ok_or_else(|| FreeChatError::ModelNotFound(selector.to_string()))
}

/// Result of a catch-and-report catalog load.
#[derive(Debug, Clone)]
pub struct CatalogLoad {
    pub models: Arc<Vec<ModelInfo>>,
    pub error: Option<FreeChatError>,
}

/// Fetches and memoizes the free model list.
#[derive(Clone)]
pub struct ModelCatalog {
    client: Client,
    models_url: String,
    cache: Cache<String, Arc<Vec<ModelInfo>>>,
}

impl ModelCatalog {
    const CACHE_KEY: &'static str = "free_models";

    pub fn new() -> Result<Self, FreeChatError> {
        Ok(Self {
            client: create_client_with_timeout(CATALOG_TIMEOUT)?,
            models_url: DEFAULT_MODELS_URL.to_string(),
            cache: Self::build_cache(DEFAULT_CACHE_TTL_SECS),
        })
    }

    /// Build a catalog from the `[api]` and `[catalog]` config sections.
    pub fn from_config(config: &Config) -> Result<Self, FreeChatError> {
        Ok(Self::new()?
            .with_models_url(&config.api.models_url)
            .with_cache_ttl_secs(config.catalog.cache_ttl_secs))
    }

    pub fn with_models_url(mut self, url: &str) -> Self {
        self.models_url = url.to_string();
        self
    }

    pub fn with_cache_ttl_secs(mut self, secs: u64) -> Self {
        self.cache = Self::build_cache(secs);
        self
    }

    pub fn with_client(mut self, client: Client) -> Self {
        self.client = client;
        self
    }

    fn build_cache(ttl_secs: u64) -> Cache<String, Arc<Vec<ModelInfo>>> {
        Cache::builder()
            .max_capacity(1)
            .time_to_live(Duration::from_secs(ttl_secs))
            .build()
    }

    /// Fetch the catalog once and filter it, bypassing the cache.
    pub async fn fetch(&self) -> Result<Vec<ModelInfo>, FreeChatError> {
        tracing::debug!(url = %self.models_url, "fetching model catalog");

        let response = self
            .client
            .get(&self.models_url)
            .header("Content-Type", "application/json")
            .send()
            .await
            .map_err(|e| FreeChatError::UpstreamError(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FreeChatError::UpstreamStatus {
                status: status.as_u16(),
                message: String::new(),
            });
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| FreeChatError::ParseError(format!("model catalog: {}", e)))?;
        let entries = body["data"].as_array().map(Vec::as_slice).unwrap_or_default();

        let free = filter_free_models(entries);
        tracing::debug!(total = entries.len(), free = free.len(), "catalog filtered");
        Ok(free)
    }

    /// Free models, memoized until the cache TTL expires.
    ///
    /// Failures are not cached, so the next call tries again.
    pub async fn get_free_models(&self, force_refresh: bool) -> Result<Arc<Vec<ModelInfo>>, FreeChatError> {
        if !force_refresh {
            if let Some(cached) = self.cache.get(Self::CACHE_KEY).await {
                return Ok(cached);
            }
        }

        let models = Arc::new(self.fetch().await?);
        self.cache
            .insert(Self::CACHE_KEY.to_string(), Arc::clone(&models))
            .await;
        Ok(models)
    }

    /// Like [`get_free_models`](Self::get_free_models), but a failure becomes
    /// an empty list plus the error to show.
    pub async fn load(&self, force_refresh: bool) -> CatalogLoad {
        match self.get_free_models(force_refresh).await {
            Ok(models) => CatalogLoad { models, error: None },
            Err(e) => {
                tracing::warn!(error = %e, "failed to load model catalog");
                CatalogLoad {
                    models: Arc::new(Vec::new()),
                    error: Some(e),
                }
            }
        }
    }
}

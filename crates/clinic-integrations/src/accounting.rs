//! Accounting system item catalog over HTTP.
//!
//! `GET {base_url}/items` with a bearer token returns a JSON array of
//! `{ "id": ..., "label": ... }`. An expired connection answers 401 or 403.

use std::time::Duration;

use clinic_core::cache::{CatalogError, CatalogItem, ItemCache, ItemCatalogProvider, ScoredItem};
use clinic_core::config::{AccountingConfig, ClinicConfig};
use reqwest::blocking::Client;
use reqwest::StatusCode;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

pub struct HttpItemCatalog {
    http: Client,
    base_url: String,
    token: String,
}

impl HttpItemCatalog {
    pub fn new(base_url: impl Into<String>, token: impl Into<String>) -> Result<Self, CatalogError> {
        let http = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .user_agent(concat!("clinic-integrations/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| CatalogError::Unavailable(format!("client build failed: {}", e)))?;
        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token: token.into(),
        })
    }

    pub fn from_config(config: &AccountingConfig) -> Result<Self, CatalogError> {
        Self::new(config.base_url.clone(), config.token.clone())
    }

    fn items_url(&self) -> String {
        format!("{}/items", self.base_url)
    }
}

impl ItemCatalogProvider for HttpItemCatalog {
    fn fetch_items(&self) -> Result<Vec<CatalogItem>, CatalogError> {
        let url = self.items_url();
        let response = self
            .http
            .get(&url)
            .bearer_auth(&self.token)
            .send()
            .map_err(|e| {
                tracing::warn!(url = %url, error = %e, "item catalog request failed");
                CatalogError::Unavailable(e.to_string())
            })?;

        match response.status() {
            s if s.is_success() => {
                let items: Vec<CatalogItem> = response
                    .json()
                    .map_err(|e| CatalogError::Unavailable(format!("invalid catalog body: {}", e)))?;
                tracing::debug!(count = items.len(), "item catalog fetched");
                Ok(items)
            }
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                tracing::info!(url = %url, "accounting connection expired");
                Err(CatalogError::ReauthRequired)
            }
            s => Err(CatalogError::Unavailable(format!("status {}", s.as_u16()))),
        }
    }
}

/// Item picker backed by the accounting catalog, cached for the configured TTL.
pub struct ItemPicker {
    catalog: HttpItemCatalog,
    cache: ItemCache,
}

impl ItemPicker {
    pub fn new(catalog: HttpItemCatalog, cache: ItemCache) -> Self {
        Self { catalog, cache }
    }

    /// `None` when the config has no `[accounting]` section.
    pub fn from_config(config: &ClinicConfig) -> Result<Option<Self>, CatalogError> {
        let Some(accounting) = &config.accounting else {
            return Ok(None);
        };
        Ok(Some(Self::new(
            HttpItemCatalog::from_config(accounting)?,
            ItemCache::from_config(config),
        )))
    }

    pub fn search(&mut self, query: &str, limit: usize) -> Result<Vec<ScoredItem>, CatalogError> {
        self.cache.search(&self.catalog, query, limit)
    }

    /// Drop cached items, e.g. after the user reconnects the accounting system.
    pub fn invalidate(&mut self) {
        self.cache.invalidate();
    }
}

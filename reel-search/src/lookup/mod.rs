//! Typeahead lookups against named entity services
//!
//! The gateway maps each [`LookupName`] to one [`LookupClient`] and projects
//! the raw response into [`Entity`] values. Lookup failures never reach the
//! caller: they are logged and become an empty suggestion list.

pub mod http;
pub mod projection;
pub mod typeahead;

pub use http::HttpLookupClient;
pub use typeahead::{SuggestionSlot, TypeaheadInput};

use crate::avatar_cache::AvatarCacheKeys;
use crate::error::LookupFailure;
use crate::models::{Entity, LookupName};
use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// One external lookup service
#[async_trait]
pub trait LookupClient: Send + Sync {
    /// Raw response for `text`; projection happens in the gateway
    async fn search(&self, text: &str, page: u32, page_size: u32) -> Result<Value, LookupFailure>;
}

/// Named lookup services plus their fixed response projections
pub struct LookupGateway {
    clients: HashMap<LookupName, Arc<dyn LookupClient>>,
    image_base_url: String,
    avatar_keys: Option<AvatarCacheKeys>,
}

impl LookupGateway {
    pub fn new(image_base_url: impl Into<String>) -> Self {
        Self {
            clients: HashMap::new(),
            image_base_url: image_base_url.into(),
            avatar_keys: None,
        }
    }

    /// Gateway with an HTTP client for every lookup name
    pub fn with_http_clients(
        api_base_url: &str,
        image_base_url: &str,
        timeout: Duration,
    ) -> Result<Self, LookupFailure> {
        let mut gateway = Self::new(image_base_url);
        for name in LookupName::ALL {
            let client = HttpLookupClient::new(api_base_url, name, timeout)?;
            gateway = gateway.register(name, Arc::new(client));
        }
        Ok(gateway)
    }

    pub fn register(mut self, name: LookupName, client: Arc<dyn LookupClient>) -> Self {
        self.clients.insert(name, client);
        self
    }

    /// Version people avatars with the shared cache keys
    pub fn with_avatar_keys(mut self, keys: AvatarCacheKeys) -> Self {
        self.avatar_keys = Some(keys);
        self
    }

    pub fn image_base_url(&self) -> &str {
        &self.image_base_url
    }

    /// Search one lookup service; resolves to an empty list on any failure
    pub async fn search(
        &self,
        name: LookupName,
        query: &str,
        page: u32,
        page_size: u32,
    ) -> Vec<Entity> {
        match self.try_search(name, query, page, page_size).await {
            Ok(entities) => {
                debug!(lookup = %name, query = %query, count = entities.len(), "Lookup complete");
                entities
            }
            Err(e) => {
                warn!(lookup = %name, query = %query, error = %e, "Lookup failed");
                Vec::new()
            }
        }
    }

    async fn try_search(
        &self,
        name: LookupName,
        query: &str,
        page: u32,
        page_size: u32,
    ) -> Result<Vec<Entity>, LookupFailure> {
        let client = self
            .clients
            .get(&name)
            .ok_or_else(|| LookupFailure::Unregistered(name.to_string()))?;

        let raw = client.search(query, page.max(1), page_size.max(1)).await?;
        let mut entities = projection::project(name, &raw, &self.image_base_url)?;

        if let (LookupName::People, Some(keys)) = (name, self.avatar_keys.as_ref()) {
            for entity in &mut entities {
                if let Some(url) = entity.image_url.take() {
                    entity.image_url = Some(keys.url_for(&entity.id, &url));
                }
            }
        }
        Ok(entities)
    }
}

//! HTTP lookup client
//!
//! One client per lookup name; each calls
//! `GET {api_base_url}/{path}?query=..&page=..&pageSize=..` and hands the raw
//! JSON body back to the gateway for projection.

use super::LookupClient;
use crate::error::LookupFailure;
use crate::models::LookupName;
use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

/// Service path for each lookup name
pub fn lookup_path(name: LookupName) -> &'static str {
    match name {
        LookupName::Keyword => "lookup/keywords",
        LookupName::Country => "lookup/countries",
        LookupName::Language => "lookup/languages",
        LookupName::Actor => "lookup/actors",
        LookupName::Director => "lookup/directors",
        LookupName::ProductionCompany => "lookup/companies",
        LookupName::People => "users/lookup",
    }
}

pub struct HttpLookupClient {
    http_client: Client,
    url: String,
    name: LookupName,
}

impl HttpLookupClient {
    pub fn new(api_base_url: &str, name: LookupName, timeout: Duration) -> Result<Self, LookupFailure> {
        let http_client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| LookupFailure::Network(e.to_string()))?;

        Ok(Self {
            http_client,
            url: format!("{}/{}", api_base_url.trim_end_matches('/'), lookup_path(name)),
            name,
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl LookupClient for HttpLookupClient {
    async fn search(&self, text: &str, page: u32, page_size: u32) -> Result<Value, LookupFailure> {
        debug!(lookup = %self.name, url = %self.url, text = %text, "Querying lookup service");

        let response = self
            .http_client
            .get(&self.url)
            .query(&[
                ("query", text.to_string()),
                ("page", page.to_string()),
                ("pageSize", page_size.to_string()),
            ])
            .send()
            .await
            .map_err(|e| LookupFailure::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(LookupFailure::Api(status.as_u16(), body));
        }

        response
            .json::<Value>()
            .await
            .map_err(|e| LookupFailure::Parse(e.to_string()))
    }
}

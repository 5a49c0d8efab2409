//! Search service boundary
//!
//! One service per screen. The HTTP implementation issues
//! `GET {api_base_url}/{endpoint}?...` with array fields comma-joined and
//! decodes the body exactly once into a [`PagedEnvelope`].

use crate::error::{DecodeError, SearchFailure};
use crate::models::{decode_envelope, PagedEnvelope, SearchRequest};
use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

#[async_trait]
pub trait SearchService: Send + Sync {
    async fn search(&self, request: &SearchRequest) -> Result<PagedEnvelope, SearchFailure>;
}

pub struct HttpSearchService {
    http_client: Client,
    url: String,
}

impl HttpSearchService {
    pub fn new(api_base_url: &str, endpoint: &str, timeout: Duration) -> Result<Self, SearchFailure> {
        let http_client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| SearchFailure::Network(e.to_string()))?;

        Ok(Self {
            http_client,
            url: format!(
                "{}/{}",
                api_base_url.trim_end_matches('/'),
                endpoint.trim_start_matches('/')
            ),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl SearchService for HttpSearchService {
    async fn search(&self, request: &SearchRequest) -> Result<PagedEnvelope, SearchFailure> {
        let pairs = query_pairs(request);
        debug!(url = %self.url, request_id = request.request_id, params = ?pairs, "Calling search service");

        let response = self
            .http_client
            .get(&self.url)
            .query(&pairs)
            .send()
            .await
            .map_err(|e| SearchFailure::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SearchFailure::Api(status.as_u16(), body));
        }

        let body = response
            .json::<Value>()
            .await
            .map_err(|e| DecodeError::Shape(e.to_string()))?;
        Ok(decode_envelope(body)?)
    }
}

/// Flatten request params into URL pairs; arrays are comma-joined, nulls dropped
pub fn query_pairs(request: &SearchRequest) -> Vec<(String, String)> {
    request
        .params
        .iter()
        .filter_map(|(key, value)| {
            let text = match value {
                Value::Array(items) => {
                    let parts: Vec<String> = items.iter().filter_map(scalar_text).collect();
                    Some(parts.join(","))
                }
                other => scalar_text(other),
            };
            text.map(|text| (key.clone(), text))
        })
        .collect()
}

fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => match (n.as_i64(), n.as_f64()) {
            (Some(i), _) => Some(i.to_string()),
            (None, Some(f)) => Some(f.to_string()),
            (None, None) => Some(n.to_string()),
        },
        Value::Bool(b) => Some(b.to_string()),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    }
}

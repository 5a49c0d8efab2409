//! Search request and paged response envelope

use crate::error::DecodeError;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// One result row; the shape is screen-specific and opaque to the engine
pub type ResultItem = Value;

/// Request handed to a search service
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchRequest {
    /// Monotonically increasing per screen instance
    pub request_id: u64,
    pub trigger: reel_common::events::TriggerSource,
    pub page: u32,
    pub page_size: u32,
    /// Flattened, null-stripped request fields
    pub params: BTreeMap<String, Value>,
}

/// Uniform paged response shape of every search service
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PagedEnvelope {
    pub data: Vec<ResultItem>,
    pub total_count: u64,
    pub page: Option<u32>,
    pub total_pages: Option<u32>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawEnvelope {
    Paged {
        data: Vec<Value>,
        #[serde(rename = "totalCount", alias = "total_count", default)]
        total_count: Option<u64>,
        #[serde(default)]
        page: Option<u32>,
        #[serde(rename = "totalPages", alias = "total_pages", default)]
        total_pages: Option<u32>,
    },
    Bare(Vec<Value>),
}

/// Decode a raw service response once, at the service boundary
///
/// Accepts a paged envelope object or a bare list of rows; anything else is
/// a [`DecodeError`].
pub fn decode_envelope(raw: Value) -> Result<PagedEnvelope, DecodeError> {
    let kind = match &raw {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    };

    let decoded: RawEnvelope = serde_json::from_value(raw)
        .map_err(|e| DecodeError::Shape(format!("{} ({})", kind, e)))?;

    Ok(match decoded {
        RawEnvelope::Paged {
            data,
            total_count,
            page,
            total_pages,
        } => PagedEnvelope {
            total_count: total_count.unwrap_or(data.len() as u64),
            data,
            page,
            total_pages,
        },
        RawEnvelope::Bare(data) => PagedEnvelope {
            total_count: data.len() as u64,
            data,
            page: None,
            total_pages: None,
        },
    })
}

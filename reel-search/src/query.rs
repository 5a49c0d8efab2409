//! URL query parameter mapping for filter values
//!
//! Used for deep links and for keeping the address bar in step with the last
//! fired search. Only identifiers travel in the URL: a decoded entity has its
//! id as name and no description.

use crate::filters::{is_active, FilterSet, FilterValues};
use crate::models::{Entity, FilterSpec, FilterValue, RangeValue};
use crate::screens::{ScreenProfile, URL_PAGE_KEY, URL_QUERY_KEY};
use std::collections::HashMap;
use tracing::warn;
use url::form_urlencoded;

/// Query text, page and filters read back from a URL
#[derive(Debug, Clone, PartialEq)]
pub struct Location {
    pub query_text: String,
    pub page: u32,
    pub filters: FilterValues,
}

/// `key=value` pairs for every active filter, in spec order
pub fn to_pairs(values: &FilterValues, specs: &FilterSet) -> Vec<(String, String)> {
    specs
        .iter()
        .filter_map(|spec| {
            let value = values.value_or_default(spec);
            if !is_active(spec, value) {
                return None;
            }
            encode_value(value).map(|encoded| (spec.key.clone(), encoded))
        })
        .collect()
}

/// Encoded query string (no leading `?`) for the active filters
pub fn to_query(values: &FilterValues, specs: &FilterSet) -> String {
    let mut serializer = form_urlencoded::Serializer::new(String::new());
    for (key, value) in to_pairs(values, specs) {
        serializer.append_pair(&key, &value);
    }
    serializer.finish()
}

/// Filter values from a query string; absent or unreadable filters get defaults
pub fn from_query(query: &str, specs: &FilterSet) -> FilterValues {
    let params = parse_params(query);
    let mut values = specs.defaults();

    for spec in specs.iter() {
        if let Some(raw) = params.get(&spec.key) {
            match decode_value(spec, raw) {
                Some(value) => values.set(&spec.key, spec.normalize(value)),
                None => warn!(key = %spec.key, raw = %raw, "Unreadable URL filter value, using default"),
            }
        }
    }

    values
}

/// Query string for the full location: query text, page (when > 1) and filters
pub fn encode_location(
    query_text: &str,
    page: u32,
    values: &FilterValues,
    profile: &ScreenProfile,
) -> String {
    let mut serializer = form_urlencoded::Serializer::new(String::new());
    let trimmed = query_text.trim();
    if !trimmed.is_empty() {
        serializer.append_pair(URL_QUERY_KEY, trimmed);
    }
    if page > 1 {
        serializer.append_pair(URL_PAGE_KEY, &page.to_string());
    }
    for (key, value) in to_pairs(values, &profile.filters) {
        serializer.append_pair(&key, &value);
    }
    serializer.finish()
}

pub fn decode_location(query: &str, profile: &ScreenProfile) -> Location {
    let params = parse_params(query);
    let page = params
        .get(URL_PAGE_KEY)
        .and_then(|p| p.parse::<u32>().ok())
        .filter(|p| *p >= 1)
        .unwrap_or(1);

    Location {
        query_text: params.get(URL_QUERY_KEY).cloned().unwrap_or_default(),
        page,
        filters: from_query(query, &profile.filters),
    }
}

fn parse_params(query: &str) -> HashMap<String, String> {
    let query = query.strip_prefix('?').unwrap_or(query);
    form_urlencoded::parse(query.as_bytes())
        .into_owned()
        .collect()
}

fn encode_value(value: &FilterValue) -> Option<String> {
    match value {
        FilterValue::Text(text) => Some(text.clone()),
        FilterValue::Select(choice) => Some(choice.clone().unwrap_or_default()),
        FilterValue::Multiselect(items) => Some(items.join(",")),
        FilterValue::Range(range) => Some(format!("{},{}", range.lo(), range.hi())),
        FilterValue::Entity(entity) => entity.as_ref().map(|e| e.id.clone()),
        FilterValue::Entities(entities) => Some(
            entities
                .iter()
                .map(|e| e.id.as_str())
                .collect::<Vec<_>>()
                .join(","),
        ),
    }
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

fn decode_value(spec: &FilterSpec, raw: &str) -> Option<FilterValue> {
    match &spec.default_value {
        FilterValue::Text(_) => Some(FilterValue::Text(raw.to_string())),
        FilterValue::Select(_) => Some(FilterValue::Select(
            Some(raw.to_string()).filter(|s| !s.is_empty()),
        )),
        FilterValue::Multiselect(_) => Some(FilterValue::Multiselect(split_list(raw))),
        FilterValue::Range(_) => {
            let mut parts = raw.split(',').map(|p| p.trim().parse::<f64>());
            match (parts.next(), parts.next(), parts.next()) {
                (Some(Ok(lo)), Some(Ok(hi)), None) if lo.is_finite() && hi.is_finite() => {
                    Some(FilterValue::Range(RangeValue::new(lo, hi)))
                }
                _ => None,
            }
        }
        FilterValue::Entity(_) => {
            let id = raw.trim();
            Some(FilterValue::Entity(
                (!id.is_empty()).then(|| Entity::from_id(id)),
            ))
        }
        FilterValue::Entities(_) => Some(FilterValue::Entities(
            split_list(raw).into_iter().map(Entity::from_id).collect(),
        )),
    }
}

//! Filter descriptors and filter values

use crate::models::Entity;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Filter kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FilterKind {
    Text,
    Select,
    Multiselect,
    Range,
    DynamicLookup,
}

impl fmt::Display for FilterKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FilterKind::Text => "text",
            FilterKind::Select => "select",
            FilterKind::Multiselect => "multiselect",
            FilterKind::Range => "range",
            FilterKind::DynamicLookup => "dynamicLookup",
        };
        f.write_str(name)
    }
}

/// How many entities a dynamic lookup filter holds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Cardinality {
    Single,
    Multi,
}

/// Named entity lookup services
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum LookupName {
    Keyword,
    Country,
    Language,
    Actor,
    Director,
    ProductionCompany,
    People,
}

impl LookupName {
    pub const ALL: [LookupName; 7] = [
        LookupName::Keyword,
        LookupName::Country,
        LookupName::Language,
        LookupName::Actor,
        LookupName::Director,
        LookupName::ProductionCompany,
        LookupName::People,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            LookupName::Keyword => "keyword",
            LookupName::Country => "country",
            LookupName::Language => "language",
            LookupName::Actor => "actor",
            LookupName::Director => "director",
            LookupName::ProductionCompany => "productionCompany",
            LookupName::People => "people",
        }
    }
}

impl fmt::Display for LookupName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LookupName {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "keyword" | "keywords" => Ok(LookupName::Keyword),
            "country" => Ok(LookupName::Country),
            "language" => Ok(LookupName::Language),
            "actor" => Ok(LookupName::Actor),
            "director" => Ok(LookupName::Director),
            "productionCompany" | "production-company" | "company" => {
                Ok(LookupName::ProductionCompany)
            }
            "people" | "person" | "user" => Ok(LookupName::People),
            other => Err(format!("unknown lookup: {}", other)),
        }
    }
}

/// Which entity field a search request carries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum EntityParam {
    Id,
    Name,
}

/// Dynamic lookup configuration of a filter
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LookupBinding {
    pub name: LookupName,
    pub cardinality: Cardinality,
    pub request_field: EntityParam,
}

/// Numeric `[lo, hi]` pair with `lo <= hi`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RangeValue {
    lo: f64,
    hi: f64,
}

impl RangeValue {
    /// Build a range, swapping a reversed pair
    pub fn new(lo: f64, hi: f64) -> Self {
        if lo <= hi {
            Self { lo, hi }
        } else {
            Self { lo: hi, hi: lo }
        }
    }

    pub fn lo(&self) -> f64 {
        self.lo
    }

    pub fn hi(&self) -> f64 {
        self.hi
    }

    /// Clamp both ends into `[min, max]`
    pub fn clamped(&self, min: f64, max: f64) -> Self {
        Self::new(self.lo.clamp(min, max), self.hi.clamp(min, max))
    }
}

/// Current value of one filter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "camelCase")]
pub enum FilterValue {
    Text(String),
    Select(Option<String>),
    Multiselect(Vec<String>),
    Range(RangeValue),
    /// Single-cardinality lookup
    Entity(Option<Entity>),
    /// Multi-cardinality lookup, ordered, unique by id
    Entities(Vec<Entity>),
}

impl FilterValue {
    /// Whether this value can be bound to `spec`
    pub fn fits(&self, spec: &FilterSpec) -> bool {
        match (self, spec.kind, spec.lookup.as_ref().map(|l| l.cardinality)) {
            (FilterValue::Text(_), FilterKind::Text, _) => true,
            (FilterValue::Select(_), FilterKind::Select, _) => true,
            (FilterValue::Multiselect(_), FilterKind::Multiselect, _) => true,
            (FilterValue::Range(_), FilterKind::Range, _) => true,
            (FilterValue::Entity(_), FilterKind::DynamicLookup, Some(Cardinality::Single)) => true,
            (FilterValue::Entities(_), FilterKind::DynamicLookup, Some(Cardinality::Multi)) => true,
            _ => false,
        }
    }

    /// Selected entities, for lookup values
    pub fn entities(&self) -> Vec<&Entity> {
        match self {
            FilterValue::Entity(Some(entity)) => vec![entity],
            FilterValue::Entities(entities) => entities.iter().collect(),
            _ => Vec::new(),
        }
    }
}

/// Static descriptor of one search facet
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterSpec {
    /// Unique id within a screen; also the URL parameter name
    pub key: String,
    pub label: String,
    /// Search request field name
    pub param: String,
    pub kind: FilterKind,
    pub default_value: FilterValue,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lookup: Option<LookupBinding>,
    /// `(min, max)` for range filters
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bounds: Option<(f64, f64)>,
    /// Offered options for select/multiselect filters (informational)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<String>,
}

impl FilterSpec {
    fn base(key: &str, label: &str, kind: FilterKind, default_value: FilterValue) -> Self {
        Self {
            key: key.to_string(),
            label: label.to_string(),
            param: key.to_string(),
            kind,
            default_value,
            lookup: None,
            bounds: None,
            options: Vec::new(),
        }
    }

    pub fn text(key: &str, label: &str) -> Self {
        Self::base(key, label, FilterKind::Text, FilterValue::Text(String::new()))
    }

    pub fn select(key: &str, label: &str, default: Option<&str>) -> Self {
        Self::base(
            key,
            label,
            FilterKind::Select,
            FilterValue::Select(default.map(str::to_string)),
        )
    }

    pub fn multiselect(key: &str, label: &str) -> Self {
        Self::base(key, label, FilterKind::Multiselect, FilterValue::Multiselect(Vec::new()))
    }

    /// Range filter whose default spans the full `[min, max]`
    pub fn range(key: &str, label: &str, min: f64, max: f64) -> Self {
        let mut spec = Self::base(
            key,
            label,
            FilterKind::Range,
            FilterValue::Range(RangeValue::new(min, max)),
        );
        spec.bounds = Some((min, max));
        spec
    }

    pub fn lookup(key: &str, label: &str, name: LookupName, cardinality: Cardinality) -> Self {
        let default_value = match cardinality {
            Cardinality::Single => FilterValue::Entity(None),
            Cardinality::Multi => FilterValue::Entities(Vec::new()),
        };
        let mut spec = Self::base(key, label, FilterKind::DynamicLookup, default_value);
        spec.lookup = Some(LookupBinding {
            name,
            cardinality,
            request_field: EntityParam::Id,
        });
        spec
    }

    /// Use a different search request field name than the key
    pub fn with_param(mut self, param: &str) -> Self {
        self.param = param.to_string();
        self
    }

    pub fn with_options(mut self, options: &[&str]) -> Self {
        self.options = options.iter().map(|o| o.to_string()).collect();
        self
    }

    /// Send entity names rather than ids in search requests
    pub fn send_entity_names(mut self) -> Self {
        if let Some(lookup) = self.lookup.as_mut() {
            lookup.request_field = EntityParam::Name;
        }
        self
    }

    /// Bring a value into the filter's domain
    ///
    /// Ranges are clamped into the declared bounds and lookup lists are
    /// de-duplicated by id (first occurrence wins).
    pub fn normalize(&self, value: FilterValue) -> FilterValue {
        match value {
            FilterValue::Range(range) => match self.bounds {
                Some((min, max)) => FilterValue::Range(range.clamped(min, max)),
                None => FilterValue::Range(range),
            },
            FilterValue::Entities(entities) => {
                let mut unique: Vec<Entity> = Vec::with_capacity(entities.len());
                for entity in entities {
                    if !unique.iter().any(|e| e.same_id(&entity)) {
                        unique.push(entity);
                    }
                }
                FilterValue::Entities(unique)
            }
            other => other,
        }
    }
}

//! Filter model: spec sets, current values, and active-value semantics
//!
//! A filter is *active* when its value differs from the filter default. The
//! OR over all filters decides whether an empty query may still search.

use crate::error::FilterSpecError;
use crate::models::{FilterKind, FilterSpec, FilterValue};
use crate::screens::{URL_PAGE_KEY, URL_QUERY_KEY};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use tracing::debug;

/// Validated, immutable set of filter specs for one screen
#[derive(Debug, Clone, PartialEq)]
pub struct FilterSet {
    specs: Vec<FilterSpec>,
}

impl FilterSet {
    /// Validate key uniqueness and default/kind agreement
    ///
    /// Keys must not collide with the URL's query and page parameters.
    pub fn new(specs: Vec<FilterSpec>) -> Result<Self, FilterSpecError> {
        let mut seen = HashSet::new();
        for spec in &specs {
            if spec.key == URL_QUERY_KEY || spec.key == URL_PAGE_KEY {
                return Err(FilterSpecError::ReservedKey(spec.key.clone()));
            }
            if !seen.insert(spec.key.as_str()) {
                return Err(FilterSpecError::DuplicateKey(spec.key.clone()));
            }
            if !spec.default_value.fits(spec) {
                return Err(FilterSpecError::DefaultKindMismatch {
                    key: spec.key.clone(),
                    kind: spec.kind.to_string(),
                });
            }
            if spec.kind == FilterKind::Range {
                match (spec.bounds, &spec.default_value) {
                    (Some((min, max)), FilterValue::Range(range))
                        if min <= max && range.lo() >= min && range.hi() <= max => {}
                    _ => return Err(FilterSpecError::InvalidRange(spec.key.clone())),
                }
            }
            if spec.kind == FilterKind::DynamicLookup && spec.lookup.is_none() {
                return Err(FilterSpecError::NotALookup(spec.key.clone()));
            }
        }
        Ok(Self { specs })
    }

    pub fn get(&self, key: &str) -> Option<&FilterSpec> {
        self.specs.iter().find(|s| s.key == key)
    }

    pub fn iter(&self) -> impl Iterator<Item = &FilterSpec> {
        self.specs.iter()
    }

    pub fn len(&self) -> usize {
        self.specs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.specs.is_empty()
    }

    /// Fresh values: every filter at its default
    pub fn defaults(&self) -> FilterValues {
        let mut values = FilterValues::default();
        for spec in &self.specs {
            values.set(&spec.key, spec.default_value.clone());
        }
        values
    }

    /// Defaults overlaid with whichever `partial` entries fit a spec
    pub fn merge_onto_defaults(&self, partial: &FilterValues) -> FilterValues {
        let mut values = self.defaults();
        for (key, value) in partial.iter() {
            match self.get(key) {
                Some(spec) if value.fits(spec) => values.set(key, spec.normalize(value.clone())),
                Some(_) => debug!(key = %key, "Ignoring filter value of the wrong kind"),
                None => debug!(key = %key, "Ignoring value for unknown filter"),
            }
        }
        values
    }

    pub fn has_any_active(&self, values: &FilterValues) -> bool {
        has_any_active_filter(self, values)
    }
}

/// Current filter values keyed by spec key
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FilterValues(BTreeMap<String, FilterValue>);

impl FilterValues {
    pub fn get(&self, key: &str) -> Option<&FilterValue> {
        self.0.get(key)
    }

    /// The bound value, or the filter default when unbound
    pub fn value_or_default<'a>(&'a self, spec: &'a FilterSpec) -> &'a FilterValue {
        self.0.get(&spec.key).unwrap_or(&spec.default_value)
    }

    pub fn set(&mut self, key: &str, value: FilterValue) {
        self.0.insert(key.to_string(), value);
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &FilterValue)> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Synchronous receiver of filter edits
///
/// Implementations must apply the edit and return; they never start a search.
pub trait ChangeSink {
    fn on_change(&mut self, key: &str, value: FilterValue);
}

impl ChangeSink for FilterValues {
    fn on_change(&mut self, key: &str, value: FilterValue) {
        self.set(key, value);
    }
}

impl<F> ChangeSink for F
where
    F: FnMut(&str, FilterValue),
{
    fn on_change(&mut self, key: &str, value: FilterValue) {
        self(key, value)
    }
}

/// Whether `value` differs from the filter default
///
/// - ranges compare both ends against the declared `[min, max]`
/// - lists compare by length against the (empty) default
/// - selects and text compare strictly; a select defaulting to none is only
///   active once a concrete option is chosen
/// - single lookups are active when something is selected
///
/// A value of the wrong kind is treated as inactive.
pub fn is_active(spec: &FilterSpec, value: &FilterValue) -> bool {
    match (&spec.default_value, value) {
        (FilterValue::Text(default), FilterValue::Text(current)) => current != default,
        (FilterValue::Select(None), FilterValue::Select(current)) => current.is_some(),
        (FilterValue::Select(default), FilterValue::Select(current)) => current != default,
        (FilterValue::Multiselect(default), FilterValue::Multiselect(current)) => {
            current.len() != default.len()
        }
        (FilterValue::Range(default), FilterValue::Range(current)) => {
            let (min, max) = spec.bounds.unwrap_or((default.lo(), default.hi()));
            current.lo() != min || current.hi() != max
        }
        (FilterValue::Entity(_), FilterValue::Entity(current)) => current.is_some(),
        (FilterValue::Entities(default), FilterValue::Entities(current)) => {
            current.len() != default.len()
        }
        _ => {
            debug!(key = %spec.key, "Filter value kind does not match spec");
            false
        }
    }
}

/// OR of [`is_active`] over every spec; unbound filters count as default
pub fn has_any_active_filter(specs: &FilterSet, values: &FilterValues) -> bool {
    specs
        .iter()
        .any(|spec| is_active(spec, values.value_or_default(spec)))
}

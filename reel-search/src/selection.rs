//! Selection semantics for dynamic lookup filters
//!
//! Single filters replace (re-selecting is a no-op); multi filters toggle by
//! id. Every change is pushed through a [`ChangeSink`] and never starts a
//! search by itself.

use crate::error::FilterSpecError;
use crate::filters::ChangeSink;
use crate::lookup::TypeaheadInput;
use crate::models::{Cardinality, Entity, FilterSpec, FilterValue, LookupName};
use tracing::debug;

pub struct FilterSelectionController {
    key: String,
    lookup: LookupName,
    cardinality: Cardinality,
    value: FilterValue,
    typeahead: Option<TypeaheadInput>,
}

impl FilterSelectionController {
    pub fn new(spec: &FilterSpec) -> Result<Self, FilterSpecError> {
        let binding = spec
            .lookup
            .as_ref()
            .ok_or_else(|| FilterSpecError::NotALookup(spec.key.clone()))?;

        Ok(Self {
            key: spec.key.clone(),
            lookup: binding.name,
            cardinality: binding.cardinality,
            value: spec.default_value.clone(),
            typeahead: None,
        })
    }

    pub fn with_typeahead(mut self, input: TypeaheadInput) -> Self {
        self.typeahead = Some(input);
        self
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn lookup(&self) -> LookupName {
        self.lookup
    }

    pub fn value(&self) -> &FilterValue {
        &self.value
    }

    pub fn selected(&self) -> Vec<&Entity> {
        self.value.entities()
    }

    /// Adopt a value set elsewhere (restoration, URL) without notifying
    pub fn sync_from(&mut self, value: &FilterValue) {
        let fits = matches!(
            (self.cardinality, value),
            (Cardinality::Single, FilterValue::Entity(_))
                | (Cardinality::Multi, FilterValue::Entities(_))
        );
        if fits {
            self.value = value.clone();
        } else {
            debug!(key = %self.key, "Ignoring value of the wrong kind");
        }
    }

    /// Select an entity (single: replace, multi: toggle)
    pub fn select<S: ChangeSink + ?Sized>(&mut self, entity: Entity, sink: &mut S) {
        let next = match (&self.value, self.cardinality) {
            (FilterValue::Entity(Some(current)), Cardinality::Single) if current.same_id(&entity) => {
                return;
            }
            (_, Cardinality::Single) => FilterValue::Entity(Some(entity)),
            (FilterValue::Entities(current), Cardinality::Multi) => {
                let mut next = current.clone();
                match next.iter().position(|e| e.same_id(&entity)) {
                    Some(index) => {
                        next.remove(index);
                    }
                    None => next.push(entity),
                }
                FilterValue::Entities(next)
            }
            (_, Cardinality::Multi) => FilterValue::Entities(vec![entity]),
        };
        self.commit(next, sink);
    }

    pub fn clear<S: ChangeSink + ?Sized>(&mut self, sink: &mut S) {
        let cleared = match self.cardinality {
            Cardinality::Single => FilterValue::Entity(None),
            Cardinality::Multi => FilterValue::Entities(Vec::new()),
        };
        self.commit(cleared, sink);
    }

    /// Apply the stale-selection rule to typed text
    ///
    /// The selection is cleared when the typed text and the selected name(s)
    /// are unrelated (neither contains the other, case-insensitively).
    /// Returns whether the selection was cleared.
    pub fn on_text_input<S: ChangeSink + ?Sized>(&mut self, text: &str, sink: &mut S) -> bool {
        let selected = self.selected();
        if selected.is_empty() {
            return false;
        }

        let typed = text.trim().to_lowercase();
        let related = selected.iter().any(|entity| {
            let name = entity.name.to_lowercase();
            name.contains(&typed) || typed.contains(&name)
        });
        if related {
            return false;
        }

        debug!(key = %self.key, text = %text, "Typed text no longer matches selection, clearing");
        self.clear(sink);
        true
    }

    /// Typed text: apply the stale-selection rule, then feed the typeahead
    pub async fn type_text<S: ChangeSink + ?Sized>(&mut self, text: &str, sink: &mut S) {
        self.on_text_input(text, sink);
        if let Some(input) = self.typeahead.as_mut() {
            input.on_keystroke(text).await;
        }
    }

    pub async fn suggestions(&self) -> Vec<Entity> {
        match self.typeahead.as_ref() {
            Some(input) => input.suggestions().await,
            None => Vec::new(),
        }
    }

    /// Wait for the pending typeahead lookup
    pub async fn settle(&mut self) {
        if let Some(input) = self.typeahead.as_mut() {
            input.settle().await;
        }
    }

    fn commit<S: ChangeSink + ?Sized>(&mut self, value: FilterValue, sink: &mut S) {
        self.value = value.clone();
        sink.on_change(&self.key, value);
    }
}

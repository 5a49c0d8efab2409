//! Filter model tests
//!
//! Spec set validation, active-value semantics and the built-in screens.

mod helpers;

use helpers::movie_profile;
use reel_search::error::FilterSpecError;
use reel_search::filters::{has_any_active_filter, is_active, FilterSet, FilterValues};
use reel_search::models::{Cardinality, Entity, FilterSpec, FilterValue, LookupName, RangeValue};
use reel_search::{ScreenKind, ScreenProfile};

// ============================================================================
// Validation
// ============================================================================

#[test]
fn test_duplicate_keys_are_rejected() {
    let result = FilterSet::new(vec![
        FilterSpec::text("tag", "Tag"),
        FilterSpec::multiselect("tag", "Tags"),
    ]);
    assert_eq!(result.unwrap_err(), FilterSpecError::DuplicateKey("tag".to_string()));
}

#[test]
fn test_url_parameter_keys_are_reserved() {
    for key in ["q", "page"] {
        let result = FilterSet::new(vec![FilterSpec::text(key, "Clashing")]);
        assert_eq!(result.unwrap_err(), FilterSpecError::ReservedKey(key.to_string()));
    }
}

#[test]
fn test_default_of_wrong_kind_is_rejected() {
    let mut spec = FilterSpec::multiselect("genres", "Genres");
    spec.default_value = FilterValue::Text(String::new());

    assert!(matches!(
        FilterSet::new(vec![spec]),
        Err(FilterSpecError::DefaultKindMismatch { key, .. }) if key == "genres"
    ));
}

#[test]
fn test_inverted_range_bounds_are_rejected() {
    let result = FilterSet::new(vec![FilterSpec::range("year", "Year", 2030.0, 1900.0)]);
    assert_eq!(result.unwrap_err(), FilterSpecError::InvalidRange("year".to_string()));
}

#[test]
fn test_single_lookup_rejects_list_default() {
    let mut spec = FilterSpec::lookup("actor", "Actor", LookupName::Actor, Cardinality::Single);
    spec.default_value = FilterValue::Entities(Vec::new());
    assert!(FilterSet::new(vec![spec]).is_err());
}

// ============================================================================
// Active semantics
// ============================================================================

#[test]
fn test_range_is_active_only_when_narrowed() {
    let spec = FilterSpec::range("year", "Year", 1900.0, 2030.0);

    assert!(!is_active(&spec, &FilterValue::Range(RangeValue::new(1900.0, 2030.0))));
    assert!(is_active(&spec, &FilterValue::Range(RangeValue::new(1900.0, 2000.0))));
    assert!(is_active(&spec, &FilterValue::Range(RangeValue::new(1950.0, 2030.0))));
}

#[test]
fn test_lists_compare_by_length() {
    let genres = FilterSpec::multiselect("genres", "Genres");
    assert!(!is_active(&genres, &FilterValue::Multiselect(Vec::new())));
    assert!(is_active(&genres, &FilterValue::Multiselect(vec!["Drama".to_string()])));

    let keywords = FilterSpec::lookup("keywords", "Keywords", LookupName::Keyword, Cardinality::Multi);
    assert!(!is_active(&keywords, &FilterValue::Entities(Vec::new())));
    assert!(is_active(&keywords, &FilterValue::Entities(vec![Entity::new("1", "heist")])));
}

#[test]
fn test_null_default_select_needs_a_concrete_option() {
    let category = FilterSpec::select("category", "Category", None);
    assert!(!is_active(&category, &FilterValue::Select(None)));
    assert!(is_active(&category, &FilterValue::Select(Some("reviews".to_string()))));

    let sort = FilterSpec::select("sortBy", "Sort by", Some("popularity"));
    assert!(!is_active(&sort, &FilterValue::Select(Some("popularity".to_string()))));
    assert!(is_active(&sort, &FilterValue::Select(Some("rating".to_string()))));
    assert!(is_active(&sort, &FilterValue::Select(None)));
}

#[test]
fn test_text_and_single_lookup() {
    let tag = FilterSpec::text("tag", "Tag");
    assert!(!is_active(&tag, &FilterValue::Text(String::new())));
    assert!(is_active(&tag, &FilterValue::Text("noir".to_string())));

    let actor = FilterSpec::lookup("actor", "Actor", LookupName::Actor, Cardinality::Single);
    assert!(!is_active(&actor, &FilterValue::Entity(None)));
    assert!(is_active(&actor, &FilterValue::Entity(Some(Entity::new("6384", "Keanu Reeves")))));
}

#[test]
fn test_value_of_wrong_kind_is_inactive() {
    let genres = FilterSpec::multiselect("genres", "Genres");
    assert!(!is_active(&genres, &FilterValue::Text("Drama".to_string())));
}

#[test]
fn test_any_active_treats_unbound_as_default() {
    let profile = movie_profile();
    assert!(!has_any_active_filter(&profile.filters, &FilterValues::default()));
    assert!(!profile.filters.has_any_active(&profile.filters.defaults()));

    let mut values = FilterValues::default();
    values.set("rating", FilterValue::Range(RangeValue::new(8.0, 10.0)));
    assert!(has_any_active_filter(&profile.filters, &values));
}

#[test]
fn test_merge_onto_defaults_drops_unknown_and_mismatched() {
    let profile = movie_profile();
    let mut partial = FilterValues::default();
    partial.set("genres", FilterValue::Multiselect(vec!["Drama".to_string()]));
    partial.set("year", FilterValue::Text("1999".to_string()));
    partial.set("mood", FilterValue::Text("happy".to_string()));

    let merged = profile.filters.merge_onto_defaults(&partial);

    assert_eq!(merged.len(), profile.filters.len());
    assert_eq!(
        merged.get("genres"),
        Some(&FilterValue::Multiselect(vec!["Drama".to_string()]))
    );
    assert_eq!(merged.get("year"), profile.filters.defaults().get("year"));
    assert!(merged.get("mood").is_none());
}

// ============================================================================
// Built-in screens
// ============================================================================

#[test]
fn test_builtin_screens_start_inactive() {
    for kind in [ScreenKind::Movie, ScreenKind::News, ScreenKind::User, ScreenKind::Admin] {
        let profile = ScreenProfile::for_kind(kind).unwrap();
        assert!(
            !profile.filters.has_any_active(&profile.filters.defaults()),
            "{} starts with an active filter",
            kind
        );
    }
}

#[test]
fn test_screen_paging_and_endpoints() {
    let news = ScreenProfile::news().unwrap();
    assert_eq!(news.page_size, 12);
    assert_eq!(news.endpoint, "news/search");
    assert_eq!(news.filters.get("author").unwrap().param, "authorId");

    let admin = ScreenProfile::admin().unwrap();
    assert_eq!(admin.page_size, 25);
    assert_eq!(admin.query_param, "query");
}

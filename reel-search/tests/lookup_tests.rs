//! Lookup gateway and typeahead tests
//!
//! Debounce timing runs on tokio's paused clock.

mod helpers;

use async_trait::async_trait;
use helpers::{actor_body, ScriptedLookupClient};
use reel_search::avatar_cache::AvatarCacheKeys;
use reel_search::error::LookupFailure;
use reel_search::lookup::{LookupClient, LookupGateway, TypeaheadInput};
use reel_search::models::LookupName;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;

const IMAGE_BASE: &str = "https://image.tmdb.org/t/p/w185";
const DEBOUNCE: Duration = Duration::from_millis(500);

fn actor_gateway(client: Arc<ScriptedLookupClient>) -> Arc<LookupGateway> {
    Arc::new(LookupGateway::new(IMAGE_BASE).register(LookupName::Actor, client))
}

// ============================================================================
// Gateway
// ============================================================================

#[tokio::test]
async fn test_actor_projection_completes_profile_path() {
    let client = ScriptedLookupClient::new();
    client.respond("keanu", actor_body());
    let gateway = actor_gateway(client);

    let entities = gateway.search(LookupName::Actor, "keanu", 1, 10).await;

    assert_eq!(entities.len(), 2);
    assert_eq!(entities[0].id, "6384");
    assert_eq!(entities[0].name, "Keanu Reeves");
    assert_eq!(entities[0].description, "Acting");
    assert_eq!(
        entities[0].image_url.as_deref(),
        Some("https://image.tmdb.org/t/p/w185/keanu.jpg")
    );
    assert_eq!(entities[1].image_url, None);
}

#[tokio::test]
async fn test_country_and_language_use_iso_codes() {
    let countries = ScriptedLookupClient::new();
    countries.respond(
        "fr",
        json!([{"iso_3166_1": "FR", "english_name": "France", "native_name": "France"}]),
    );
    let languages = ScriptedLookupClient::new();
    languages.respond(
        "ja",
        json!({"results": [{"iso_639_1": "ja", "english_name": "Japanese", "name": "日本語"}]}),
    );
    let gateway = LookupGateway::new(IMAGE_BASE)
        .register(LookupName::Country, countries)
        .register(LookupName::Language, languages);

    let country = gateway.search(LookupName::Country, "fr", 1, 10).await;
    let language = gateway.search(LookupName::Language, "ja", 1, 10).await;

    assert_eq!(country[0].id, "FR");
    assert_eq!(country[0].name, "France");
    assert_eq!(language[0].id, "ja");
    assert_eq!(language[0].description, "日本語");
}

#[tokio::test]
async fn test_people_projection_prefers_display_name() {
    let client = ScriptedLookupClient::new();
    client.respond(
        "neo",
        json!({"data": [
            {"id": "u1", "username": "neo", "displayName": "Thomas Anderson", "avatarUrl": "https://cdn/neo.png"},
            {"id": "u2", "username": "trinity", "displayName": ""}
        ]}),
    );
    let keys = AvatarCacheKeys::new();
    let key = keys.bump("u1");
    let gateway = LookupGateway::new(IMAGE_BASE)
        .register(LookupName::People, client)
        .with_avatar_keys(keys);

    let people = gateway.search(LookupName::People, "neo", 1, 10).await;

    assert_eq!(people[0].name, "Thomas Anderson");
    assert_eq!(people[0].description, "@neo");
    assert_eq!(
        people[0].image_url.as_deref(),
        Some(format!("https://cdn/neo.png?v={}", key).as_str())
    );
    assert_eq!(people[1].name, "trinity");
    assert_eq!(people[1].image_url, None);
}

#[tokio::test]
async fn test_failures_resolve_to_empty_list() {
    let client = ScriptedLookupClient::new();
    client.fail();
    let gateway = actor_gateway(client.clone());

    assert!(gateway.search(LookupName::Actor, "keanu", 1, 10).await.is_empty());
    assert_eq!(client.calls(), vec!["keanu".to_string()]);

    // no client registered for keywords
    assert!(gateway.search(LookupName::Keyword, "heist", 1, 10).await.is_empty());
}

#[tokio::test]
async fn test_unexpected_shape_resolves_to_empty_list() {
    let client = ScriptedLookupClient::new();
    client.respond("keanu", json!({"message": "rate limited"}));
    let gateway = actor_gateway(client);

    assert!(gateway.search(LookupName::Actor, "keanu", 1, 10).await.is_empty());
}

// ============================================================================
// Typeahead
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_rapid_keystrokes_issue_one_lookup() {
    // Given: A debounced actor input
    let client = ScriptedLookupClient::new();
    client.respond("keanu", actor_body());
    let mut input = TypeaheadInput::new(actor_gateway(client.clone()), LookupName::Actor, DEBOUNCE, 10);

    // When: Typing faster than the debounce window
    for text in ["k", "ke", "kea", "kean", "keanu"] {
        input.on_keystroke(text).await;
        tokio::time::sleep(Duration::from_millis(100)).await;
    }
    input.settle().await;

    // Then: Only the final text reached the service
    assert_eq!(client.calls(), vec!["keanu".to_string()]);
    assert_eq!(input.suggestions().await.len(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_nothing_is_sent_before_debounce_elapses() {
    let client = ScriptedLookupClient::new();
    let mut input = TypeaheadInput::new(actor_gateway(client.clone()), LookupName::Actor, DEBOUNCE, 10);

    input.on_keystroke("keanu").await;
    tokio::time::sleep(Duration::from_millis(400)).await;
    assert!(client.calls().is_empty());

    tokio::time::sleep(Duration::from_millis(200)).await;
    assert_eq!(client.calls(), vec!["keanu".to_string()]);
}

#[tokio::test(start_paused = true)]
async fn test_slow_earlier_lookup_never_overwrites_later_one() {
    // Given: "kea" answers slowly, "keanu" quickly
    let client = ScriptedLookupClient::new();
    client.respond_after(
        "kea",
        json!({"results": [{"id": 1, "name": "Old Result"}]}),
        Duration::from_secs(3),
    );
    client.respond("keanu", actor_body());
    let mut input = TypeaheadInput::new(actor_gateway(client.clone()), LookupName::Actor, DEBOUNCE, 10);

    // When: "kea" is in flight when "keanu" is typed
    input.on_keystroke("kea").await;
    tokio::time::sleep(Duration::from_millis(600)).await;
    input.on_keystroke("keanu").await;
    input.settle().await;
    tokio::time::sleep(Duration::from_secs(5)).await;

    // Then: Suggestions belong to the latest text
    assert_eq!(client.calls(), vec!["kea".to_string(), "keanu".to_string()]);
    let suggestions = input.suggestions().await;
    assert_eq!(suggestions[0].name, "Keanu Reeves");
}

#[tokio::test(start_paused = true)]
async fn test_blank_text_clears_without_lookup() {
    let client = ScriptedLookupClient::new();
    client.respond("keanu", actor_body());
    let mut input = TypeaheadInput::new(actor_gateway(client.clone()), LookupName::Actor, DEBOUNCE, 10);

    input.on_keystroke("keanu").await;
    input.settle().await;
    assert_eq!(input.suggestions().await.len(), 2);

    input.on_keystroke("   ").await;
    input.settle().await;

    assert!(input.suggestions().await.is_empty());
    assert_eq!(client.calls().len(), 1);
}

struct PanickingLookupClient;

#[async_trait]
impl LookupClient for PanickingLookupClient {
    async fn search(&self, _text: &str, _page: u32, _page_size: u32) -> Result<Value, LookupFailure> {
        panic!("lookup client crashed");
    }
}

#[tokio::test(start_paused = true)]
async fn test_panicked_lookup_task_leaves_input_usable() {
    // Given: An input whose previous lookup produced suggestions
    let client = ScriptedLookupClient::new();
    client.respond("keanu", actor_body());
    let gateway = Arc::new(
        LookupGateway::new(IMAGE_BASE)
            .register(LookupName::Actor, client)
            .register(LookupName::Director, Arc::new(PanickingLookupClient)),
    );
    let mut actors = TypeaheadInput::new(Arc::clone(&gateway), LookupName::Actor, DEBOUNCE, 10);
    actors.on_keystroke("keanu").await;
    actors.settle().await;
    assert_eq!(actors.suggestions().await.len(), 2);

    // When: A lookup task panics
    let mut directors = TypeaheadInput::new(gateway, LookupName::Director, DEBOUNCE, 10);
    directors.on_keystroke("nolan").await;
    directors.settle().await;

    // Then: Settling returns, and neither input is disturbed
    assert!(directors.suggestions().await.is_empty());
    directors.on_keystroke("").await;
    assert!(directors.suggestions().await.is_empty());
    assert_eq!(actors.suggestions().await.len(), 2);
}

//! Shared test collaborators and fixtures
//!
//! Scripted in-memory search and lookup services that record every call.

#![allow(dead_code)]

use async_trait::async_trait;
use reel_common::events::EventBus;
use reel_search::error::{LookupFailure, SearchFailure};
use reel_search::lookup::LookupClient;
use reel_search::models::{PagedEnvelope, SearchRequest};
use reel_search::restoration::{BackupStore, History, RestorationProtocol};
use reel_search::{ScreenProfile, SearchScreen};
use serde_json::{json, Value};
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::Duration;

// ============================================================================
// Search service
// ============================================================================

/// Answers queued responses in order, then empty envelopes
#[derive(Default)]
pub struct ScriptedSearchService {
    responses: Mutex<VecDeque<Result<PagedEnvelope, SearchFailure>>>,
    requests: Mutex<Vec<SearchRequest>>,
}

impl ScriptedSearchService {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn with_responses(responses: Vec<Result<PagedEnvelope, SearchFailure>>) -> Arc<Self> {
        let service = Self::default();
        service.responses.lock().unwrap().extend(responses);
        Arc::new(service)
    }

    pub fn push(&self, response: Result<PagedEnvelope, SearchFailure>) {
        self.responses.lock().unwrap().push_back(response);
    }

    pub fn requests(&self) -> Vec<SearchRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

#[async_trait]
impl reel_search::service::SearchService for ScriptedSearchService {
    async fn search(&self, request: &SearchRequest) -> Result<PagedEnvelope, SearchFailure> {
        self.requests.lock().unwrap().push(request.clone());
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(envelope(Vec::new(), 0)))
    }
}

// ============================================================================
// Lookup client
// ============================================================================

/// Lookup service with per-text responses and latencies
#[derive(Default)]
pub struct ScriptedLookupClient {
    responses: Mutex<HashMap<String, (Value, Duration)>>,
    failing: Mutex<bool>,
    calls: Mutex<Vec<String>>,
}

impl ScriptedLookupClient {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn respond(&self, text: &str, body: Value) {
        self.respond_after(text, body, Duration::ZERO);
    }

    pub fn respond_after(&self, text: &str, body: Value, latency: Duration) {
        self.responses
            .lock()
            .unwrap()
            .insert(text.to_string(), (body, latency));
    }

    pub fn fail(&self) {
        *self.failing.lock().unwrap() = true;
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl LookupClient for ScriptedLookupClient {
    async fn search(&self, text: &str, _page: u32, _page_size: u32) -> Result<Value, LookupFailure> {
        self.calls.lock().unwrap().push(text.to_string());
        if *self.failing.lock().unwrap() {
            return Err(LookupFailure::Api(503, "unavailable".to_string()));
        }

        let scripted = self.responses.lock().unwrap().get(text).cloned();
        match scripted {
            Some((body, latency)) => {
                if !latency.is_zero() {
                    tokio::time::sleep(latency).await;
                }
                Ok(body)
            }
            None => Ok(json!({"results": []})),
        }
    }
}

// ============================================================================
// Fixtures
// ============================================================================

pub fn movie_profile() -> Arc<ScreenProfile> {
    Arc::new(ScreenProfile::movie().unwrap())
}

/// `count` movie rows with ids starting at `first_id`
pub fn rows(first_id: u64, count: u64) -> Vec<Value> {
    (first_id..first_id + count)
        .map(|id| json!({"id": id, "title": format!("Movie {}", id)}))
        .collect()
}

pub fn envelope(data: Vec<Value>, total_count: u64) -> PagedEnvelope {
    PagedEnvelope {
        data,
        total_count,
        page: None,
        total_pages: None,
    }
}

pub fn actor_body() -> Value {
    json!({"results": [
        {"id": 6384, "name": "Keanu Reeves", "known_for_department": "Acting", "profile_path": "/keanu.jpg"},
        {"id": 1331, "name": "Keanu Pearson", "known_for_department": "Acting"}
    ]})
}

/// Movie screen over the scripted service and the given stores
pub fn movie_screen(
    service: Arc<ScriptedSearchService>,
    backup: Arc<dyn BackupStore>,
    history: Arc<dyn History>,
) -> SearchScreen {
    let profile = movie_profile();
    let restoration = RestorationProtocol::new(Arc::clone(&profile), backup, history, 1_000_000);
    SearchScreen::new(profile, service, restoration, EventBus::new(100))
}

//! Debounced typeahead input
//!
//! Each input owns one task slot. A keystroke cancels whatever task is
//! pending and issues a new request sequence number; only the response
//! carrying the latest sequence number may replace the suggestions.

use super::LookupGateway;
use crate::models::{Entity, LookupName};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// Suggestions of one input, guarded by a request sequence counter
#[derive(Debug, Default)]
pub struct SuggestionSlot {
    issued: u64,
    applied: u64,
    suggestions: Vec<Entity>,
}

impl SuggestionSlot {
    /// Issue the next request sequence number
    pub fn begin(&mut self) -> u64 {
        self.issued += 1;
        self.issued
    }

    /// Apply a response; false (and no change) unless `seq` is the latest issued
    pub fn apply(&mut self, seq: u64, entities: Vec<Entity>) -> bool {
        if seq != self.issued {
            debug!(seq, latest = self.issued, "Discarding stale lookup response");
            return false;
        }
        self.applied = seq;
        self.suggestions = entities;
        true
    }

    /// Drop suggestions and invalidate every outstanding request
    pub fn clear(&mut self) {
        self.issued += 1;
        self.suggestions.clear();
    }

    pub fn suggestions(&self) -> &[Entity] {
        &self.suggestions
    }

    pub fn latest_issued(&self) -> u64 {
        self.issued
    }

    pub fn last_applied(&self) -> u64 {
        self.applied
    }
}

/// One typeahead text box bound to a lookup service
pub struct TypeaheadInput {
    gateway: Arc<LookupGateway>,
    lookup: LookupName,
    debounce: Duration,
    page_size: u32,
    slot: Arc<Mutex<SuggestionSlot>>,
    pending: Option<(CancellationToken, JoinHandle<()>)>,
}

impl TypeaheadInput {
    pub fn new(
        gateway: Arc<LookupGateway>,
        lookup: LookupName,
        debounce: Duration,
        page_size: u32,
    ) -> Self {
        Self {
            gateway,
            lookup,
            debounce,
            page_size,
            slot: Arc::new(Mutex::new(SuggestionSlot::default())),
            pending: None,
        }
    }

    pub fn lookup(&self) -> LookupName {
        self.lookup
    }

    /// Handle a keystroke: replace the pending task with a debounced lookup
    ///
    /// Blank text clears the suggestions without contacting the service.
    pub async fn on_keystroke(&mut self, text: &str) {
        self.cancel_pending();

        let text = text.trim().to_string();
        let seq = {
            let mut slot = self.slot.lock().await;
            if text.is_empty() {
                slot.clear();
                return;
            }
            slot.begin()
        };

        let token = CancellationToken::new();
        let task_token = token.clone();
        let gateway = Arc::clone(&self.gateway);
        let slot = Arc::clone(&self.slot);
        let lookup = self.lookup;
        let debounce = self.debounce;
        let page_size = self.page_size;

        let handle = tokio::spawn(async move {
            tokio::select! {
                biased;
                _ = task_token.cancelled() => return,
                _ = tokio::time::sleep(debounce) => {}
            }

            let entities = tokio::select! {
                biased;
                _ = task_token.cancelled() => return,
                entities = gateway.search(lookup, &text, 1, page_size) => entities,
            };

            slot.lock().await.apply(seq, entities);
        });

        self.pending = Some((token, handle));
    }

    /// Wait for the pending lookup (if any) to finish or be cancelled
    ///
    /// A lookup task that panicked leaves the suggestions untouched.
    pub async fn settle(&mut self) {
        if let Some((_, handle)) = self.pending.take() {
            if let Err(e) = handle.await {
                warn!(lookup = %self.lookup, error = %e, "Lookup task did not complete");
            }
        }
    }

    pub async fn suggestions(&self) -> Vec<Entity> {
        self.slot.lock().await.suggestions().to_vec()
    }

    /// Clear suggestions, e.g. after a selection was made
    pub async fn clear(&mut self) {
        self.cancel_pending();
        self.slot.lock().await.clear();
    }

    fn cancel_pending(&mut self) {
        if let Some((token, _)) = self.pending.take() {
            token.cancel();
        }
    }
}

impl Drop for TypeaheadInput {
    fn drop(&mut self) {
        self.cancel_pending();
    }
}

//! Event types for the Reel event system
//!
//! Provides the search session event definitions and the EventBus used by
//! screens to publish state changes to observers (CLI output, diagnostics,
//! tests).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use uuid::Uuid;

/// Search session state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    /// No search yet, or reset by history traversal
    Idle,
    /// Values changed since the last fired search
    Editing,
    /// Request in flight
    Searching,
    /// Results received, no pending edits
    Settled,
    /// Last request failed
    Error,
}

/// Why a search fired
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TriggerSource {
    #[default]
    None,
    /// Explicit submit by the user
    Manual,
    /// Page change
    Pagination,
    /// Partial filters handed over by another screen
    Prefill,
    /// Replay of a snapshot on return navigation
    Restore,
}

/// Reel event types
///
/// Events are broadcast via EventBus; every event names the screen kind and
/// the screen instance that produced it.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum SearchEvent {
    /// Session moved between states
    SessionStateChanged {
        screen: String,
        instance_id: Uuid,
        old_state: SessionState,
        new_state: SessionState,
        timestamp: DateTime<Utc>,
    },

    /// A search request was sent to the search service
    SearchFired {
        screen: String,
        instance_id: Uuid,
        request_id: u64,
        trigger: TriggerSource,
        page: u32,
        timestamp: DateTime<Utc>,
    },

    /// A search response was applied
    SearchSettled {
        screen: String,
        instance_id: Uuid,
        request_id: u64,
        total_results: u64,
        total_pages: u32,
        timestamp: DateTime<Utc>,
    },

    /// A search request failed (user-visible)
    SearchFailed {
        screen: String,
        instance_id: Uuid,
        request_id: u64,
        message: String,
        timestamp: DateTime<Utc>,
    },

    /// A trigger was evaluated but no request was sent
    SearchSuppressed {
        screen: String,
        instance_id: Uuid,
        trigger: TriggerSource,
        reason: String,
        timestamp: DateTime<Utc>,
    },

    /// A session was rehydrated from navigation state or the backup store
    SessionRestored {
        screen: String,
        instance_id: Uuid,
        from_backup: bool,
        page: u32,
        timestamp: DateTime<Utc>,
    },
}

impl SearchEvent {
    /// Event type name, matching the serde tag
    pub fn event_type(&self) -> &'static str {
        match self {
            SearchEvent::SessionStateChanged { .. } => "SessionStateChanged",
            SearchEvent::SearchFired { .. } => "SearchFired",
            SearchEvent::SearchSettled { .. } => "SearchSettled",
            SearchEvent::SearchFailed { .. } => "SearchFailed",
            SearchEvent::SearchSuppressed { .. } => "SearchSuppressed",
            SearchEvent::SessionRestored { .. } => "SessionRestored",
        }
    }
}

/// Broadcast bus for [`SearchEvent`]s
///
/// # Examples
///
/// ```
/// use reel_common::events::EventBus;
///
/// let event_bus = EventBus::new(100);
/// let _rx = event_bus.subscribe();
/// assert_eq!(event_bus.subscriber_count(), 1);
/// ```
#[derive(Clone)]
pub struct EventBus {
    tx: broadcast::Sender<SearchEvent>,
    capacity: usize,
}

impl EventBus {
    /// Creates a new EventBus buffering `capacity` events per slow subscriber
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx, capacity }
    }

    /// Subscribe to all future events
    pub fn subscribe(&self) -> broadcast::Receiver<SearchEvent> {
        self.tx.subscribe()
    }

    /// Emit an event to all subscribers
    ///
    /// Returns `Err` if no subscribers are listening.
    #[allow(clippy::result_large_err)]
    pub fn emit(
        &self,
        event: SearchEvent,
    ) -> Result<usize, broadcast::error::SendError<SearchEvent>> {
        self.tx.send(event)
    }

    /// Emit an event, ignoring if no subscribers are listening
    pub fn emit_lossy(&self, event: SearchEvent) {
        let _ = self.tx.send(event);
    }

    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

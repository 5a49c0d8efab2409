//! Navigation restoration
//!
//! Leaving a search screen for a detail view hands a [`RestorationSnapshot`]
//! over in navigation history state, with a size-capped JSON copy in a
//! session-scoped backup store. On mount the incoming navigation decides
//! between snapshot replay, prefill, backup fallback, deep link and reset.
//!
//! History state is authoritative; the backup is read only on a reload
//! without history state. Either copy is deleted once consumed.

use crate::error::RestorationDecodeFailure;
use crate::filters::FilterValues;
use crate::machine::{SearchSession, SearchSessionMachine, SessionEvent};
use crate::models::{ResultItem, SearchRequest};
use crate::query::decode_location;
use crate::screens::{ScreenKind, ScreenProfile};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Current snapshot format version
pub const SNAPSHOT_VERSION: u32 = 1;

/// Immutable copy of a session's externally visible fields
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RestorationSnapshot {
    pub version: u32,
    pub screen: ScreenKind,
    pub instance_id: Uuid,
    pub captured_at: DateTime<Utc>,
    pub query_text: String,
    pub filter_values: FilterValues,
    pub page: u32,
    pub page_size: u32,
    pub total_results: u64,
    pub total_pages: u32,
    pub has_searched: bool,
    #[serde(default)]
    pub results: Vec<ResultItem>,
}

impl RestorationSnapshot {
    pub fn capture(session: &SearchSession, screen: ScreenKind, instance_id: Uuid) -> Self {
        Self {
            version: SNAPSHOT_VERSION,
            screen,
            instance_id,
            captured_at: Utc::now(),
            query_text: session.query_text.clone(),
            filter_values: session.filter_values.clone(),
            page: session.page,
            page_size: session.page_size,
            total_results: session.total_results,
            total_pages: session.total_pages,
            has_searched: session.has_searched,
            results: session.results.clone(),
        }
    }

    /// Check the snapshot can be replayed on `profile`'s screen
    pub fn validate(&self, profile: &ScreenProfile) -> Result<(), RestorationDecodeFailure> {
        if self.version != SNAPSHOT_VERSION {
            return Err(RestorationDecodeFailure::UnsupportedVersion(self.version));
        }
        if self.screen != profile.kind {
            return Err(RestorationDecodeFailure::ScreenMismatch {
                expected: profile.kind.to_string(),
                found: self.screen.to_string(),
            });
        }
        if self.page == 0 {
            return Err(RestorationDecodeFailure::Inconsistent("page 0".to_string()));
        }
        if self.total_pages > 0 && self.page > self.total_pages {
            return Err(RestorationDecodeFailure::Inconsistent(format!(
                "page {} of {}",
                self.page, self.total_pages
            )));
        }
        if self.has_searched
            && self.total_pages == 0
            && (self.total_results > 0 || !self.results.is_empty())
        {
            return Err(RestorationDecodeFailure::Inconsistent(
                "results without pages".to_string(),
            ));
        }
        Ok(())
    }
}

/// Payload attached to a navigation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum NavigationState {
    /// Return trip to a screen that was left for a detail view
    Snapshot {
        #[serde(rename = "navigationId")]
        navigation_id: Uuid,
        snapshot: RestorationSnapshot,
    },
    /// Another screen opens this one with some filters filled in
    Prefill {
        #[serde(rename = "navigationId")]
        navigation_id: Uuid,
        screen: ScreenKind,
        #[serde(rename = "prefillFilters")]
        filters: FilterValues,
    },
}

impl NavigationState {
    /// Prefill payload for opening `screen` with `filters`
    pub fn prefill(screen: ScreenKind, filters: FilterValues) -> Self {
        NavigationState::Prefill {
            navigation_id: Uuid::new_v4(),
            screen,
            filters,
        }
    }

    pub fn navigation_id(&self) -> Uuid {
        match self {
            NavigationState::Snapshot { navigation_id, .. }
            | NavigationState::Prefill { navigation_id, .. } => *navigation_id,
        }
    }

    pub fn to_payload(&self) -> reel_common::Result<Value> {
        Ok(serde_json::to_value(self)?)
    }

    pub fn from_payload(payload: &Value) -> Result<Self, RestorationDecodeFailure> {
        Self::deserialize(payload).map_err(|e| RestorationDecodeFailure::Malformed(e.to_string()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NavigationKind {
    /// Fresh navigation (link, typed URL)
    Push,
    /// Back/forward
    Traversal,
    Reload,
}

/// What the screen sees when it mounts
#[derive(Debug, Clone, PartialEq)]
pub struct IncomingNavigation {
    pub kind: NavigationKind,
    pub state: Option<Value>,
    /// URL query string
    pub query: String,
}

impl IncomingNavigation {
    pub fn push(query: impl Into<String>) -> Self {
        Self {
            kind: NavigationKind::Push,
            state: None,
            query: query.into(),
        }
    }

    pub fn traversal(state: Option<Value>) -> Self {
        Self {
            kind: NavigationKind::Traversal,
            state,
            query: String::new(),
        }
    }

    pub fn reload(query: impl Into<String>) -> Self {
        Self {
            kind: NavigationKind::Reload,
            state: None,
            query: query.into(),
        }
    }

    pub fn with_state(mut self, state: Value) -> Self {
        self.state = Some(state);
        self
    }
}

/// Navigation history of the current entry
pub trait History: Send + Sync {
    fn state(&self) -> Option<Value>;
    fn replace_state(&self, state: Option<Value>);
    fn query(&self) -> String;
    fn replace_query(&self, query: &str);
}

#[derive(Debug, Default)]
struct HistoryEntry {
    state: Option<Value>,
    query: String,
}

/// In-process history entry
#[derive(Debug, Default)]
pub struct MemoryHistory {
    entry: RwLock<HistoryEntry>,
}

impl MemoryHistory {
    pub fn new() -> Self {
        Self::default()
    }
}

impl History for MemoryHistory {
    fn state(&self) -> Option<Value> {
        self.entry.read().unwrap_or_else(|e| e.into_inner()).state.clone()
    }

    fn replace_state(&self, state: Option<Value>) {
        self.entry.write().unwrap_or_else(|e| e.into_inner()).state = state;
    }

    fn query(&self) -> String {
        self.entry.read().unwrap_or_else(|e| e.into_inner()).query.clone()
    }

    fn replace_query(&self, query: &str) {
        self.entry.write().unwrap_or_else(|e| e.into_inner()).query = query.to_string();
    }
}

/// Session-scoped keyed slot store for backup snapshots
pub trait BackupStore: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&self, key: &str, value: String) -> reel_common::Result<()>;
    fn remove(&self, key: &str);
}

#[derive(Debug, Default)]
pub struct MemoryBackupStore {
    slots: RwLock<HashMap<String, String>>,
}

impl MemoryBackupStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl BackupStore for MemoryBackupStore {
    fn get(&self, key: &str) -> Option<String> {
        self.slots.read().unwrap_or_else(|e| e.into_inner()).get(key).cloned()
    }

    fn set(&self, key: &str, value: String) -> reel_common::Result<()> {
        self.slots
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .insert(key.to_string(), value);
        Ok(())
    }

    fn remove(&self, key: &str) {
        self.slots.write().unwrap_or_else(|e| e.into_inner()).remove(key);
    }
}

/// One JSON file per key under a directory
#[derive(Debug, Clone)]
pub struct FileBackupStore {
    dir: PathBuf,
}

impl FileBackupStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", key))
    }
}

impl BackupStore for FileBackupStore {
    fn get(&self, key: &str) -> Option<String> {
        let path = self.path_for(key);
        match fs::read_to_string(&path) {
            Ok(content) => Some(content),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => None,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Failed to read backup snapshot");
                None
            }
        }
    }

    fn set(&self, key: &str, value: String) -> reel_common::Result<()> {
        fs::create_dir_all(&self.dir)?;
        let path = self.path_for(key);
        let temp_path = path.with_extension("json.tmp");
        fs::write(&temp_path, value)?;
        fs::rename(&temp_path, &path)?;
        Ok(())
    }

    fn remove(&self, key: &str) {
        let path = self.path_for(key);
        if let Err(e) = fs::remove_file(&path) {
            if e.kind() != std::io::ErrorKind::NotFound {
                warn!(path = %path.display(), error = %e, "Failed to remove backup snapshot");
            }
        }
    }
}

/// How a mount was resolved
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RestoreOutcome {
    Restored { from_backup: bool },
    Prefilled,
    DeepLinked { fired: bool },
    Reset,
}

pub struct RestorationProtocol {
    profile: Arc<ScreenProfile>,
    backup: Arc<dyn BackupStore>,
    history: Arc<dyn History>,
    cap_bytes: usize,
}

impl RestorationProtocol {
    pub fn new(
        profile: Arc<ScreenProfile>,
        backup: Arc<dyn BackupStore>,
        history: Arc<dyn History>,
        cap_bytes: usize,
    ) -> Self {
        Self {
            profile,
            backup,
            history,
            cap_bytes,
        }
    }

    pub fn history(&self) -> &Arc<dyn History> {
        &self.history
    }

    /// Fixed backup slot per screen type
    pub fn backup_key(&self) -> String {
        format!("reel.search.{}.snapshot", self.profile.kind)
    }

    pub fn snapshot(&self, session: &SearchSession, instance_id: Uuid) -> RestorationSnapshot {
        RestorationSnapshot::capture(session, self.profile.kind, instance_id)
    }

    /// Attach `snapshot` to a navigation payload and back it up
    ///
    /// The backup copy is written only when its encoded size is below the
    /// cap; an oversized snapshot travels in navigation state only and any
    /// older backup for this screen is dropped.
    pub fn hand_off(&self, snapshot: RestorationSnapshot) -> NavigationState {
        let key = self.backup_key();
        let encoded = match serde_json::to_string(&snapshot) {
            Ok(json) if json.len() < self.cap_bytes => Some(json),
            Ok(json) => {
                debug!(bytes = json.len(), cap = self.cap_bytes, "Snapshot over backup cap");
                None
            }
            Err(e) => {
                warn!(error = %e, "Failed to encode snapshot for backup");
                None
            }
        };

        match encoded {
            Some(json) => {
                if let Err(e) = self.backup.set(&key, json) {
                    warn!(key = %key, error = %e, "Failed to write backup snapshot");
                }
            }
            None => {
                debug!(key = %key, "Snapshot travels in navigation state only");
                self.backup.remove(&key);
            }
        }

        NavigationState::Snapshot {
            navigation_id: Uuid::new_v4(),
            snapshot,
        }
    }

    /// Resolve an incoming navigation against `machine`
    ///
    /// Returns how the mount was resolved and the request to send, if the
    /// machine fired one.
    pub fn restore(
        &self,
        incoming: &IncomingNavigation,
        machine: &mut SearchSessionMachine,
    ) -> (RestoreOutcome, Option<SearchRequest>) {
        if let Some(payload) = incoming.state.as_ref() {
            return self.restore_from_payload(payload, machine);
        }

        match incoming.kind {
            NavigationKind::Traversal => {
                debug!(screen = %self.profile.kind, "Traversal without state, starting fresh");
                machine.dispatch(SessionEvent::HistoryTraversal);
                (RestoreOutcome::Reset, None)
            }
            NavigationKind::Reload => match self.take_backup() {
                Some(snapshot) => {
                    info!(screen = %self.profile.kind, "Restoring from backup snapshot");
                    machine.dispatch(SessionEvent::Restore {
                        navigation_id: Uuid::new_v4(),
                        snapshot,
                    });
                    (RestoreOutcome::Restored { from_backup: true }, None)
                }
                None => self.deep_link(&incoming.query, machine),
            },
            NavigationKind::Push => self.deep_link(&incoming.query, machine),
        }
    }

    fn restore_from_payload(
        &self,
        payload: &Value,
        machine: &mut SearchSessionMachine,
    ) -> (RestoreOutcome, Option<SearchRequest>) {
        let state = NavigationState::from_payload(payload).and_then(|state| {
            match &state {
                NavigationState::Snapshot { snapshot, .. } => snapshot.validate(&self.profile)?,
                NavigationState::Prefill { screen, .. } if *screen != self.profile.kind => {
                    return Err(RestorationDecodeFailure::ScreenMismatch {
                        expected: self.profile.kind.to_string(),
                        found: screen.to_string(),
                    });
                }
                NavigationState::Prefill { .. } => {}
            }
            Ok(state)
        });

        // consumed either way
        self.history.replace_state(None);
        self.backup.remove(&self.backup_key());

        match state {
            Ok(NavigationState::Snapshot {
                navigation_id,
                snapshot,
            }) => {
                machine.dispatch(SessionEvent::Restore {
                    navigation_id,
                    snapshot,
                });
                (RestoreOutcome::Restored { from_backup: false }, None)
            }
            Ok(NavigationState::Prefill {
                navigation_id,
                filters,
                ..
            }) => {
                let request = machine.dispatch(SessionEvent::Prefill {
                    navigation_id,
                    filters,
                });
                (RestoreOutcome::Prefilled, request)
            }
            Err(e) => {
                warn!(screen = %self.profile.kind, error = %e, "Unusable navigation state, using defaults");
                machine.dispatch(SessionEvent::HistoryTraversal);
                (RestoreOutcome::Reset, None)
            }
        }
    }

    fn take_backup(&self) -> Option<RestorationSnapshot> {
        let key = self.backup_key();
        let raw = self.backup.get(&key)?;
        self.backup.remove(&key);

        let decoded = serde_json::from_str::<RestorationSnapshot>(&raw)
            .map_err(|e| RestorationDecodeFailure::Malformed(e.to_string()))
            .and_then(|snapshot| snapshot.validate(&self.profile).map(|_| snapshot));
        match decoded {
            Ok(snapshot) => Some(snapshot),
            Err(e) => {
                warn!(key = %key, error = %e, "Discarding unusable backup snapshot");
                None
            }
        }
    }

    fn deep_link(
        &self,
        query: &str,
        machine: &mut SearchSessionMachine,
    ) -> (RestoreOutcome, Option<SearchRequest>) {
        let location = decode_location(query, &self.profile);
        let request = machine.dispatch(SessionEvent::LoadLocation {
            query_text: location.query_text,
            page: location.page,
            filters: location.filters,
        });
        (
            RestoreOutcome::DeepLinked {
                fired: request.is_some(),
            },
            request,
        )
    }
}

//! Search session state machine
//!
//! Every input (edits, triggers, responses, navigation) is a [`SessionEvent`]
//! fed to [`SearchSessionMachine::dispatch`], which computes the next
//! session deterministically and returns the request to send, if any. The
//! machine never performs I/O; the screen driver executes returned requests
//! and feeds the outcome back as [`SessionEvent::ResponseReceived`].
//!
//! States: Idle → Editing → Searching → Settled | Error

use crate::error::SearchFailure;
use crate::filters::{has_any_active_filter, is_active, ChangeSink, FilterValues};
use crate::models::{EntityParam, FilterValue, PagedEnvelope, ResultItem, SearchRequest};
use crate::restoration::RestorationSnapshot;
use crate::screens::ScreenProfile;
use chrono::{DateTime, Utc};
use reel_common::events::{SessionState, TriggerSource};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Aggregate state of one search screen
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchSession {
    pub query_text: String,
    pub filter_values: FilterValues,
    /// 1-based
    pub page: u32,
    pub page_size: u32,
    pub total_results: u64,
    pub total_pages: u32,
    pub has_searched: bool,
    pub last_trigger_source: TriggerSource,
    pub results: Vec<ResultItem>,
    pub state: SessionState,
    pub is_restoring: bool,
    pub error_message: Option<String>,
}

impl SearchSession {
    /// Fresh session: defaults, nothing searched
    pub fn fresh(profile: &ScreenProfile) -> Self {
        Self {
            query_text: String::new(),
            filter_values: profile.filters.defaults(),
            page: 1,
            page_size: profile.page_size,
            total_results: 0,
            total_pages: 0,
            has_searched: false,
            last_trigger_source: TriggerSource::None,
            results: Vec::new(),
            state: SessionState::Idle,
            is_restoring: false,
            error_message: None,
        }
    }
}

/// Inputs to the machine
#[derive(Debug, Clone)]
pub enum SessionEvent {
    QueryEdited(String),
    FilterEdited { key: String, value: FilterValue },
    /// All filters back to their defaults
    ResetFilters,
    /// Explicit submit; restarts at page 1
    Submit,
    GoToPage(i64),
    /// Query, page and filters read from a deep link; fires as a manual search
    LoadLocation {
        query_text: String,
        page: u32,
        filters: FilterValues,
    },
    /// Partial filters handed over by another screen; fires once per navigation
    Prefill {
        navigation_id: Uuid,
        filters: FilterValues,
    },
    /// Snapshot replay on return navigation; never fetches by itself
    Restore {
        navigation_id: Uuid,
        snapshot: RestorationSnapshot,
    },
    /// Automatic trigger once restoration state has settled
    RestoreSettled,
    ResponseReceived {
        request_id: u64,
        outcome: Result<PagedEnvelope, SearchFailure>,
    },
    /// Back/forward navigation without attached state, or an unusable
    /// restoration payload: start over as a fresh screen
    HistoryTraversal,
}

/// State transition record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StateTransition {
    pub old_state: SessionState,
    pub new_state: SessionState,
    pub transitioned_at: DateTime<Utc>,
}

/// Things the driver should publish after a dispatch
#[derive(Debug, Clone, PartialEq)]
pub enum MachineNotice {
    Transition(StateTransition),
    Fired {
        request_id: u64,
        trigger: TriggerSource,
        page: u32,
    },
    Suppressed {
        trigger: TriggerSource,
        reason: String,
    },
    Settled {
        request_id: u64,
        total_results: u64,
        total_pages: u32,
    },
    Failed {
        request_id: u64,
        message: String,
    },
    Restored {
        page: u32,
    },
}

pub struct SearchSessionMachine {
    profile: Arc<ScreenProfile>,
    session: SearchSession,
    next_request_id: u64,
    in_flight: Option<u64>,
    /// Edits made while a request was in flight
    pending_edits: bool,
    applied_navigations: HashSet<Uuid>,
    notices: Vec<MachineNotice>,
}

impl SearchSessionMachine {
    pub fn new(profile: Arc<ScreenProfile>) -> Self {
        let session = SearchSession::fresh(&profile);
        Self {
            profile,
            session,
            next_request_id: 0,
            in_flight: None,
            pending_edits: false,
            applied_navigations: HashSet::new(),
            notices: Vec::new(),
        }
    }

    pub fn profile(&self) -> &Arc<ScreenProfile> {
        &self.profile
    }

    pub fn session(&self) -> &SearchSession {
        &self.session
    }

    pub fn state(&self) -> SessionState {
        self.session.state
    }

    pub fn in_flight(&self) -> Option<u64> {
        self.in_flight
    }

    /// Drain notices accumulated since the last call
    pub fn take_notices(&mut self) -> Vec<MachineNotice> {
        std::mem::take(&mut self.notices)
    }

    /// Firing precondition: non-blank query or at least one active filter
    pub fn should_search(&self) -> bool {
        !self.session.query_text.trim().is_empty()
            || has_any_active_filter(&self.profile.filters, &self.session.filter_values)
    }

    /// Apply one event; returns the search request to send, if any
    pub fn dispatch(&mut self, event: SessionEvent) -> Option<SearchRequest> {
        match event {
            SessionEvent::QueryEdited(text) => {
                self.session.query_text = text;
                self.mark_edited();
                None
            }
            SessionEvent::FilterEdited { key, value } => {
                self.edit_filter(&key, value);
                None
            }
            SessionEvent::ResetFilters => {
                self.session.filter_values = self.profile.filters.defaults();
                self.mark_edited();
                None
            }
            SessionEvent::Submit => {
                self.session.page = 1;
                self.fire(TriggerSource::Manual)
            }
            SessionEvent::GoToPage(page) => self.go_to_page(page),
            SessionEvent::LoadLocation {
                query_text,
                page,
                filters,
            } => {
                self.session.query_text = query_text;
                self.session.filter_values = self.profile.filters.merge_onto_defaults(&filters);
                self.session.page = page.max(1);
                if self.should_search() {
                    self.fire(TriggerSource::Manual)
                } else {
                    self.session.page = 1;
                    None
                }
            }
            SessionEvent::Prefill {
                navigation_id,
                filters,
            } => self.prefill(navigation_id, filters),
            SessionEvent::Restore {
                navigation_id,
                snapshot,
            } => {
                self.restore(navigation_id, snapshot);
                None
            }
            SessionEvent::RestoreSettled => self.restore_settled(),
            SessionEvent::ResponseReceived { request_id, outcome } => {
                self.receive(request_id, outcome);
                None
            }
            SessionEvent::HistoryTraversal => {
                self.reset();
                None
            }
        }
    }

    fn set_state(&mut self, new_state: SessionState) {
        let old_state = self.session.state;
        if old_state == new_state {
            return;
        }
        self.session.state = new_state;
        self.notices.push(MachineNotice::Transition(StateTransition {
            old_state,
            new_state,
            transitioned_at: Utc::now(),
        }));
    }

    fn mark_edited(&mut self) {
        match self.session.state {
            SessionState::Searching => self.pending_edits = true,
            _ => self.set_state(SessionState::Editing),
        }
    }

    fn edit_filter(&mut self, key: &str, value: FilterValue) {
        let Some(spec) = self.profile.filters.get(key) else {
            debug!(key = %key, "Ignoring edit of unknown filter");
            return;
        };
        if !value.fits(spec) {
            debug!(key = %key, "Ignoring edit with a value of the wrong kind");
            return;
        }
        let value = spec.normalize(value);
        self.session.filter_values.set(key, value);
        self.mark_edited();
    }

    fn go_to_page(&mut self, requested: i64) -> Option<SearchRequest> {
        if !self.session.has_searched {
            debug!(requested, "Ignoring page change before any search");
            return None;
        }
        let last = i64::from(self.session.total_pages.max(1));
        let page = requested.clamp(1, last);
        if page != requested {
            debug!(requested, clamped = page, "Page out of range, clamped");
        }
        self.session.page = page as u32;
        self.fire(TriggerSource::Pagination)
    }

    fn fire(&mut self, trigger: TriggerSource) -> Option<SearchRequest> {
        if !self.should_search() {
            debug!(trigger = ?trigger, "Nothing to search for, clearing results");
            self.clear_results();
            self.session.has_searched = false;
            self.session.page = 1;
            self.in_flight = None;
            self.pending_edits = false;
            self.notices.push(MachineNotice::Suppressed {
                trigger,
                reason: "empty query and no active filter".to_string(),
            });
            self.set_state(SessionState::Idle);
            return None;
        }

        self.next_request_id += 1;
        let request_id = self.next_request_id;
        if let Some(superseded) = self.in_flight.replace(request_id) {
            debug!(superseded, request_id, "Superseding in-flight search");
        }
        self.pending_edits = false;
        self.session.last_trigger_source = trigger;
        self.session.error_message = None;
        self.set_state(SessionState::Searching);

        let request = self.build_request(request_id, trigger);
        info!(
            screen = %self.profile.kind,
            request_id,
            trigger = ?trigger,
            page = request.page,
            "Search fired"
        );
        self.notices.push(MachineNotice::Fired {
            request_id,
            trigger,
            page: request.page,
        });
        Some(request)
    }

    fn prefill(&mut self, navigation_id: Uuid, filters: FilterValues) -> Option<SearchRequest> {
        if !self.applied_navigations.insert(navigation_id) {
            debug!(%navigation_id, "Prefill already applied for this navigation");
            return None;
        }

        self.session.query_text = String::new();
        self.session.filter_values = self.profile.filters.merge_onto_defaults(&filters);
        self.session.page = 1;
        self.session.is_restoring = true;

        let request = self.fire(TriggerSource::Prefill);
        if request.is_none() {
            self.session.is_restoring = false;
        }
        request
    }

    fn restore(&mut self, navigation_id: Uuid, snapshot: RestorationSnapshot) {
        if let Err(e) = snapshot.validate(&self.profile) {
            warn!(%navigation_id, error = %e, "Discarding unusable snapshot, starting fresh");
            self.reset();
            return;
        }
        if !self.applied_navigations.insert(navigation_id) {
            debug!(%navigation_id, "Snapshot already applied for this navigation");
            return;
        }

        let filters = self.profile.filters.merge_onto_defaults(&snapshot.filter_values);
        let session = &mut self.session;
        session.query_text = snapshot.query_text;
        session.filter_values = filters;
        session.page = snapshot.page.max(1);
        session.page_size = self.profile.page_size;
        session.total_results = snapshot.total_results;
        session.total_pages = snapshot.total_pages;
        session.has_searched = snapshot.has_searched;
        session.results = snapshot.results;
        session.last_trigger_source = TriggerSource::Restore;
        session.is_restoring = true;
        session.error_message = None;

        self.in_flight = None;
        self.pending_edits = false;

        let next = if self.session.has_searched {
            SessionState::Settled
        } else if self.should_search() {
            SessionState::Editing
        } else {
            SessionState::Idle
        };
        self.set_state(next);

        info!(
            screen = %self.profile.kind,
            page = self.session.page,
            rows = self.session.results.len(),
            "Session restored from snapshot"
        );
        self.notices.push(MachineNotice::Restored {
            page: self.session.page,
        });
    }

    fn restore_settled(&mut self) -> Option<SearchRequest> {
        if !self.session.is_restoring {
            return None;
        }

        let trigger = self.session.last_trigger_source;
        if trigger != TriggerSource::Restore {
            debug!(last_trigger = ?trigger, "Restore trigger suppressed, a search already ran");
            self.notices.push(MachineNotice::Suppressed {
                trigger: TriggerSource::Restore,
                reason: format!("last trigger was {:?}", trigger),
            });
            if self.in_flight.is_none() {
                self.session.is_restoring = false;
            }
            return None;
        }

        let needs_rows = self.session.has_searched
            && self.session.results.is_empty()
            && self.session.total_results > 0;
        if needs_rows {
            return self.fire(TriggerSource::Restore);
        }

        self.session.is_restoring = false;
        None
    }

    fn receive(&mut self, request_id: u64, outcome: Result<PagedEnvelope, SearchFailure>) {
        if self.in_flight != Some(request_id) {
            debug!(request_id, in_flight = ?self.in_flight, "Discarding stale search response");
            return;
        }
        self.in_flight = None;
        self.session.is_restoring = false;

        match outcome {
            Ok(envelope) => {
                let page_size = u64::from(self.session.page_size.max(1));
                let total_results = envelope.total_count.max(envelope.data.len() as u64);
                let total_pages = if total_results == 0 {
                    0
                } else {
                    let computed = total_results.div_ceil(page_size) as u32;
                    envelope.total_pages.filter(|p| *p > 0).unwrap_or(computed)
                };

                let session = &mut self.session;
                session.results = envelope.data;
                session.total_results = total_results;
                session.total_pages = total_pages;
                session.has_searched = true;
                if total_pages > 0 && session.page > total_pages {
                    session.page = total_pages;
                }
                if total_pages == 0 {
                    session.page = 1;
                }

                self.notices.push(MachineNotice::Settled {
                    request_id,
                    total_results,
                    total_pages,
                });
                let next = if self.pending_edits {
                    SessionState::Editing
                } else {
                    SessionState::Settled
                };
                self.pending_edits = false;
                self.set_state(next);
            }
            Err(failure) => {
                warn!(request_id, error = %failure, "Search failed");
                let message = failure.user_message();
                self.clear_results();
                self.session.has_searched = false;
                self.session.error_message = Some(message.clone());
                self.pending_edits = false;
                self.notices.push(MachineNotice::Failed { request_id, message });
                self.set_state(SessionState::Error);
            }
        }
    }

    fn reset(&mut self) {
        let state = self.session.state;
        self.session = SearchSession::fresh(&self.profile);
        // keep the current state so the transition to Idle is recorded
        self.session.state = state;
        self.in_flight = None;
        self.pending_edits = false;
        self.set_state(SessionState::Idle);
    }

    fn clear_results(&mut self) {
        self.session.results.clear();
        self.session.total_results = 0;
        self.session.total_pages = 0;
    }

    fn build_request(&self, request_id: u64, trigger: TriggerSource) -> SearchRequest {
        let profile = &self.profile;
        let session = &self.session;
        let mut params: BTreeMap<String, Value> = BTreeMap::new();

        let query = session.query_text.trim();
        if !query.is_empty() {
            params.insert(profile.query_param.clone(), Value::from(query));
        }
        params.insert(profile.page_param.clone(), Value::from(session.page));
        params.insert(profile.page_size_param.clone(), Value::from(session.page_size));

        for spec in profile.filters.iter() {
            let value = session.filter_values.value_or_default(spec);
            if !is_active(spec, value) {
                continue;
            }
            let field = spec.lookup.as_ref().map(|l| l.request_field).unwrap_or(EntityParam::Id);
            let encoded = match value {
                FilterValue::Text(text) => Some(Value::from(text.as_str())),
                FilterValue::Select(choice) => choice.as_deref().map(Value::from),
                FilterValue::Multiselect(items) => Some(Value::from(items.clone())),
                FilterValue::Range(range) => Some(Value::from(vec![range.lo(), range.hi()])),
                FilterValue::Entity(entity) => entity.as_ref().map(|e| match field {
                    EntityParam::Name => Value::from(e.name.as_str()),
                    EntityParam::Id => Value::from(e.id.as_str()),
                }),
                FilterValue::Entities(entities) => Some(Value::from(
                    entities
                        .iter()
                        .map(|e| match field {
                            EntityParam::Name => e.name.clone(),
                            EntityParam::Id => e.id.clone(),
                        })
                        .collect::<Vec<_>>(),
                )),
            };
            if let Some(encoded) = encoded {
                params.insert(spec.param.clone(), encoded);
            }
        }

        SearchRequest {
            request_id,
            trigger,
            page: session.page,
            page_size: session.page_size,
            params,
        }
    }
}

impl ChangeSink for SearchSessionMachine {
    fn on_change(&mut self, key: &str, value: FilterValue) {
        self.edit_filter(key, value);
    }
}

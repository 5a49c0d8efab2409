//! Search screen driver
//!
//! Owns one [`SearchSessionMachine`] behind a `tokio::sync::Mutex`, executes
//! the requests it emits against the screen's [`SearchService`], feeds the
//! outcomes back, keeps the URL in step with fired searches and publishes
//! machine notices on the [`EventBus`].
//!
//! The machine lock is never held across a service call.

use crate::machine::{MachineNotice, SearchSession, SearchSessionMachine, SessionEvent};
use crate::models::{FilterValue, SearchRequest};
use crate::query::encode_location;
use crate::restoration::{IncomingNavigation, RestorationProtocol, RestoreOutcome};
use crate::screens::ScreenProfile;
use crate::service::SearchService;
use chrono::Utc;
use reel_common::events::{EventBus, SearchEvent, SessionState};
use serde_json::Value;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info};
use uuid::Uuid;

pub struct SearchScreen {
    profile: Arc<ScreenProfile>,
    instance_id: Uuid,
    machine: Arc<Mutex<SearchSessionMachine>>,
    service: Arc<dyn SearchService>,
    restoration: RestorationProtocol,
    event_bus: EventBus,
}

impl SearchScreen {
    pub fn new(
        profile: Arc<ScreenProfile>,
        service: Arc<dyn SearchService>,
        restoration: RestorationProtocol,
        event_bus: EventBus,
    ) -> Self {
        let machine = SearchSessionMachine::new(Arc::clone(&profile));
        Self {
            profile,
            instance_id: Uuid::new_v4(),
            machine: Arc::new(Mutex::new(machine)),
            service,
            restoration,
            event_bus,
        }
    }

    pub fn profile(&self) -> &Arc<ScreenProfile> {
        &self.profile
    }

    pub fn instance_id(&self) -> Uuid {
        self.instance_id
    }

    /// Resolve the incoming navigation, run any search it fires, then let
    /// the automatic restore trigger run
    pub async fn mount(&self, incoming: &IncomingNavigation) -> RestoreOutcome {
        let (outcome, request) = {
            let mut machine = self.machine.lock().await;
            let (outcome, request) = self.restoration.restore(incoming, &mut *machine);
            let from_backup = matches!(outcome, RestoreOutcome::Restored { from_backup: true });
            let notices = machine.take_notices();
            self.publish(notices, from_backup);
            (outcome, request)
        };
        info!(screen = %self.profile.kind, instance_id = %self.instance_id, outcome = ?outcome, "Search screen mounted");

        if let Some(request) = request {
            self.execute(request).await;
        }
        self.dispatch(SessionEvent::RestoreSettled).await;
        outcome
    }

    pub async fn set_query(&self, text: &str) {
        self.dispatch(SessionEvent::QueryEdited(text.to_string())).await;
    }

    pub async fn set_filter(&self, key: &str, value: FilterValue) {
        self.dispatch(SessionEvent::FilterEdited {
            key: key.to_string(),
            value,
        })
        .await;
    }

    pub async fn reset_filters(&self) {
        self.dispatch(SessionEvent::ResetFilters).await;
    }

    pub async fn submit(&self) {
        self.dispatch(SessionEvent::Submit).await;
    }

    pub async fn go_to_page(&self, page: i64) {
        self.dispatch(SessionEvent::GoToPage(page)).await;
    }

    pub async fn history_traversal(&self) {
        self.dispatch(SessionEvent::HistoryTraversal).await;
    }

    /// Run `f` against the machine as a change sink
    ///
    /// Used by selection controllers, which push edits synchronously.
    pub async fn edit<R>(&self, f: impl FnOnce(&mut SearchSessionMachine) -> R) -> R {
        let mut machine = self.machine.lock().await;
        let result = f(&mut *machine);
        let notices = machine.take_notices();
        self.publish(notices, false);
        result
    }

    pub async fn session(&self) -> SearchSession {
        self.machine.lock().await.session().clone()
    }

    pub async fn state(&self) -> SessionState {
        self.machine.lock().await.state()
    }

    /// Leave for a detail view: capture, back up and return the navigation payload
    pub async fn navigate_to_detail(&self) -> reel_common::Result<Value> {
        let session = self.session().await;
        let snapshot = self.restoration.snapshot(&session, self.instance_id);
        let state = self.restoration.hand_off(snapshot);
        debug!(screen = %self.profile.kind, navigation_id = %state.navigation_id(), "Handing off to detail view");
        state.to_payload()
    }

    /// Apply `event` and run the search it fires, if any
    pub async fn dispatch(&self, event: SessionEvent) {
        if let Some(request) = self.apply(event).await {
            self.execute(request).await;
        }
    }

    async fn apply(&self, event: SessionEvent) -> Option<SearchRequest> {
        let mut machine = self.machine.lock().await;
        let request = machine.dispatch(event);
        let notices = machine.take_notices();
        self.publish(notices, false);

        if request.is_some() {
            let session = machine.session();
            let query = encode_location(&session.query_text, session.page, &session.filter_values, &self.profile);
            self.restoration.history().replace_query(&query);
        }
        request
    }

    async fn execute(&self, request: SearchRequest) {
        let request_id = request.request_id;
        let outcome = self.service.search(&request).await;
        // a settled response never fires a follow-up search
        let follow_up = self
            .apply(SessionEvent::ResponseReceived { request_id, outcome })
            .await;
        debug_assert!(follow_up.is_none());
    }

    fn publish(&self, notices: Vec<MachineNotice>, from_backup: bool) {
        let screen = self.profile.kind.to_string();
        let instance_id = self.instance_id;
        for notice in notices {
            let timestamp = Utc::now();
            let event = match notice {
                MachineNotice::Transition(transition) => SearchEvent::SessionStateChanged {
                    screen: screen.clone(),
                    instance_id,
                    old_state: transition.old_state,
                    new_state: transition.new_state,
                    timestamp: transition.transitioned_at,
                },
                MachineNotice::Fired {
                    request_id,
                    trigger,
                    page,
                } => SearchEvent::SearchFired {
                    screen: screen.clone(),
                    instance_id,
                    request_id,
                    trigger,
                    page,
                    timestamp,
                },
                MachineNotice::Suppressed { trigger, reason } => SearchEvent::SearchSuppressed {
                    screen: screen.clone(),
                    instance_id,
                    trigger,
                    reason,
                    timestamp,
                },
                MachineNotice::Settled {
                    request_id,
                    total_results,
                    total_pages,
                } => SearchEvent::SearchSettled {
                    screen: screen.clone(),
                    instance_id,
                    request_id,
                    total_results,
                    total_pages,
                    timestamp,
                },
                MachineNotice::Failed { request_id, message } => SearchEvent::SearchFailed {
                    screen: screen.clone(),
                    instance_id,
                    request_id,
                    message,
                    timestamp,
                },
                MachineNotice::Restored { page } => SearchEvent::SessionRestored {
                    screen: screen.clone(),
                    instance_id,
                    from_backup,
                    page,
                    timestamp,
                },
            };
            self.event_bus.emit_lossy(event);
        }
    }
}

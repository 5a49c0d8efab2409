//! reel-search library interface
//!
//! Search orchestration and navigation restoration for the Reel search
//! screens (movies, news, users, admin). Exposes public APIs for the CLI and
//! for integration testing.

pub mod avatar_cache;
pub mod error;
pub mod filters;
pub mod lookup;
pub mod machine;
pub mod models;
pub mod orchestrator;
pub mod query;
pub mod restoration;
pub mod screens;
pub mod selection;
pub mod service;

pub use crate::error::{LookupFailure, RestorationDecodeFailure, SearchFailure};
pub use crate::machine::{SearchSession, SearchSessionMachine, SessionEvent};
pub use crate::orchestrator::SearchScreen;
pub use crate::screens::{ScreenKind, ScreenProfile};

use crate::restoration::{BackupStore, History, RestorationProtocol};
use crate::service::HttpSearchService;
use reel_common::config::ResolvedConfig;
use reel_common::events::EventBus;
use std::sync::Arc;

/// Build a screen wired to the HTTP search service for `profile`
pub fn http_screen(
    config: &ResolvedConfig,
    profile: ScreenProfile,
    backup: Arc<dyn BackupStore>,
    history: Arc<dyn History>,
    event_bus: EventBus,
) -> Result<SearchScreen, SearchFailure> {
    let service = HttpSearchService::new(&config.api_base_url, &profile.endpoint, config.http_timeout)?;
    let profile = Arc::new(profile);
    let restoration = RestorationProtocol::new(
        Arc::clone(&profile),
        backup,
        history,
        config.backup_cap_bytes,
    );
    Ok(SearchScreen::new(profile, Arc::new(service), restoration, event_bus))
}

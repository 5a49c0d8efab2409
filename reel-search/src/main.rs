//! reel-search - command-line front end for the Reel search screens
//!
//! Runs one search screen against the configured API (deep-linked from the
//! command-line arguments) or queries a typeahead lookup service.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use reel_common::config::{ConfigOverrides, ConfigResolver, ResolvedConfig};
use reel_common::events::{EventBus, SessionState};
use reel_common::Error;
use reel_search::lookup::LookupGateway;
use reel_search::models::LookupName;
use reel_search::restoration::{
    BackupStore, FileBackupStore, History, IncomingNavigation, MemoryHistory,
};
use reel_search::screens::{URL_PAGE_KEY, URL_QUERY_KEY};
use reel_search::{http_screen, ScreenKind, ScreenProfile, SearchSession};
use tracing::{debug, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use url::form_urlencoded;

#[derive(Parser, Debug)]
#[command(name = "reel-search")]
#[command(about = "Search screens and lookups for Reel")]
#[command(version)]
struct Cli {
    /// Config file (defaults to <config_dir>/reel/reel-search.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// API base URL
    #[arg(long, global = true)]
    api_base_url: Option<String>,

    /// Log level (RUST_LOG takes precedence)
    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run a search screen
    Search(SearchArgs),
    /// Query a typeahead lookup service
    Lookup {
        /// keyword, country, language, actor, director, company or people
        name: LookupName,
        text: String,
        /// Print entities as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Args, Debug)]
struct SearchArgs {
    /// movie, news, user or admin
    #[arg(long, default_value = "movie")]
    screen: ScreenKind,

    #[arg(short, long, default_value = "")]
    query: String,

    /// Filter as key=value (lists comma-separated, ranges lo,hi)
    #[arg(short, long = "filter")]
    filters: Vec<String>,

    #[arg(short, long, default_value_t = 1)]
    page: u32,

    /// Print the session as JSON
    #[arg(long)]
    json: bool,

    /// Print screen events as JSON lines
    #[arg(long)]
    events: bool,

    /// Back up the settled session for a later --resume
    #[arg(long)]
    save_session: bool,

    /// Restore the backed-up session instead of searching
    #[arg(long)]
    resume: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let overrides = ConfigOverrides {
        config_path: cli.config.clone(),
        api_base_url: cli.api_base_url.clone(),
        image_base_url: None,
        log_level: cli.log_level.clone(),
    };
    let config = ConfigResolver::new("reel-search").resolve(&overrides);

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("reel_search={0},reel_common={0}", config.log_level).into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    info!("Starting reel-search v{}", env!("CARGO_PKG_VERSION"));
    debug!(api_base_url = %config.api_base_url, "Configuration resolved");

    match cli.command {
        Command::Search(args) => run_search(&config, args).await,
        Command::Lookup { name, text, json } => run_lookup(&config, name, &text, json).await,
    }
}

async fn run_search(config: &ResolvedConfig, args: SearchArgs) -> Result<()> {
    let profile = ScreenProfile::for_kind(args.screen).context("Invalid screen profile")?;
    let backup: Arc<dyn BackupStore> = Arc::new(FileBackupStore::new(&config.backup_dir));
    let history: Arc<dyn History> = Arc::new(MemoryHistory::new());
    let event_bus = EventBus::new(256);
    let mut events = event_bus.subscribe();

    let screen = http_screen(config, profile, backup, Arc::clone(&history), event_bus)
        .context("Failed to create search service")?;

    let query = location_query(&args)?;
    let incoming = if args.resume {
        IncomingNavigation::reload(query)
    } else {
        IncomingNavigation::push(query)
    };
    let outcome = screen.mount(&incoming).await;
    info!(outcome = ?outcome, url_query = %history.query(), "Screen settled");

    if args.save_session {
        screen
            .navigate_to_detail()
            .await
            .context("Failed to capture session")?;
        info!(dir = %config.backup_dir.display(), "Session backed up");
    }

    if args.events {
        while let Ok(event) = events.try_recv() {
            println!("{}", serde_json::to_string(&event)?);
        }
    }

    let session = screen.session().await;
    if args.json {
        println!("{}", serde_json::to_string_pretty(&session)?);
    } else {
        print_session(&session);
    }

    if session.state == SessionState::Error {
        bail!(session.error_message.unwrap_or_else(|| "Search failed".to_string()));
    }
    Ok(())
}

async fn run_lookup(config: &ResolvedConfig, name: LookupName, text: &str, json: bool) -> Result<()> {
    let gateway = LookupGateway::with_http_clients(
        &config.api_base_url,
        &config.image_base_url,
        config.http_timeout,
    )
    .context("Failed to create lookup clients")?;

    let entities = gateway.search(name, text, 1, config.lookup_page_size).await;
    if json {
        println!("{}", serde_json::to_string_pretty(&entities)?);
        return Ok(());
    }

    for entity in &entities {
        if entity.description.is_empty() {
            println!("{}\t{}", entity.id, entity.name);
        } else {
            println!("{}\t{}\t({})", entity.id, entity.name, entity.description);
        }
    }
    Ok(())
}

/// URL query string for the search arguments, read back by the deep-link path
fn location_query(args: &SearchArgs) -> reel_common::Result<String> {
    let mut serializer = form_urlencoded::Serializer::new(String::new());
    if !args.query.trim().is_empty() {
        serializer.append_pair(URL_QUERY_KEY, args.query.trim());
    }
    if args.page > 1 {
        serializer.append_pair(URL_PAGE_KEY, &args.page.to_string());
    }
    for filter in &args.filters {
        let (key, value) = filter
            .split_once('=')
            .filter(|(key, _)| !key.trim().is_empty())
            .ok_or_else(|| Error::InvalidInput(format!("filter '{}' is not key=value", filter)))?;
        serializer.append_pair(key.trim(), value.trim());
    }
    Ok(serializer.finish())
}

fn print_session(session: &SearchSession) {
    match session.state {
        SessionState::Idle => {
            println!("Nothing to search for: enter a query or set a filter.");
            return;
        }
        SessionState::Error => {
            if let Some(message) = &session.error_message {
                println!("{}", message);
            }
            return;
        }
        _ => {}
    }

    println!(
        "Page {} of {} ({} results)",
        session.page,
        session.total_pages.max(1),
        session.total_results
    );
    for row in &session.results {
        let label = ["title", "name", "displayName", "username", "headline"]
            .iter()
            .find_map(|field| row.get(*field).and_then(|v| v.as_str()))
            .map(str::to_string)
            .unwrap_or_else(|| row.to_string());
        match row.get("id") {
            Some(id) => println!("{}\t{}", id, label),
            None => println!("{}", label),
        }
    }
}

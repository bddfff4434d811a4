//! CLI shell: `serve` (default) runs the HTTP gateway, `migrate` applies
//! the idempotent schema DDL and exits. Grounded on the teacher's
//! `cli/commands.rs` `Cli`/`Commands` shape and `is_verbose()` helper,
//! trimmed to this service's two operations.

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};

use crate::auth::AuthService;
use crate::config::Settings;
use crate::events::BroadcastNotifier;
use crate::ingester::upstream::XkcdClient;
use crate::ingester::Ingester;
use crate::index::{self, InvertedIndex};
use crate::repository::CorpusRepository;
use crate::search::SearchEngine;
use crate::server::AppState;

#[derive(Parser)]
#[command(name = "xkcd-search")]
#[command(about = "Faceted search service for the XKCD comic corpus")]
#[command(version)]
pub struct Cli {
    /// Path to an optional YAML config file.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP gateway (default if no subcommand is given).
    Serve,
    /// Apply the idempotent schema DDL and exit.
    Migrate,
}

pub fn is_verbose() -> bool {
    std::env::args().any(|arg| arg == "-v" || arg == "--verbose")
}

pub async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let settings = Settings::load(cli.config.as_deref())?;

    match cli.command.unwrap_or(Commands::Serve) {
        Commands::Serve => serve(settings).await,
        Commands::Migrate => migrate(settings).await,
    }
}

async fn migrate(settings: Settings) -> anyhow::Result<()> {
    let db_path = PathBuf::from(&settings.store.database_path);
    CorpusRepository::new(&db_path)?;
    tracing::info!(path = %db_path.display(), "schema up to date");
    Ok(())
}

async fn serve(settings: Settings) -> anyhow::Result<()> {
    let db_path = PathBuf::from(&settings.store.database_path);
    let store: Arc<dyn crate::repository::Store> = Arc::new(CorpusRepository::new(&db_path)?);

    let upstream = Arc::new(XkcdClient::new(
        settings.ingester.upstream_base_url.clone(),
        settings.ingester.fetch_timeout(),
    )?);

    let notifier = BroadcastNotifier::new();

    let ingester = Arc::new(Ingester::new(
        Arc::clone(&store),
        upstream as Arc<dyn crate::ingester::upstream::UpstreamSource>,
        Arc::clone(&notifier) as Arc<dyn crate::events::Notifier>,
        settings.ingester.fetch_concurrency,
    ));

    let index = Arc::new(InvertedIndex::new());
    let search_engine = Arc::new(SearchEngine::new(Arc::clone(&store), Arc::clone(&index)));

    let auth = Arc::new(AuthService::new(
        &settings.credentials,
        settings.gateway.token_ttl_secs,
    ));

    tokio::spawn(index::run_rebuild_loop(
        Arc::clone(&index),
        Arc::clone(&store),
        Arc::clone(&notifier) as Arc<dyn crate::events::Notifier>,
        settings.search.index_ttl(),
    ));

    let state = AppState::new(store, ingester, search_engine, auth, &settings);
    crate::server::serve(state, &settings.gateway.listen_addr).await
}

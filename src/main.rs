use anyhow::Context;
use std::net::SocketAddr;
use std::sync::Arc;
use vault_ledger::{api, init_db, Config, Journal, LedgerService, Repository, SystemClock};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing_subscriber::filter::LevelFilter::INFO.into()),
        )
        .init();

    let config = Config::from_env().context("configuration error")?;
    let port = config.port;

    let pool = init_db(&config.database_path)
        .await
        .with_context(|| format!("failed to open database at {}", config.database_path))?;
    let journal: Arc<dyn Journal> = Arc::new(Repository::new(pool));

    // Replays the journal, or seeds it from the environment on first start.
    let ledger = LedgerService::open(
        journal,
        Arc::new(SystemClock),
        config.ledger_settings(),
        config.page_size_limit,
    )
    .await
    .context("failed to restore ledger from journal")?;

    let app = api::create_router(api::AppState::new(ledger));

    let addr = SocketAddr::from(([127, 0, 0, 1], port));
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind to {}", addr))?;

    tracing::info!("Server listening on {}", addr);

    axum::serve(listener, app).await.context("server error")?;
    Ok(())
}

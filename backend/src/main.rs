mod api;
mod config;
mod db;
mod errors;
mod models;
mod state;
mod verifier;

use crate::config::Config;
use crate::errors::StartupError;
use crate::state::AppState;
use shielded_ledger::{Ledger, LedgerConfig, Relation};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), StartupError> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = Config::from_env()?;

    // Local state (journal + keys) lives under the data dir.
    std::fs::create_dir_all(&config.data_dir)?;

    let db_path = config.data_dir.join("ledger.sqlite");
    let db_url = format!("sqlite:{}?mode=rwc", db_path.to_string_lossy());

    let db = db::connect(&db_url).await?;
    db::init_schema(&db).await?;

    let mint_verifier = state::load_verifier(&db, &config.data_dir, Relation::Mint).await?;
    let transfer_verifier = state::load_verifier(&db, &config.data_dir, Relation::Transfer).await?;

    let registry = db::load_registry(&db).await?;
    let restored = registry.commitment_count();

    let ledger = Ledger::with_registry(
        LedgerConfig {
            admin: config.admin,
            mint_verifier,
            transfer_verifier,
        },
        registry,
    )?;
    tracing::info!(commitments = restored, admin = %config.admin, "ledger restored");

    let state = AppState::new(db, config.api_key.as_str(), ledger);

    let app = api::router(state);

    let listener = tokio::net::TcpListener::bind(&config.addr).await?;

    tracing::info!(addr = %config.addr, "backend listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
        })
        .await?;

    Ok(())
}

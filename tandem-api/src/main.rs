use std::sync::Arc;

use tandem_api::config::{AppConfig, StoreBackend};
use tandem_api::store::memory::MemoryStore;
use tandem_api::store::postgres::PgStore;
use tandem_api::store::Store;
use tandem_api::{build_router, AppState};
use tandem_shared::clients::db::create_pool;
use tandem_shared::middleware::{init_metrics, init_tracing};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing("tandem-api");

    let config = AppConfig::load()?;
    let port = config.port;

    let store: Arc<dyn Store> = match config.store_backend {
        StoreBackend::Postgres => {
            let pool = create_pool(&config.database_url, config.db_pool_size)?;
            Arc::new(PgStore::new(pool))
        }
        StoreBackend::Memory => {
            tracing::warn!("using in-memory store; data is lost on restart");
            Arc::new(MemoryStore::new())
        }
    };

    let metrics_handle = init_metrics()?;
    let state = Arc::new(AppState::new(store, config).with_metrics(metrics_handle));
    let app = build_router(state);

    let addr = format!("0.0.0.0:{port}");
    tracing::info!(addr = %addr, "tandem-api starting");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

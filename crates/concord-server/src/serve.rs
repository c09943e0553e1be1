use crate::config::ConcordConfig;
use crate::http::{self, AppState};
use concord_core::{EntityStore, RedbEntityStore};
use std::sync::Arc;
use tracing::{error, info};

/// Opens the candidate store, logging and continuing without one when it
/// cannot be opened.
pub fn open_store(config: &ConcordConfig) -> Option<Arc<dyn EntityStore>> {
    let db_path = config.db_path();
    match RedbEntityStore::open(&db_path) {
        Ok(store) => {
            match store.count() {
                Ok(n) => info!("Candidate store loaded from {:?}: {} entities", store.path(), n),
                Err(e) => error!("Failed to count entities: {}", e),
            }
            Some(Arc::new(store))
        }
        Err(e) => {
            error!("Failed to open candidate store at {:?}: {}", db_path, e);
            error!("Continuing without a store; candidate lookups use the sample set");
            None
        }
    }
}

pub async fn run(config: ConcordConfig) -> anyhow::Result<()> {
    info!("Starting Concord server v{}", env!("CARGO_PKG_VERSION"));
    info!("HTTP: {}", config.server.http_addr);
    info!("Data: {:?}", config.server.data_dir);

    let errors = config.validate();
    if !errors.is_empty() {
        anyhow::bail!("Invalid configuration:\n  - {}", errors.join("\n  - "));
    }

    info!("Opening database...");
    let store = open_store(&config);
    let oracle = config.build_oracle()?;
    let orchestrator = config.build_orchestrator(store, oracle);

    let app = http::create_router(AppState::new(orchestrator));
    let addr = config.server.http_addr;

    let mut http_task = tokio::spawn(async move {
        info!("Starting HTTP server on {}", addr);
        let listener = tokio::net::TcpListener::bind(addr).await?;
        axum::serve(listener, app).await?;
        Ok::<_, std::io::Error>(())
    });

    info!("Concord server ready");

    tokio::select! {
        signal = tokio::signal::ctrl_c() => {
            signal?;
            info!("Shutdown signal received, terminating...");
            http_task.abort();
            Ok(())
        }
        joined = &mut http_task => {
            match joined? {
                Ok(()) => Ok(()),
                Err(e) => {
                    error!("HTTP server failed: {}", e);
                    Err(e.into())
                }
            }
        }
    }
}

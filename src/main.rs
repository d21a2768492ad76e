use std::sync::Arc;

use tokio::net::TcpListener;
use tracing::info;

use hotelier::engine::Engine;
use hotelier::http::{self, AppState};
use hotelier::maintenance;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt::init();

    let metrics_port: Option<u16> = std::env::var("HOTELIER_METRICS_PORT")
        .ok()
        .and_then(|s| s.parse().ok());
    hotelier::observability::init(metrics_port);

    let port = std::env::var("HOTELIER_PORT").unwrap_or_else(|_| "8080".into());
    let bind = std::env::var("HOTELIER_BIND").unwrap_or_else(|_| "0.0.0.0".into());
    let data_dir = std::env::var("HOTELIER_DATA_DIR").unwrap_or_else(|_| "./data".into());
    let compact_threshold: u64 = std::env::var("HOTELIER_COMPACT_THRESHOLD")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(1000);

    // Ensure data directory exists
    std::fs::create_dir_all(&data_dir)?;

    let wal_path = std::path::Path::new(&data_dir).join("hotelier.wal");
    let engine = Arc::new(Engine::new(wal_path)?);
    metrics::gauge!(hotelier::observability::ROOMS).set(engine.room_count() as f64);

    let compactor_engine = engine.clone();
    tokio::spawn(async move {
        maintenance::run_compactor(compactor_engine, compact_threshold).await;
    });

    let app = http::create_router(AppState { engine: engine.clone() });

    let addr = format!("{bind}:{port}");
    let listener = TcpListener::bind(&addr).await?;
    info!("hotelier listening on {addr}");
    info!("  data_dir: {data_dir}");
    info!("  rooms restored: {}", engine.room_count());
    info!("  compact_threshold: {compact_threshold}");
    info!("  metrics: {}", metrics_port.map_or("disabled".to_string(), |p| format!("http://0.0.0.0:{p}/metrics")));

    // Graceful shutdown: finish in-flight requests on SIGTERM/ctrl-c
    let shutdown = async {
        let ctrl_c = tokio::signal::ctrl_c();
        #[cfg(unix)]
        {
            let mut sigterm =
                tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
                    .expect("failed to register SIGTERM handler");
            tokio::select! {
                _ = ctrl_c => {}
                _ = sigterm.recv() => {}
            }
        }
        #[cfg(not(unix))]
        {
            ctrl_c.await.ok();
        }
    };

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await?;

    info!("hotelier stopped");
    Ok(())
}

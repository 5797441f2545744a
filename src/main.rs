use std::error::Error;
use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use tokio::signal;
use tokio::sync::oneshot;

use vitalsnap::api::rest::RestApi;
use vitalsnap::cache::{Cache, MemoryCache};
use vitalsnap::config::load_config;
use vitalsnap::observation::store::ObservationStore;
use vitalsnap::observation::vitals::VitalsExtractor;
use vitalsnap::rounds::{self, LogRoundSink, RoundSink};

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .init();

    let config = load_config(Path::new("config.yaml"))?;
    log::info!(
        "Starting vitalsnap with store key '{}' and staleness threshold {}ms",
        config.observations_store_key,
        config.staleness_threshold_ms
    );

    let cache: Arc<dyn Cache> = Arc::new(MemoryCache::new());
    let store = Arc::new(ObservationStore::new(
        cache,
        config.observations_store_key.clone(),
        config.retention_window(),
    ));
    let extractor = Arc::new(VitalsExtractor::new(
        Arc::clone(&store),
        config.staleness_window(),
        config.reference_timezone,
    ));
    let api = RestApi::new(Arc::clone(&store), Arc::clone(&extractor));

    let sink: Arc<dyn RoundSink> = Arc::new(LogRoundSink);
    let rounds_task = tokio::spawn(rounds::run_automated_rounds(
        Arc::clone(&extractor),
        sink,
        config.rounds.devices.clone(),
        Duration::from_secs(config.rounds.interval_secs),
    ));

    let addr: SocketAddr = format!("{}:{}", config.api.host, config.api.port).parse()?;
    log::info!("Serving on {}", addr);

    let (shutdown_tx, shutdown_rx) = oneshot::channel();
    let routes = api.routes();
    let (_, server) = warp::serve(routes).bind_with_graceful_shutdown(addr, async move {
        shutdown_rx.await.ok();
        log::info!("Shutting down server");
    });
    let server_handle = tokio::spawn(server);

    signal::ctrl_c().await?;
    log::info!("Ctrl+C received, starting graceful shutdown");

    shutdown_tx.send(()).ok();
    rounds_task.abort();
    server_handle.await?;

    log::info!("Shutdown complete");
    Ok(())
}

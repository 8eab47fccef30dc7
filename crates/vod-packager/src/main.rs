//! Packager worker binary.

use std::sync::Arc;

use tracing::{error, info};

use vod_bus::{Bus, BusConfig, Publisher};
use vod_packager::{PackageHandler, PackagerConfig, Processor, QUEUE, ROUTING_KEYS};
use vod_storage::ObjectStore;
use vod_worker::{init_tracing, shutdown_signal, Worker};

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    init_tracing("vod-packager");

    let config = match PackagerConfig::from_env() {
        Ok(c) => c,
        Err(e) => {
            error!("Failed to load config: {}", e);
            std::process::exit(1);
        }
    };
    info!("Packager config: {:?}", config);

    let store = match ObjectStore::from_env().await {
        Ok(s) => s,
        Err(e) => {
            error!("Failed to create object store client: {}", e);
            std::process::exit(1);
        }
    };

    let bus_config = match BusConfig::from_env() {
        Ok(c) => c,
        Err(e) => {
            error!("Failed to load bus config: {}", e);
            std::process::exit(1);
        }
    };
    let bus = match Bus::connect(bus_config).await {
        Ok(b) => b,
        Err(e) => {
            error!("Failed to connect to broker: {}", e);
            std::process::exit(1);
        }
    };
    if let Err(e) = bus.declare_topology(QUEUE, ROUTING_KEYS).await {
        error!("Failed to declare topology: {}", e);
        std::process::exit(1);
    }
    let publisher = match Publisher::new(&bus).await {
        Ok(p) => p,
        Err(e) => {
            error!("Failed to create publisher: {}", e);
            std::process::exit(1);
        }
    };

    let handler = PackageHandler::new(Processor::new(config, store));
    let worker = Arc::new(Worker::new(QUEUE, handler, publisher));

    let signal_worker = Arc::clone(&worker);
    tokio::spawn(async move {
        shutdown_signal().await;
        info!("Received shutdown signal");
        signal_worker.shutdown();
    });

    if let Err(e) = worker.run(&bus).await {
        error!("Worker error: {}", e);
        std::process::exit(1);
    }

    info!("Packager shutdown complete");
}

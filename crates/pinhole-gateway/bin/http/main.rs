mod cli;

use crate::cli::CLI;
use clap::Parser;
use pinhole_gateway::{App, AppState};
use pinhole_generator::RandomGenerator;
use pinhole_shortener::ShortenerService;
use pinhole_storage::create_store;
use std::sync::Arc;
use tracing::info;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt::init();

    let config = CLI::try_parse()?;

    info!(
        listen_addr = %config.listen_addr,
        base_url = %config.base_url,
        storage_backend = %config.storage,
        "starting gateway server"
    );

    let store = create_store(config.storage_config()?).await?;
    let service = Arc::new(ShortenerService::new(
        store,
        RandomGenerator::new(),
        config.base_url.clone(),
    ));

    let router = App::router(AppState::new(Arc::clone(&service)));
    let listener = tokio::net::TcpListener::bind(config.listen_addr).await?;

    axum::serve(listener, router)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("shutdown signal received");
        })
        .await?;

    // Drain the deletion queue, flush the store, release the file lock.
    service.shutdown().await?;
    info!("gateway stopped");

    Ok(())
}

mod cli;
mod server;

use crate::cli::CLI;
use crate::server::ShortenerGrpcServer;
use clap::Parser;
use pinhole_generator::RandomGenerator;
use pinhole_proto_schema::v1::shortener_service_server::ShortenerServiceServer;
use pinhole_shortener::ShortenerService;
use pinhole_storage::create_store;
use std::sync::Arc;
use tonic::transport::Server;
use tracing::info;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt::init();

    let config = CLI::try_parse()?;

    info!(
        listen_addr = %config.listen_addr,
        base_url = %config.base_url,
        storage_backend = %config.storage,
        "starting shortener gRPC server"
    );

    let store = create_store(config.storage_config()?).await?;
    let service = Arc::new(ShortenerService::new(
        store,
        RandomGenerator::new(),
        config.base_url.clone(),
    ));

    let grpc = ShortenerGrpcServer::new(Arc::clone(&service));

    let (health_reporter, health_service) = tonic_health::server::health_reporter();
    health_reporter
        .set_serving::<ShortenerServiceServer<ShortenerGrpcServer<RandomGenerator>>>()
        .await;

    Server::builder()
        .add_service(health_service)
        .add_service(ShortenerServiceServer::new(grpc))
        .serve_with_shutdown(config.listen_addr, async {
            let _ = tokio::signal::ctrl_c().await;
            info!("shutdown signal received");
        })
        .await?;

    // Drain the deletion queue, flush the store, release the file lock.
    service.shutdown().await?;
    info!("shortener stopped");

    Ok(())
}

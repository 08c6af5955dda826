use std::time::Duration;

use actix_web::{App, HttpServer, web};
use log::{error, info};

use photo_uploader::app_state::AppState;
use photo_uploader::config::AppConfig;
use photo_uploader::{logging, service};

fn main() -> std::io::Result<()> {
    let config = AppConfig::load().map_err(|e| std::io::Error::other(format!("Failed to load configuration: {}", e)))?;
    logging::init(&config.logging.config_file);

    // Photo tasks need real parallelism; actix workers are single threaded
    let ingest_runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(config.server.ingest_workers.max(1))
        .thread_name("ingest-worker")
        .enable_all()
        .build()?;

    let app_state = AppState::from_config(config.clone(), ingest_runtime.handle().clone()).map_err(|e| {
        error!("Failed to initialize application state: {}", e);
        std::io::Error::other(e.to_string())
    })?;

    let bind = (config.server.host.clone(), config.server.port);
    info!("Starting server on {}:{}", bind.0, bind.1);

    let result = actix_web::rt::System::new().block_on(async move {
        let data = web::Data::new(app_state);
        HttpServer::new(move || {
            App::new()
                .wrap(actix_web::middleware::Logger::default())
                .app_data(data.clone())
                .configure(service::configure)
        })
        .workers(config.server.workers.max(1))
        .bind(bind)?
        .run()
        .await
    });

    info!("Server stopped, waiting for in-flight photo tasks");
    ingest_runtime.shutdown_timeout(Duration::from_secs(30));
    result
}

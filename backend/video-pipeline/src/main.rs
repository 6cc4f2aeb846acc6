/// API Gateway - HTTP entry point for the video pipeline
///
/// Accepts uploads (the ingest stage), serves the status query read model,
/// and hands finished artifacts back to clients. Everything downstream runs
/// in the worker binaries and talks to this process only through the queues
/// and the status record.
use std::sync::Arc;

use actix_web::{middleware, web, App, HttpResponse, HttpServer};
use sqlx::postgres::PgPoolOptions;

use video_pipeline::handlers;
use video_pipeline::queue::PipelineProducer;
use video_pipeline::services::IngestService;
use video_pipeline::storage::StoragePaths;
use video_pipeline::Config;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let config = Config::from_env().expect("Failed to load configuration");
    let bind_address = format!("{}:{}", config.app.host, config.app.port);

    let db_pool = PgPoolOptions::new()
        .max_connections(config.database.max_connections)
        .connect(&config.database.url)
        .await
        .expect("Failed to connect to database");

    sqlx::migrate!("./migrations")
        .run(&db_pool)
        .await
        .expect("Failed to run migrations");

    let storage = StoragePaths::new(&config.storage);
    storage
        .ensure_roots()
        .await
        .expect("Failed to create storage roots");

    let producer = PipelineProducer::new(
        &config.kafka.brokers,
        &config.kafka.transcode_topic,
        &config.kafka.thumbnail_topic,
    )
    .expect("Failed to create Kafka producer");

    let ingest = web::Data::new(IngestService::new(
        db_pool.clone(),
        storage.clone(),
        Arc::new(producer),
    ));
    let storage = web::Data::new(storage);
    let db_pool = web::Data::new(db_pool);

    tracing::info!(address = %bind_address, "API gateway starting");

    HttpServer::new(move || {
        App::new()
            .app_data(db_pool.clone())
            .app_data(ingest.clone())
            .app_data(storage.clone())
            .wrap(middleware::Logger::default())
            .route(
                "/health",
                web::get()
                    .to(|| async { HttpResponse::Ok().json(serde_json::json!({"status": "healthy"})) }),
            )
            .service(
                web::scope("/api/v1/videos")
                    .route("", web::post().to(handlers::upload_video))
                    .route("", web::get().to(handlers::list_videos))
                    .route("/{id}", web::get().to(handlers::get_video))
                    .route("/{id}", web::delete().to(handlers::delete_video))
                    .route("/{id}/download", web::get().to(handlers::download_video))
                    .route("/{id}/stream/{quality}", web::get().to(handlers::stream_video))
                    .route("/{id}/thumbnail", web::get().to(handlers::get_thumbnail)),
            )
    })
    .bind(&bind_address)?
    .run()
    .await
}

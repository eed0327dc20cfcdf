use std::sync::Arc;

use anyhow::Context;
use common::StorageBackend;
use common::storage::ObjectStore;
use common::storage::filesystem::FilesystemObjectStore;
use common::storage::s3::S3ObjectStore;
use server::config::AppConfig;
use server::ingest::IngestPipeline;
use server::ingest::category::CategorySchema;
use server::repository::SeaOrmComponentStore;
use server::state::AppState;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let config = AppConfig::load().context("Failed to load config")?;

    let schema = CategorySchema::standard(&config.ingest.file_field_suffix)
        .context("Invalid category schema")?;
    let fields: Vec<String> = schema
        .file_fields()
        .map(|(category, field)| format!("{field} -> {category}"))
        .collect();
    info!(?fields, "Evidence categories configured");

    let db = server::database::init_db(&config.database.url)
        .await
        .context("Failed to initialize database")?;
    info!("Database connected");

    let objects = build_object_store(&config)
        .await
        .context("Failed to initialize object store")?;
    info!(backend = ?config.storage.backend, "Object store ready");

    let records = Arc::new(SeaOrmComponentStore::new(db));
    let pipeline = IngestPipeline::new(
        Arc::new(schema),
        objects,
        records.clone(),
        config.ingest.upload_concurrency,
    );

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let state = AppState {
        config,
        pipeline: Arc::new(pipeline),
        records,
    };
    let app = server::build_router(state);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    info!("Server running at http://{}", addr);
    axum::serve(listener, app).await?;

    Ok(())
}

async fn build_object_store(config: &AppConfig) -> anyhow::Result<Arc<dyn ObjectStore>> {
    let storage = &config.storage;
    Ok(match storage.backend {
        StorageBackend::S3 => {
            let s3 = storage
                .s3
                .as_ref()
                .context("storage.backend is 's3' but [storage.s3] is missing")?;
            Arc::new(S3ObjectStore::new(s3, &storage.retry)?)
        }
        StorageBackend::Filesystem => Arc::new(
            FilesystemObjectStore::new(
                storage.filesystem.root.clone(),
                storage.filesystem.public_url.clone(),
            )
            .await?,
        ),
    })
}

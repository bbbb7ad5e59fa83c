//! Voice-clone REST API server.

use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use vox_api::config::ServiceConfig;
use vox_api::layout::DataLayout;
use vox_api::server::{self, AppState};
use vox_api::shutdown;
use vox_convert::{CommandModelLoader, FfmpegMerger, ToneColorAdapter};
use vox_fetch::HttpAudioFetcher;
use vox_scheduler::{InMemoryJobStore, InMemoryScheduler, Pipeline, TimestampIdGenerator};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = ServiceConfig::from_env()?;
    let layout = DataLayout::new(&config.data_dir);
    layout.create_all().await?;
    tracing::info!(
        data_dir = %layout.root().display(),
        device = %config.device,
        max_concurrent_jobs = config.max_concurrent_jobs,
        "configuration loaded"
    );

    let loader = CommandModelLoader::from_command_line(
        &config.converter_command,
        &config.checkpoint_dir,
    );
    let converter = Arc::new(ToneColorAdapter::new(Arc::new(loader), config.device));
    let merger = Arc::new(FfmpegMerger::new(config.ffmpeg_bin.clone()));
    let pipeline = Arc::new(Pipeline::new(
        converter.clone(),
        merger,
        layout.processed(),
    ));
    let scheduler = Arc::new(InMemoryScheduler::new(
        Arc::new(InMemoryJobStore::new()),
        pipeline,
        config.max_concurrent_jobs,
    ));
    let state = Arc::new(AppState {
        scheduler,
        fetcher: Arc::new(HttpAudioFetcher::new()),
        ids: Arc::new(TimestampIdGenerator::new()),
        layout,
    });

    let app = server::router(state);
    tracing::info!("voice clone API listening on {}", config.listen);
    axum::serve(
        tokio::net::TcpListener::bind(config.listen).await?,
        app.into_make_service(),
    )
    .with_graceful_shutdown(shutdown::shutdown_signal())
    .await?;

    converter.shutdown().await?;
    Ok(())
}

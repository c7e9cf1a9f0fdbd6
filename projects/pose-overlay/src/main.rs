mod cli;
mod pipeline;
mod pose;
mod video;
mod web;

use anyhow::{Context, Result};
use cli::Args;
use pipeline::{ProcessPipeline, ScratchLayout};
use pose::UslsPoseEstimator;
use std::sync::Arc;
use video::writer::OpencvVideoEncoder;
use web::server::run_server;
use web::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from .env if present
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::fmt::init();

    let args = Args::parse_args();

    let layout = ScratchLayout::new(&args.upload_root, &args.result_root);
    layout.ensure().context("Failed to prepare scratch directories")?;

    let estimator = UslsPoseEstimator::new(
        &args.model,
        args.min_confidence,
        args.keypoint_confidence,
    )
    .with_context(|| format!("Failed to load pose model {}", args.model))?;

    let pipeline = ProcessPipeline::new(
        Arc::new(estimator),
        Arc::new(OpencvVideoEncoder),
        layout,
    )
    .retain_artifacts(args.retain_artifacts);
    let state = AppState::new(pipeline, &args);

    run_server(args.host, args.port, state).await?;

    Ok(())
}

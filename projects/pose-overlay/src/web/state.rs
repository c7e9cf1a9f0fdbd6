//! Application state.

use std::sync::Arc;

use crate::cli::Args;
use crate::pipeline::ProcessPipeline;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub pipeline: Arc<ProcessPipeline>,
    pub expose_error_details: bool,
}

impl AppState {
    pub fn new(pipeline: ProcessPipeline, args: &Args) -> Self {
        Self {
            pipeline: Arc::new(pipeline),
            expose_error_details: args.expose_error_details,
        }
    }
}

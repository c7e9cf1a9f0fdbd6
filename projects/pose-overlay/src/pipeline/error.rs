//! Error taxonomy for the upload-process-respond pipeline.

use std::path::PathBuf;
use thiserror::Error;

pub type PipelineResult<T> = Result<T, PipelineError>;

/// Each variant carries the internal diagnostic; `Display` gives the full
/// detail, `summary` the part that is safe to show without it.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("{0}")]
    InvalidRequest(String),

    #[error("Failed to save the file: {0}")]
    Storage(String),

    #[error("Model prediction failed: {0}")]
    Inference(String),

    #[error("Processing results failed: {0}")]
    Render(String),

    #[error("Processed video file not found")]
    OutputMissing(PathBuf),
}

impl PipelineError {
    pub fn invalid_request(msg: impl Into<String>) -> Self {
        Self::InvalidRequest(msg.into())
    }

    pub fn storage(err: impl std::fmt::Display) -> Self {
        Self::Storage(err.to_string())
    }

    /// Uses the alternate form so the whole `anyhow` context chain is kept.
    pub fn inference(err: anyhow::Error) -> Self {
        Self::Inference(format!("{:#}", err))
    }

    pub fn render(err: anyhow::Error) -> Self {
        Self::Render(format!("{:#}", err))
    }

    pub fn kind(&self) -> &'static str {
        match self {
            PipelineError::InvalidRequest(_) => "InvalidRequest",
            PipelineError::Storage(_) => "StorageError",
            PipelineError::Inference(_) => "InferenceError",
            PipelineError::Render(_) => "RenderError",
            PipelineError::OutputMissing(_) => "OutputMissing",
        }
    }

    /// Client-correctable failures; everything else is server-side.
    pub fn is_client_error(&self) -> bool {
        matches!(self, PipelineError::InvalidRequest(_))
    }

    pub fn summary(&self) -> String {
        match self {
            PipelineError::InvalidRequest(msg) => msg.clone(),
            PipelineError::Storage(_) => "Failed to save the file".to_string(),
            PipelineError::Inference(_) => "Model prediction failed".to_string(),
            PipelineError::Render(_) => "Processing results failed".to_string(),
            PipelineError::OutputMissing(_) => self.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detail_and_summary() {
        let err = PipelineError::inference(anyhow::anyhow!("bad header").context("open clip.mp4"));
        assert_eq!(err.kind(), "InferenceError");
        assert_eq!(
            err.to_string(),
            "Model prediction failed: open clip.mp4: bad header"
        );
        assert_eq!(err.summary(), "Model prediction failed");
        assert!(!err.is_client_error());
    }

    #[test]
    fn test_invalid_request_is_client_error() {
        let err = PipelineError::invalid_request("No selected file");
        assert!(err.is_client_error());
        assert_eq!(err.to_string(), "No selected file");
        assert_eq!(err.summary(), "No selected file");
    }

    #[test]
    fn test_output_missing_detail() {
        let err = PipelineError::OutputMissing(PathBuf::from("/tmp/result/x/clip.mp4"));
        assert_eq!(err.to_string(), "Processed video file not found");
        assert_eq!(err.summary(), "Processed video file not found");
    }
}

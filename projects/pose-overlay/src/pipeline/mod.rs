// Upload -> inference -> render/encode -> respond pipeline

pub mod error;
pub mod scratch;
#[cfg(test)]
pub mod testing;

use crate::pose::{FrameResult, PoseEstimator};
use crate::video::{FrameSink, StreamSpec, VideoEncoder};
use anyhow::Context;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use uuid::Uuid;

pub use error::{PipelineError, PipelineResult};
pub use scratch::{FrameScratch, RequestArtifacts, ScratchLayout};

pub const OUTPUT_FPS: f64 = 20.0;
pub const OUTPUT_FOURCC: [char; 4] = ['m', 'p', '4', 'v'];
pub const DOWNLOAD_PREFIX: &str = "ok_";

/// A finalized output video, ready to be streamed back. Read `path` before
/// dropping it: unretained artifacts go away with the value.
#[derive(Debug)]
pub struct ProcessedVideo {
    pub request_id: Uuid,
    pub path: PathBuf,
    pub download_name: String,
    pub frames: usize,
    _artifacts: RequestArtifacts,
}

pub struct ProcessPipeline {
    estimator: Arc<dyn PoseEstimator>,
    encoder: Arc<dyn VideoEncoder>,
    layout: ScratchLayout,
    retain_artifacts: bool,
}

impl ProcessPipeline {
    pub fn new(
        estimator: Arc<dyn PoseEstimator>,
        encoder: Arc<dyn VideoEncoder>,
        layout: ScratchLayout,
    ) -> Self {
        Self {
            estimator,
            encoder,
            layout,
            retain_artifacts: true,
        }
    }

    /// Whether uploads and outputs outlive the request. Defaults to `true`.
    pub fn retain_artifacts(mut self, retain: bool) -> Self {
        self.retain_artifacts = retain;
        self
    }

    /// Run one upload through the whole pipeline. Blocking; call from a
    /// blocking-capable thread.
    pub fn handle(&self, file_name: &str, bytes: &[u8]) -> PipelineResult<ProcessedVideo> {
        if file_name.is_empty() {
            return Err(PipelineError::invalid_request("No selected file"));
        }

        let request_id = Uuid::new_v4();
        let started = Instant::now();
        let stored_name = stored_file_name(file_name)?;
        tracing::info!(%request_id, file_name, size = bytes.len(), "Processing upload");

        let upload_dir = self.layout.upload_dir(&request_id);
        let output_dir = self.layout.output_dir(&request_id);
        let artifacts =
            RequestArtifacts::new(upload_dir.clone(), output_dir.clone(), self.retain_artifacts);

        // 1. Persist upload
        let upload_path = upload_dir.join(stored_name);
        fs::create_dir_all(&upload_dir)
            .and_then(|_| fs::write(&upload_path, bytes))
            .map_err(PipelineError::storage)?;

        // 2. Inference, no retry
        let results = self
            .estimator
            .predict(&upload_path)
            .map_err(PipelineError::inference)?;
        tracing::info!(%request_id, frames = results.len(), "Inference finished");

        // 3. Render + encode; the scratch guard is released on every exit path
        let output_path = output_dir.join(stored_name);
        let frames = {
            let scratch = FrameScratch::acquire(self.layout.frames_root(), &request_id);
            tracing::debug!(%request_id, scratch = %scratch.path().display(), "Frame scratch acquired");
            self.encode(results, &output_path)
        }?;

        // 4. Guard against encoders that fail silently
        if !output_path.exists() {
            return Err(PipelineError::OutputMissing(output_path));
        }

        tracing::info!(
            %request_id,
            frames,
            elapsed_ms = started.elapsed().as_millis() as u64,
            output = %output_path.display(),
            "Processed video ready"
        );

        Ok(ProcessedVideo {
            request_id,
            path: output_path,
            download_name: format!("{}{}", DOWNLOAD_PREFIX, file_name),
            frames,
            _artifacts: artifacts,
        })
    }

    /// Returns the number of frames written. Zero results open no stream.
    fn encode(
        &self,
        results: Vec<Box<dyn FrameResult>>,
        output_path: &Path,
    ) -> PipelineResult<usize> {
        let Some(first) = results.first() else {
            tracing::warn!("Model produced no frames, nothing to encode");
            return Ok(0);
        };

        let (height, width) = first.orig_shape();
        let spec = StreamSpec {
            fourcc: OUTPUT_FOURCC,
            fps: OUTPUT_FPS,
            width,
            height,
        };

        if let Some(parent) = output_path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))
                .map_err(PipelineError::render)?;
        }

        let mut sink = self
            .encoder
            .open(output_path, &spec)
            .map_err(PipelineError::render)?;

        let written = write_frames(sink.as_mut(), &results, (height, width));
        let released = sink.release().context("Failed to finalize output video");

        let frames = written.map_err(PipelineError::render)?;
        released.map_err(PipelineError::render)?;
        Ok(frames)
    }
}

fn write_frames(
    sink: &mut dyn FrameSink,
    results: &[Box<dyn FrameResult>],
    stream_shape: (i32, i32),
) -> anyhow::Result<usize> {
    for (index, result) in results.iter().enumerate() {
        let shape = result.orig_shape();
        if shape != stream_shape {
            tracing::warn!(
                "Frame {} is {}x{}, stream is {}x{}",
                index,
                shape.1,
                shape.0,
                stream_shape.1,
                stream_shape.0
            );
        }
        let frame = result
            .plot()
            .with_context(|| format!("Failed to render frame {}", index))?;
        sink.write(&frame)
            .with_context(|| format!("Failed to write frame {}", index))?;
    }
    Ok(results.len())
}

/// Final path component of the client-supplied name; directory parts are dropped.
fn stored_file_name(file_name: &str) -> PipelineResult<&str> {
    Path::new(file_name)
        .file_name()
        .and_then(|name| name.to_str())
        .ok_or_else(|| PipelineError::Storage(format!("invalid file name {:?}", file_name)))
}

use super::{FrameSink, StreamSpec, VideoEncoder};
use anyhow::{anyhow, Result};
use opencv::{
    core::{Mat, Size},
    prelude::*,
    videoio::VideoWriter,
};
use std::path::Path;

/// Encoder backed by OpenCV's `VideoWriter`; the container follows the output extension.
#[derive(Debug, Default, Clone, Copy)]
pub struct OpencvVideoEncoder;

impl VideoEncoder for OpencvVideoEncoder {
    fn open(&self, path: &Path, spec: &StreamSpec) -> Result<Box<dyn FrameSink>> {
        let path_str = path
            .to_str()
            .ok_or_else(|| anyhow!("Output path is not valid UTF-8: {:?}", path))?;
        let [a, b, c, d] = spec.fourcc;
        let fourcc = VideoWriter::fourcc(a, b, c, d)?;
        let writer = VideoWriter::new(
            path_str,
            fourcc,
            spec.fps,
            Size::new(spec.width, spec.height),
            true,
        )?;
        if !writer.is_opened()? {
            return Err(anyhow!("Failed to open video writer: {}", path_str));
        }

        tracing::debug!(
            "Opened video writer {} ({}x{} @ {} fps, fourcc={})",
            path_str,
            spec.width,
            spec.height,
            spec.fps,
            spec.fourcc.iter().collect::<String>()
        );

        Ok(Box::new(OpencvSink { writer }))
    }
}

struct OpencvSink {
    writer: VideoWriter,
}

impl FrameSink for OpencvSink {
    fn write(&mut self, frame: &Mat) -> Result<()> {
        self.writer.write(frame)?;
        Ok(())
    }

    fn release(&mut self) -> Result<()> {
        self.writer.release()?;
        Ok(())
    }
}

// Test doubles for the model and encoder seams

use crate::pose::{FrameResult, PoseEstimator};
use crate::video::{FrameSink, StreamSpec, VideoEncoder};
use anyhow::{anyhow, Result};
use opencv::core::{Mat, Scalar, Vec3b, CV_8UC3};
use opencv::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

pub const FAKE_VIDEO_BYTES: &[u8] = b"fake-mp4-payload";

/// Frame whose plot is filled with its own index, so encoded order is observable.
pub struct FakeFrame {
    pub index: usize,
    pub shape: (i32, i32),
    pub fail_plot: bool,
}

impl FrameResult for FakeFrame {
    fn orig_shape(&self) -> (i32, i32) {
        self.shape
    }

    fn plot(&self) -> Result<Mat> {
        if self.fail_plot {
            return Err(anyhow!("plot failed at frame {}", self.index));
        }
        let (rows, cols) = self.shape;
        Ok(Mat::new_rows_cols_with_default(
            rows,
            cols,
            CV_8UC3,
            Scalar::all(self.index as f64),
        )?)
    }
}

#[derive(Default)]
pub struct FakeEstimator {
    pub frames: usize,
    pub shape: (i32, i32),
    pub fail_plot_at: Option<usize>,
    /// Frame index that reports a different shape from the rest.
    pub odd_shape_at: Option<(usize, (i32, i32))>,
    pub fail_predict: Option<String>,
    pub calls: AtomicUsize,
    pub sources: Mutex<Vec<PathBuf>>,
}

impl FakeEstimator {
    pub fn with_frames(frames: usize, shape: (i32, i32)) -> Self {
        Self {
            frames,
            shape,
            ..Self::default()
        }
    }

    pub fn failing(message: &str) -> Self {
        Self {
            fail_predict: Some(message.to_string()),
            ..Self::default()
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl PoseEstimator for FakeEstimator {
    fn predict(&self, source: &Path) -> Result<Vec<Box<dyn FrameResult>>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.sources.lock().unwrap().push(source.to_path_buf());
        if let Some(message) = &self.fail_predict {
            return Err(anyhow!("{}", message));
        }
        Ok((0..self.frames)
            .map(|index| {
                Box::new(FakeFrame {
                    index,
                    shape: match self.odd_shape_at {
                        Some((at, shape)) if at == index => shape,
                        _ => self.shape,
                    },
                    fail_plot: self.fail_plot_at == Some(index),
                }) as Box<dyn FrameResult>
            })
            .collect())
    }
}

#[derive(Debug, Default, Clone)]
pub struct Recording {
    pub opened: Vec<(PathBuf, StreamSpec)>,
    /// First pixel's blue channel of every written frame.
    pub frames: Vec<u8>,
    pub released: usize,
}

/// Encoder that records calls and writes a placeholder file on release.
#[derive(Default, Clone)]
pub struct FakeEncoder {
    pub recording: Arc<Mutex<Recording>>,
    pub fail_open: bool,
}

impl FakeEncoder {
    pub fn snapshot(&self) -> Recording {
        self.recording.lock().unwrap().clone()
    }
}

impl VideoEncoder for FakeEncoder {
    fn open(&self, path: &Path, spec: &StreamSpec) -> Result<Box<dyn FrameSink>> {
        if self.fail_open {
            return Err(anyhow!("Failed to open video writer: {}", path.display()));
        }
        self.recording
            .lock()
            .unwrap()
            .opened
            .push((path.to_path_buf(), *spec));
        Ok(Box::new(FakeSink {
            path: path.to_path_buf(),
            recording: self.recording.clone(),
        }))
    }
}

struct FakeSink {
    path: PathBuf,
    recording: Arc<Mutex<Recording>>,
}

impl FrameSink for FakeSink {
    fn write(&mut self, frame: &Mat) -> Result<()> {
        let pixel = frame.at_2d::<Vec3b>(0, 0)?;
        self.recording.lock().unwrap().frames.push(pixel.0[0]);
        Ok(())
    }

    fn release(&mut self) -> Result<()> {
        fs::write(&self.path, FAKE_VIDEO_BYTES)?;
        self.recording.lock().unwrap().released += 1;
        Ok(())
    }
}

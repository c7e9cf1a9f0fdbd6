use super::{BBox, FrameResult, Keypoint, PersonPose, PoseEstimator, PoseFrame, KEYPOINT_COUNT};
use crate::video::{bgr_to_rgb_image, open_source};
use anyhow::{anyhow, Result};
use image::DynamicImage;
use opencv::core::Mat;
use std::path::Path;
use std::sync::Mutex;
use usls::models::YOLO;
use usls::{Config, Image};

/// A wrapper around the USLS YOLO pose model that handles BGR-to-RGB conversion
/// and decodes whole videos into per-frame results.
pub struct UslsPoseEstimator {
    model: Mutex<YOLO>,
    keypoint_confidence: f32,
}

impl UslsPoseEstimator {
    /// Load the model once; callers treat a failure here as fatal.
    pub fn new(model_path: &str, min_conf: f32, keypoint_confidence: f32) -> Result<Self> {
        let config = Config::yolo_pose()
            .with_model_file(model_path)
            .with_class_confs(&[min_conf])
            .with_keypoint_confs(&[keypoint_confidence]);

        #[cfg(target_os = "macos")]
        let config = config.with_model_device(usls::Device::CoreMl);

        let config = config.commit()?;
        let model = YOLO::new(config)?;
        tracing::info!("Loaded pose model from {}", model_path);

        Ok(Self {
            model: Mutex::new(model),
            keypoint_confidence,
        })
    }

    /// Run pose estimation on a single BGR frame.
    fn detect(&self, frame: &Mat) -> Result<Vec<PersonPose>> {
        let input = Image::from(DynamicImage::ImageRgb8(bgr_to_rgb_image(frame)?));

        let mut model = self
            .model
            .lock()
            .map_err(|_| anyhow!("Pose model mutex poisoned"))?;
        let ys = model.forward(std::slice::from_ref(&input))?;
        drop(model);

        let y = ys
            .into_iter()
            .next()
            .ok_or_else(|| anyhow!("Pose model returned no output for frame"))?;

        let people = y
            .hbbs
            .iter()
            .zip(y.keypointss.iter())
            .map(|(hbb, kpts)| {
                let mut keypoints = [Keypoint::default(); KEYPOINT_COUNT];
                for (slot, kpt) in keypoints.iter_mut().zip(kpts.iter()) {
                    *slot = Keypoint {
                        x: kpt.x(),
                        y: kpt.y(),
                        confidence: kpt.confidence().unwrap_or(0.0),
                    };
                }
                PersonPose {
                    bbox: BBox {
                        x: hbb.xmin(),
                        y: hbb.ymin(),
                        w: hbb.width(),
                        h: hbb.height(),
                    },
                    confidence: hbb.confidence().unwrap_or(0.0),
                    keypoints,
                }
            })
            .collect();

        Ok(people)
    }
}

impl PoseEstimator for UslsPoseEstimator {
    fn predict(&self, source: &Path) -> Result<Vec<Box<dyn FrameResult>>> {
        let mut reader = open_source(source)?;
        let expected = reader.frame_count().unwrap_or(0);
        tracing::debug!("Estimating poses on {} ({} frames)", source.display(), expected);
        let mut results: Vec<Box<dyn FrameResult>> = Vec::with_capacity(expected);

        while let Some(frame) = reader.next_frame()? {
            let people = self.detect(&frame)?;
            tracing::trace!("Frame {}: {} people", results.len(), people.len());
            results.push(Box::new(PoseFrame {
                image: frame,
                people,
                keypoint_confidence: self.keypoint_confidence,
            }));
        }

        tracing::info!(
            "Pose estimation finished: {} frames from {}",
            results.len(),
            source.display()
        );
        Ok(results)
    }
}

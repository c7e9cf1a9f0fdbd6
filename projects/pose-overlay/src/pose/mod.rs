// Pose model seam: per-frame results with a plotting capability

pub mod estimator;
pub mod render;

use anyhow::Result;
use opencv::core::Mat;
use opencv::prelude::*;
use std::path::Path;

pub use estimator::UslsPoseEstimator;

/// Number of keypoints in the COCO person layout.
pub const KEYPOINT_COUNT: usize = 17;

/// One frame of model output. Consumed once, in detection order.
pub trait FrameResult: Send {
    /// Original frame shape as `(height, width)`.
    fn orig_shape(&self) -> (i32, i32);
    /// Produces the annotated frame in the source pixel layout (BGR).
    fn plot(&self) -> Result<Mat>;
}

/// A loaded pose model. Shared across requests behind an `Arc`.
pub trait PoseEstimator: Send + Sync {
    fn predict(&self, source: &Path) -> Result<Vec<Box<dyn FrameResult>>>;
}

/// A keypoint in frame pixel coordinates.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Keypoint {
    pub x: f32,
    pub y: f32,
    pub confidence: f32,
}

/// Pixel-space bounding box (top-left corner plus size).
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct BBox {
    pub x: f32,
    pub y: f32,
    pub w: f32,
    pub h: f32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PersonPose {
    pub bbox: BBox,
    pub confidence: f32,
    pub keypoints: [Keypoint; KEYPOINT_COUNT],
}

/// A decoded frame together with the people detected in it.
pub struct PoseFrame {
    pub image: Mat,
    pub people: Vec<PersonPose>,
    pub keypoint_confidence: f32,
}

impl FrameResult for PoseFrame {
    fn orig_shape(&self) -> (i32, i32) {
        (self.image.rows(), self.image.cols())
    }

    fn plot(&self) -> Result<Mat> {
        render::draw_poses(&self.image, &self.people, self.keypoint_confidence)
    }
}

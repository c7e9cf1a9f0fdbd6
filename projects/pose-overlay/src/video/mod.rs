pub mod opencv_reader;
pub mod writer;

use anyhow::{anyhow, Result};
use image::RgbImage;
use opencv::core::Mat;
use opencv::imgproc::{cvt_color_def, COLOR_BGR2RGB};
use opencv::prelude::*;
use std::path::Path;

use opencv_reader::{ImageReader, OpencvReader};

pub trait VideoReader: Send {
    fn frame_count(&self) -> Result<usize>;
    /// Returns `None` once the source is exhausted.
    fn next_frame(&mut self) -> Result<Option<Mat>>;
}

/// Parameters fixed when an output stream is opened.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StreamSpec {
    pub fourcc: [char; 4],
    pub fps: f64,
    pub width: i32,
    pub height: i32,
}

/// An open output stream. Frames must be released explicitly to produce a valid file.
pub trait FrameSink {
    fn write(&mut self, frame: &Mat) -> Result<()>;
    fn release(&mut self) -> Result<()>;
}

pub trait VideoEncoder: Send + Sync {
    fn open(&self, path: &Path, spec: &StreamSpec) -> Result<Box<dyn FrameSink>>;
}

/// Picks a reader by the file's guessed MIME type: still images become a
/// single-frame source, anything else goes through `VideoCapture`.
pub fn open_source(path: &Path) -> Result<Box<dyn VideoReader>> {
    if is_image_path(path) {
        Ok(Box::new(ImageReader::new(path)?))
    } else {
        Ok(Box::new(OpencvReader::new(path)?))
    }
}

/// Copies a BGR frame into an owned RGB buffer.
pub fn bgr_to_rgb_image(frame: &Mat) -> Result<RgbImage> {
    let mut rgb = Mat::default();
    cvt_color_def(frame, &mut rgb, COLOR_BGR2RGB)?;
    if !rgb.is_continuous() {
        return Err(anyhow!("Converted frame is not continuous"));
    }

    let (width, height) = (rgb.cols() as u32, rgb.rows() as u32);
    RgbImage::from_raw(width, height, rgb.data_bytes()?.to_vec())
        .ok_or_else(|| anyhow!("Frame buffer does not match {}x{}", width, height))
}

fn is_image_path(path: &Path) -> bool {
    mime_guess::from_path(path)
        .first()
        .map(|mime| mime.type_() == mime_guess::mime::IMAGE)
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_image_path() {
        assert!(is_image_path(Path::new("/tmp/uploads/a/frame.jpg")));
        assert!(is_image_path(Path::new("still.PNG")));
        assert!(!is_image_path(Path::new("clip.mp4")));
        assert!(!is_image_path(Path::new("clip.avi")));
        assert!(!is_image_path(Path::new("no_extension")));
    }

    #[test]
    fn test_bgr_to_rgb_image_swaps_channels() {
        use opencv::core::{Scalar, CV_8UC3};

        // Pure blue in BGR
        let frame =
            Mat::new_rows_cols_with_default(4, 6, CV_8UC3, Scalar::new(255.0, 0.0, 0.0, 0.0))
                .unwrap();
        let image = bgr_to_rgb_image(&frame).unwrap();

        assert_eq!(image.dimensions(), (6, 4));
        assert_eq!(image.get_pixel(0, 0).0, [0, 0, 255]);
    }
}

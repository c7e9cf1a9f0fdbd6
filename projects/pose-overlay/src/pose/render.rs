use super::{Keypoint, PersonPose};
use anyhow::Result;
use opencv::core::{Mat, Point, Rect, Scalar};
use opencv::imgproc::{circle, line, put_text, rectangle, FONT_HERSHEY_SIMPLEX, LINE_AA, LINE_8};
use opencv::prelude::*;

/// COCO-17 limbs as keypoint index pairs.
pub const SKELETON: [(usize, usize); 19] = [
    (15, 13),
    (13, 11),
    (16, 14),
    (14, 12),
    (11, 12),
    (5, 11),
    (6, 12),
    (5, 6),
    (5, 7),
    (6, 8),
    (7, 9),
    (8, 10),
    (1, 2),
    (0, 1),
    (0, 2),
    (1, 3),
    (2, 4),
    (3, 5),
    (4, 6),
];

// BGR
const BOX_COLOR: (f64, f64, f64) = (56.0, 56.0, 255.0);
const HEAD_COLOR: (f64, f64, f64) = (0.0, 255.0, 0.0);
const ARM_COLOR: (f64, f64, f64) = (255.0, 128.0, 0.0);
const LEG_COLOR: (f64, f64, f64) = (51.0, 153.0, 255.0);

fn bgr((b, g, r): (f64, f64, f64)) -> Scalar {
    Scalar::new(b, g, r, 0.0)
}

/// Keypoints 0..=4 are the face, 5..=10 the arms, 11..=16 the legs.
fn keypoint_color(index: usize) -> Scalar {
    match index {
        0..=4 => bgr(HEAD_COLOR),
        5..=10 => bgr(ARM_COLOR),
        _ => bgr(LEG_COLOR),
    }
}

fn limb_color(a: usize, b: usize) -> Scalar {
    keypoint_color(a.max(b))
}

fn is_visible(kp: &Keypoint, min_conf: f32, width: i32, height: i32) -> bool {
    kp.confidence >= min_conf
        && kp.x >= 0.0
        && kp.y >= 0.0
        && kp.x < width as f32
        && kp.y < height as f32
}

/// Limbs whose two endpoints are both visible.
pub fn visible_limbs(
    person: &PersonPose,
    min_conf: f32,
    width: i32,
    height: i32,
) -> Vec<(usize, usize)> {
    SKELETON
        .iter()
        .copied()
        .filter(|&(a, b)| {
            is_visible(&person.keypoints[a], min_conf, width, height)
                && is_visible(&person.keypoints[b], min_conf, width, height)
        })
        .collect()
}

fn to_point(kp: &Keypoint) -> Point {
    Point::new(kp.x.round() as i32, kp.y.round() as i32)
}

/// Draws boxes, skeletons and keypoints onto a copy of `image`.
pub fn draw_poses(image: &Mat, people: &[PersonPose], min_kpt_conf: f32) -> Result<Mat> {
    let mut canvas = image.try_clone()?;
    let width = canvas.cols();
    let height = canvas.rows();
    let thickness = ((width + height) as f64 * 0.001).round().max(1.0) as i32;
    let radius = (thickness * 2).max(3);

    for person in people {
        // 1. Box and label
        let rect = Rect::new(
            person.bbox.x as i32,
            person.bbox.y as i32,
            person.bbox.w as i32,
            person.bbox.h as i32,
        );
        rectangle(&mut canvas, rect, bgr(BOX_COLOR), thickness, LINE_8, 0)?;

        let label = format!("person {:.2}", person.confidence);
        let origin = Point::new(rect.x.max(0), (rect.y - 4).max(12));
        put_text(
            &mut canvas,
            &label,
            origin,
            FONT_HERSHEY_SIMPLEX,
            0.5,
            bgr(BOX_COLOR),
            1,
            LINE_AA,
            false,
        )?;

        // 2. Limbs
        for (a, b) in visible_limbs(person, min_kpt_conf, width, height) {
            line(
                &mut canvas,
                to_point(&person.keypoints[a]),
                to_point(&person.keypoints[b]),
                limb_color(a, b),
                thickness,
                LINE_AA,
                0,
            )?;
        }

        // 3. Keypoints on top
        for (index, kp) in person.keypoints.iter().enumerate() {
            if !is_visible(kp, min_kpt_conf, width, height) {
                continue;
            }
            circle(
                &mut canvas,
                to_point(kp),
                radius,
                keypoint_color(index),
                -1,
                LINE_AA,
                0,
            )?;
        }
    }

    Ok(canvas)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pose::{BBox, KEYPOINT_COUNT};
    use opencv::core::{Vec3b, CV_8UC3};

    fn person_with(visible: &[usize]) -> PersonPose {
        let mut keypoints = [Keypoint::default(); KEYPOINT_COUNT];
        for &i in visible {
            keypoints[i] = Keypoint {
                x: 10.0 + i as f32 * 4.0,
                y: 20.0 + i as f32 * 3.0,
                confidence: 0.9,
            };
        }
        PersonPose {
            bbox: BBox {
                x: 5.0,
                y: 5.0,
                w: 80.0,
                h: 90.0,
            },
            confidence: 0.8,
            keypoints,
        }
    }

    #[test]
    fn test_visible_limbs_require_both_endpoints() {
        // Left shoulder (5), left elbow (7), left wrist (9)
        let person = person_with(&[5, 7, 9]);
        let limbs = visible_limbs(&person, 0.5, 200, 200);
        assert_eq!(limbs, vec![(5, 7), (7, 9)]);
    }

    #[test]
    fn test_visible_limbs_respect_frame_bounds() {
        let mut person = person_with(&[5, 7]);
        person.keypoints[7].x = 500.0;
        assert!(visible_limbs(&person, 0.5, 200, 200).is_empty());
    }

    #[test]
    fn test_visible_limbs_respect_threshold() {
        let person = person_with(&[5, 7]);
        assert!(visible_limbs(&person, 0.95, 200, 200).is_empty());
    }

    #[test]
    fn test_draw_poses_leaves_source_untouched() {
        let image = Mat::new_rows_cols_with_default(120, 120, CV_8UC3, Scalar::all(0.0)).unwrap();
        let person = person_with(&(0..KEYPOINT_COUNT).collect::<Vec<_>>());

        let plotted = draw_poses(&image, &[person], 0.5).unwrap();
        assert_eq!(plotted.rows(), 120);
        assert_eq!(plotted.cols(), 120);

        // Box corner is painted on the copy only
        let painted = plotted.at_2d::<Vec3b>(5, 5).unwrap();
        assert_ne!(painted.0, [0u8, 0, 0]);
        let original = image.at_2d::<Vec3b>(5, 5).unwrap();
        assert_eq!(original.0, [0u8, 0, 0]);
    }
}

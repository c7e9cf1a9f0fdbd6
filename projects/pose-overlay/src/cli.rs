use clap::{ArgAction, Parser};
use std::net::IpAddr;
use std::path::PathBuf;

#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Host to bind to
    #[arg(long, env = "POSE_OVERLAY_HOST", default_value = "127.0.0.1")]
    pub host: IpAddr,

    /// Port to bind to
    #[arg(long, env = "POSE_OVERLAY_PORT", default_value_t = 5000)]
    pub port: u16,

    /// Scratch root for uploaded files
    #[arg(long, env = "POSE_OVERLAY_UPLOAD_ROOT", default_value = "/tmp/uploads/")]
    pub upload_root: PathBuf,

    /// Scratch root for encoded videos and frame images
    #[arg(long, env = "POSE_OVERLAY_RESULT_ROOT", default_value = "/tmp/result/")]
    pub result_root: PathBuf,

    /// Path to the YOLO pose ONNX model
    #[arg(long, env = "POSE_OVERLAY_MODEL", default_value = "yolo11n-pose.onnx")]
    pub model: String,

    /// Minimum person confidence kept by the model
    #[arg(long, env = "POSE_OVERLAY_MIN_CONFIDENCE", default_value_t = 0.25)]
    pub min_confidence: f32,

    /// Minimum keypoint confidence drawn on the overlay
    #[arg(long, env = "POSE_OVERLAY_KEYPOINT_CONFIDENCE", default_value_t = 0.5)]
    pub keypoint_confidence: f32,

    /// Include library error messages in the response `detail`
    #[arg(
        long,
        env = "POSE_OVERLAY_EXPOSE_ERROR_DETAILS",
        default_value_t = true,
        action = ArgAction::Set
    )]
    pub expose_error_details: bool,

    /// Keep uploads and encoded outputs on disk after responding
    #[arg(
        long,
        env = "POSE_OVERLAY_RETAIN_ARTIFACTS",
        default_value_t = true,
        action = ArgAction::Set
    )]
    pub retain_artifacts: bool,
}

impl Args {
    pub fn parse_args() -> Self {
        Self::parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_fixed_layout() {
        let args = Args::try_parse_from(["pose-overlay"]).unwrap();
        assert_eq!(args.port, 5000);
        assert_eq!(args.upload_root, PathBuf::from("/tmp/uploads/"));
        assert_eq!(args.result_root, PathBuf::from("/tmp/result/"));
        assert!(args.expose_error_details);
        assert!(args.retain_artifacts);
    }

    #[test]
    fn test_boolean_flags_take_values() {
        let args = Args::try_parse_from([
            "pose-overlay",
            "--expose-error-details",
            "false",
            "--retain-artifacts",
            "false",
        ])
        .unwrap();
        assert!(!args.expose_error_details);
        assert!(!args.retain_artifacts);
    }
}

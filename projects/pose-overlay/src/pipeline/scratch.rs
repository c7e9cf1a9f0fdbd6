// Scratch filesystem layout and the per-request frame scratch guard

use anyhow::Result;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use uuid::Uuid;

const FRAME_SCRATCH_DIR: &str = "pic";

/// Roots shared by every request. Each request works in its own
/// `<root>/<request_id>/` namespace underneath.
#[derive(Debug, Clone)]
pub struct ScratchLayout {
    upload_root: PathBuf,
    result_root: PathBuf,
}

impl ScratchLayout {
    pub fn new(upload_root: impl Into<PathBuf>, result_root: impl Into<PathBuf>) -> Self {
        Self {
            upload_root: upload_root.into(),
            result_root: result_root.into(),
        }
    }

    /// Create all roots. Called once at startup.
    pub fn ensure(&self) -> Result<()> {
        fs::create_dir_all(&self.upload_root)?;
        fs::create_dir_all(self.frames_root())?;
        tracing::info!(
            "Scratch roots ready: uploads={}, results={}",
            self.upload_root.display(),
            self.result_root.display()
        );
        Ok(())
    }

    pub fn frames_root(&self) -> PathBuf {
        self.result_root.join(FRAME_SCRATCH_DIR)
    }

    pub fn upload_dir(&self, request_id: &Uuid) -> PathBuf {
        self.upload_root.join(request_id.to_string())
    }

    pub fn output_dir(&self, request_id: &Uuid) -> PathBuf {
        self.result_root.join(request_id.to_string())
    }
}

/// Frame-image scratch for one request. Dropping it removes the request's
/// directory and recreates the (empty) frame root; failures are only logged.
pub struct FrameScratch {
    root: PathBuf,
    dir: PathBuf,
}

impl FrameScratch {
    pub fn acquire(root: PathBuf, request_id: &Uuid) -> Self {
        let dir = root.join(request_id.to_string());
        if let Err(e) = fs::create_dir_all(&dir) {
            tracing::warn!("Failed to create frame scratch {}: {}", dir.display(), e);
        }
        Self { root, dir }
    }

    pub fn path(&self) -> &Path {
        &self.dir
    }

    fn reset(&self) -> io::Result<()> {
        let removed = match fs::remove_dir_all(&self.dir) {
            Err(e) if e.kind() != io::ErrorKind::NotFound => Err(e),
            _ => Ok(()),
        };
        let recreated = fs::create_dir_all(&self.root);
        removed.and(recreated)
    }
}

impl Drop for FrameScratch {
    fn drop(&mut self) {
        if let Err(e) = self.reset() {
            tracing::warn!("Failed to reset frame scratch {}: {}", self.dir.display(), e);
        }
    }
}

/// Upload and output directories of one request. Unless retained, both are
/// removed when the guard drops, whether the request succeeded or not.
#[derive(Debug)]
pub struct RequestArtifacts {
    dirs: [PathBuf; 2],
    retain: bool,
}

impl RequestArtifacts {
    pub fn new(upload_dir: PathBuf, output_dir: PathBuf, retain: bool) -> Self {
        Self {
            dirs: [upload_dir, output_dir],
            retain,
        }
    }
}

impl Drop for RequestArtifacts {
    fn drop(&mut self) {
        if self.retain {
            return;
        }
        for dir in &self.dirs {
            remove_dir_logged(dir);
        }
    }
}

/// Best-effort removal; a missing directory is not an error.
pub fn remove_dir_logged(dir: &Path) {
    match fs::remove_dir_all(dir) {
        Ok(()) => tracing::debug!("Removed {}", dir.display()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => {}
        Err(e) => tracing::warn!("Failed to remove {}: {}", dir.display(), e),
    }
}

//! Asset paths under the output directory.

use reelweave_core::{AssetKind, JobId};
use reelweave_error::{ReelweaveResult, StorageError, StorageErrorKind};
use std::path::{Path, PathBuf};

const SNAPSHOT_FILE: &str = "job.json";
const SCENES_DIR: &str = "scenes";
const FINAL_VIDEO_STEM: &str = "final";

/// Maps (job, scene, asset kind) to a file path under the output root.
///
/// # Examples
///
/// ```
/// use reelweave_core::{AssetKind, JobId};
/// use reelweave_storage::AssetLayout;
///
/// let layout = AssetLayout::new("output");
/// let job = JobId::new();
///
/// let image = layout.scene_asset(job, 2, AssetKind::Image);
/// assert!(image.ends_with("scenes/002_image.png"));
/// assert!(layout.final_video(job).ends_with("final.mp4"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetLayout {
    root: PathBuf,
}

impl AssetLayout {
    /// Layout rooted at `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// The output root.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Directory owned by one job.
    pub fn job_dir(&self, job_id: JobId) -> PathBuf {
        self.root.join(job_id.to_string())
    }

    /// Directory holding a job's scene assets.
    pub fn scenes_dir(&self, job_id: JobId) -> PathBuf {
        self.job_dir(job_id).join(SCENES_DIR)
    }

    /// Path of one scene asset.
    pub fn scene_asset(&self, job_id: JobId, scene_index: usize, kind: AssetKind) -> PathBuf {
        self.scenes_dir(job_id)
            .join(format!("{:03}_{}.{}", scene_index, kind, kind.extension()))
    }

    /// Path of the finished video.
    pub fn final_video(&self, job_id: JobId) -> PathBuf {
        self.job_dir(job_id)
            .join(format!("{}.{}", FINAL_VIDEO_STEM, AssetKind::Video.extension()))
    }

    /// Path of the job snapshot.
    pub fn snapshot(&self, job_id: JobId) -> PathBuf {
        self.job_dir(job_id).join(SNAPSHOT_FILE)
    }

    /// Create the job and scene directories.
    #[tracing::instrument(skip(self), fields(root = %self.root.display()))]
    pub async fn prepare(&self, job_id: JobId) -> ReelweaveResult<PathBuf> {
        let scenes = self.scenes_dir(job_id);
        tokio::fs::create_dir_all(&scenes).await.map_err(|e| {
            StorageError::new(StorageErrorKind::DirectoryCreation(format!(
                "{}: {}",
                scenes.display(),
                e
            )))
        })?;
        tracing::debug!(path = %scenes.display(), "Prepared job directory");
        Ok(self.job_dir(job_id))
    }
}

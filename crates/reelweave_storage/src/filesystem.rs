//! Filesystem-based job archive.

use crate::AssetLayout;
use async_trait::async_trait;
use reelweave_core::{GenerationJob, JobId};
use reelweave_error::{JsonError, ReelweaveResult, StorageError, StorageErrorKind};
use reelweave_interface::{JobFilter, JobRepository, JobStatistics, JobSummary};
use std::path::PathBuf;

/// Stores each job as `{root}/{job_id}/job.json`.
///
/// Snapshots are written to a temp file and renamed into place, so a reader
/// never sees a half-written snapshot. Deleting a job removes its whole
/// directory, assets included; a job resumed from it loses the scene assets
/// it carried over.
#[derive(Debug, Clone)]
pub struct FileSystemJobRepository {
    layout: AssetLayout,
}

impl FileSystemJobRepository {
    /// Archive rooted at `root`, creating it if needed.
    #[tracing::instrument(skip(root))]
    pub fn new(root: impl Into<PathBuf>) -> ReelweaveResult<Self> {
        let root = root.into();

        std::fs::create_dir_all(&root).map_err(|e| {
            StorageError::new(StorageErrorKind::DirectoryCreation(format!(
                "{}: {}",
                root.display(),
                e
            )))
        })?;

        tracing::info!(path = %root.display(), "Opened job archive");
        Ok(Self {
            layout: AssetLayout::new(root),
        })
    }

    /// The layout this archive writes into.
    pub fn layout(&self) -> &AssetLayout {
        &self.layout
    }

    async fn read_snapshot(&self, path: &std::path::Path) -> ReelweaveResult<GenerationJob> {
        let data = tokio::fs::read(path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                StorageError::new(StorageErrorKind::NotFound(path.display().to_string()))
            } else {
                StorageError::new(StorageErrorKind::FileRead(format!(
                    "{}: {}",
                    path.display(),
                    e
                )))
            }
        })?;
        let job = serde_json::from_slice(&data).map_err(|e| {
            JsonError::new(format!("invalid job snapshot {}: {}", path.display(), e))
        })?;
        Ok(job)
    }

    /// Every readable snapshot under the root.
    async fn load_all(&self) -> ReelweaveResult<Vec<GenerationJob>> {
        let root = self.layout.root();
        let mut entries = tokio::fs::read_dir(root).await.map_err(|e| {
            StorageError::new(StorageErrorKind::FileRead(format!(
                "{}: {}",
                root.display(),
                e
            )))
        })?;

        let mut jobs = Vec::new();
        loop {
            let entry = entries.next_entry().await.map_err(|e| {
                StorageError::new(StorageErrorKind::FileRead(format!(
                    "{}: {}",
                    root.display(),
                    e
                )))
            })?;
            let Some(entry) = entry else { break };

            let snapshot = entry.path().join("job.json");
            if !tokio::fs::try_exists(&snapshot).await.unwrap_or(false) {
                continue;
            }
            match self.read_snapshot(&snapshot).await {
                Ok(job) => jobs.push(job),
                Err(e) => {
                    tracing::warn!(path = %snapshot.display(), error = %e, "Skipping unreadable job snapshot");
                }
            }
        }
        Ok(jobs)
    }
}

/// Size on disk of the final video of `job`, or 0 when it has none.
pub async fn video_bytes(job: &GenerationJob) -> u64 {
    let Some(video) = &job.video else {
        return 0;
    };
    match tokio::fs::metadata(&video.path).await {
        Ok(metadata) => metadata.len(),
        Err(e) => {
            tracing::debug!(path = %video.path.display(), error = %e, "Video file missing");
            0
        }
    }
}

#[async_trait]
impl JobRepository for FileSystemJobRepository {
    #[tracing::instrument(skip(self, job), fields(job_id = %job.id, status = %job.status()))]
    async fn save(&self, job: &GenerationJob) -> ReelweaveResult<()> {
        let dir = self.layout.job_dir(job.id);
        tokio::fs::create_dir_all(&dir).await.map_err(|e| {
            StorageError::new(StorageErrorKind::DirectoryCreation(format!(
                "{}: {}",
                dir.display(),
                e
            )))
        })?;

        let data = serde_json::to_vec_pretty(job)
            .map_err(|e| JsonError::new(format!("failed to serialize job {}: {}", job.id, e)))?;

        let path = self.layout.snapshot(job.id);
        let temp_path = path.with_extension("tmp");
        tokio::fs::write(&temp_path, data).await.map_err(|e| {
            StorageError::new(StorageErrorKind::FileWrite(format!(
                "{}: {}",
                temp_path.display(),
                e
            )))
        })?;

        tokio::fs::rename(&temp_path, &path).await.map_err(|e| {
            StorageError::new(StorageErrorKind::FileWrite(format!(
                "rename {} to {}: {}",
                temp_path.display(),
                path.display(),
                e
            )))
        })?;

        tracing::debug!(path = %path.display(), "Saved job snapshot");
        Ok(())
    }

    #[tracing::instrument(skip(self))]
    async fn load(&self, id: JobId) -> ReelweaveResult<GenerationJob> {
        self.read_snapshot(&self.layout.snapshot(id)).await
    }

    #[tracing::instrument(skip(self))]
    async fn list(&self, filter: &JobFilter) -> ReelweaveResult<Vec<JobSummary>> {
        let jobs = self.load_all().await?;
        Ok(filter.apply(&jobs))
    }

    #[tracing::instrument(skip(self))]
    async fn delete(&self, id: JobId) -> ReelweaveResult<()> {
        let snapshot = self.layout.snapshot(id);
        if !tokio::fs::try_exists(&snapshot).await.unwrap_or(false) {
            return Err(
                StorageError::new(StorageErrorKind::NotFound(snapshot.display().to_string())).into(),
            );
        }

        let dir = self.layout.job_dir(id);
        tokio::fs::remove_dir_all(&dir).await.map_err(|e| {
            StorageError::new(StorageErrorKind::Delete(format!("{}: {}", dir.display(), e)))
        })?;

        tracing::info!(path = %dir.display(), "Deleted job and its assets");
        Ok(())
    }

    #[tracing::instrument(skip(self))]
    async fn statistics(&self) -> ReelweaveResult<JobStatistics> {
        let mut stats = JobStatistics::default();
        for job in self.load_all().await? {
            stats.record(&job, video_bytes(&job).await);
        }
        tracing::debug!(total = stats.total, "Computed archive statistics");
        Ok(stats)
    }
}

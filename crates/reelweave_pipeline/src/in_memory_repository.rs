//! In-memory implementation of JobRepository.
//!
//! Stores job snapshots in a HashMap. Useful for tests and for embedding the
//! orchestrator where nothing needs to survive the process.

use async_trait::async_trait;
use reelweave_core::{GenerationJob, JobId};
use reelweave_error::{PipelineError, PipelineErrorKind, ReelweaveResult};
use reelweave_interface::{JobFilter, JobRepository, JobStatistics, JobSummary};
use reelweave_storage::video_bytes;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// In-memory repository for job snapshots.
///
/// All data is lost when the repository is dropped.
#[derive(Debug, Clone, Default)]
pub struct InMemoryJobRepository {
    jobs: Arc<RwLock<HashMap<JobId, GenerationJob>>>,
}

impl InMemoryJobRepository {
    /// Create a new empty repository.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored jobs.
    pub async fn len(&self) -> usize {
        self.jobs.read().await.len()
    }

    /// Whether nothing is stored.
    pub async fn is_empty(&self) -> bool {
        self.jobs.read().await.is_empty()
    }

    /// Remove every job.
    pub async fn clear(&self) {
        self.jobs.write().await.clear();
    }
}

#[async_trait]
impl JobRepository for InMemoryJobRepository {
    async fn save(&self, job: &GenerationJob) -> ReelweaveResult<()> {
        self.jobs.write().await.insert(job.id, job.clone());
        Ok(())
    }

    async fn load(&self, id: JobId) -> ReelweaveResult<GenerationJob> {
        self.jobs
            .read()
            .await
            .get(&id)
            .cloned()
            .ok_or_else(|| PipelineError::new(PipelineErrorKind::JobNotFound(id.to_string())).into())
    }

    async fn list(&self, filter: &JobFilter) -> ReelweaveResult<Vec<JobSummary>> {
        let jobs = self.jobs.read().await;
        Ok(filter.apply(jobs.values()))
    }

    async fn delete(&self, id: JobId) -> ReelweaveResult<()> {
        self.jobs
            .write()
            .await
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| PipelineError::new(PipelineErrorKind::JobNotFound(id.to_string())).into())
    }

    async fn statistics(&self) -> ReelweaveResult<JobStatistics> {
        let jobs: Vec<GenerationJob> = self.jobs.read().await.values().cloned().collect();
        let mut stats = JobStatistics::default();
        for job in &jobs {
            stats.record(job, video_bytes(job).await);
        }
        Ok(stats)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reelweave_core::{BackendSelection, JobInput};

    #[tokio::test]
    async fn save_load_delete() {
        let repo = InMemoryJobRepository::new();
        let job = GenerationJob::new(JobInput::Topic("t".into()), BackendSelection::default());

        repo.save(&job).await.unwrap();
        assert_eq!(repo.len().await, 1);
        assert_eq!(repo.load(job.id).await.unwrap(), job);

        repo.delete(job.id).await.unwrap();
        assert!(repo.is_empty().await);
        assert!(repo.load(job.id).await.is_err());
        assert!(repo.delete(job.id).await.is_err());
    }

    #[tokio::test]
    async fn statistics_and_duplicate() {
        let repo = InMemoryJobRepository::new();
        let mut failed = GenerationJob::new(JobInput::Topic("t".into()), BackendSelection::default());
        failed.transition_to(reelweave_core::JobStatus::Failed).unwrap();
        repo.save(&failed).await.unwrap();
        repo.save(&GenerationJob::new(JobInput::Topic("u".into()), BackendSelection::default()))
            .await
            .unwrap();

        let stats = repo.statistics().await.unwrap();
        assert_eq!((stats.total, stats.completed, stats.failed), (2, 0, 1));
        assert_eq!(stats.total_size_bytes, 0);

        let copy = repo.duplicate(failed.id).await.unwrap();
        assert_eq!(copy.input, failed.input);
        assert_eq!(copy.status(), reelweave_core::JobStatus::Pending);
        assert_eq!(repo.len().await, 2);
    }
}

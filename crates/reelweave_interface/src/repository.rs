//! Repository trait for job archives.
//!
//! Implementations can use the filesystem, a database, or plain memory.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reelweave_core::{GenerationJob, JobId, JobStatus};
use reelweave_error::ReelweaveResult;
use serde::{Deserialize, Serialize};

/// Storage for job snapshots.
///
/// All methods are async to support async storage drivers and network I/O.
#[async_trait]
pub trait JobRepository: Send + Sync {
    /// Insert or replace the snapshot of `job`.
    async fn save(&self, job: &GenerationJob) -> ReelweaveResult<()>;

    /// Load a job by id.
    async fn load(&self, id: JobId) -> ReelweaveResult<GenerationJob>;

    /// List jobs matching the filter, newest first.
    async fn list(&self, filter: &JobFilter) -> ReelweaveResult<Vec<JobSummary>>;

    /// Remove a job and everything generated for it.
    async fn delete(&self, id: JobId) -> ReelweaveResult<()>;

    /// Counts, durations and sizes over every stored job.
    async fn statistics(&self) -> ReelweaveResult<JobStatistics>;

    /// A new pending job repeating the request of job `id`.
    ///
    /// The copy is returned, not stored; it is saved when it starts.
    async fn duplicate(&self, id: JobId) -> ReelweaveResult<GenerationJob> {
        Ok(self.load(id).await?.duplicate())
    }
}

/// Totals over a job archive.
///
/// # Examples
///
/// ```
/// use reelweave_core::{BackendSelection, GenerationJob, JobInput};
/// use reelweave_interface::JobStatistics;
///
/// let job = GenerationJob::new(JobInput::Topic("tea".into()), BackendSelection::default());
/// let mut stats = JobStatistics::default();
/// stats.record(&job, 0);
/// assert_eq!(stats.total, 1);
/// assert_eq!(stats.completed, 0);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct JobStatistics {
    /// Stored jobs
    pub total: usize,
    /// Jobs that produced a video
    pub completed: usize,
    /// Failed or cancelled jobs
    pub failed: usize,
    /// Sum of reported video durations
    pub total_duration_seconds: f64,
    /// Sum of final video file sizes
    pub total_size_bytes: u64,
}

impl JobStatistics {
    /// Count `job`, whose final video takes `video_bytes` on disk.
    pub fn record(&mut self, job: &GenerationJob, video_bytes: u64) {
        self.total += 1;
        match job.status() {
            JobStatus::Completed => self.completed += 1,
            JobStatus::Failed => self.failed += 1,
            _ => {}
        }
        if let Some(seconds) = job.video.as_ref().and_then(|video| video.duration_seconds) {
            self.total_duration_seconds += seconds;
        }
        self.total_size_bytes += video_bytes;
    }
}

/// Filter criteria for [`JobRepository::list`].
///
/// # Examples
///
/// ```
/// use reelweave_core::JobStatus;
/// use reelweave_interface::JobFilter;
///
/// let filter = JobFilter::new().with_status(JobStatus::Failed).with_limit(10);
/// assert_eq!(filter.limit, Some(10));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobFilter {
    /// Only jobs in this status
    pub status: Option<JobStatus>,
    /// Maximum number of results
    pub limit: Option<usize>,
}

impl JobFilter {
    /// Create an empty filter (returns all jobs).
    pub fn new() -> Self {
        Self::default()
    }

    /// Filter by status.
    pub fn with_status(mut self, status: JobStatus) -> Self {
        self.status = Some(status);
        self
    }

    /// Cap the number of results.
    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Whether `job` passes the filter.
    pub fn matches(&self, job: &GenerationJob) -> bool {
        self.status.is_none_or(|status| job.status() == status)
    }

    /// Filter, order newest first, and truncate a set of jobs.
    pub fn apply<'a, I>(&self, jobs: I) -> Vec<JobSummary>
    where
        I: IntoIterator<Item = &'a GenerationJob>,
    {
        let mut summaries: Vec<JobSummary> = jobs
            .into_iter()
            .filter(|job| self.matches(job))
            .map(JobSummary::from)
            .collect();
        summaries.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        if let Some(limit) = self.limit {
            summaries.truncate(limit);
        }
        summaries
    }
}

/// Lightweight view of a stored job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobSummary {
    /// Job id
    pub id: JobId,
    /// Title, or the topic/script prefix
    pub title: String,
    /// Current status
    pub status: JobStatus,
    /// Number of scenes
    pub scene_count: usize,
    /// Scenes with both assets
    pub completed_scenes: usize,
    /// Creation time
    pub created_at: DateTime<Utc>,
    /// Terminal time
    pub finished_at: Option<DateTime<Utc>>,
    /// Failure message for failed jobs
    pub error_message: Option<String>,
}

impl From<&GenerationJob> for JobSummary {
    fn from(job: &GenerationJob) -> Self {
        Self {
            id: job.id,
            title: job.effective_title(40),
            status: job.status(),
            scene_count: job.scenes.len(),
            completed_scenes: job.completed_scenes().count(),
            created_at: job.created_at,
            finished_at: job.finished_at,
            error_message: job.failure.as_ref().map(ToString::to_string),
        }
    }
}

use reelweave_core::{
    AssetKind, BackendSelection, GenerationJob, JobInput, JobStatus, Scene, VideoAsset,
};
use reelweave_interface::{JobFilter, JobRepository};
use reelweave_storage::{AssetLayout, FileSystemJobRepository};

fn job(topic: &str) -> GenerationJob {
    GenerationJob::new(JobInput::Topic(topic.into()), BackendSelection::default())
}

#[tokio::test]
async fn snapshot_round_trips_through_disk() {
    let dir = tempfile::tempdir().unwrap();
    let repo = FileSystemJobRepository::new(dir.path()).unwrap();

    let mut job = job("habit of reading");
    job.scenes = vec![Scene::new(0, "Open a book.")];
    repo.save(&job).await.unwrap();

    assert!(dir.path().join(job.id.to_string()).join("job.json").exists());
    let loaded = repo.load(job.id).await.unwrap();
    assert_eq!(loaded, job);
}

#[tokio::test]
async fn save_replaces_previous_snapshot() {
    let dir = tempfile::tempdir().unwrap();
    let repo = FileSystemJobRepository::new(dir.path()).unwrap();

    let mut job = job("tides");
    repo.save(&job).await.unwrap();
    job.transition_to(JobStatus::GeneratingScript).unwrap();
    repo.save(&job).await.unwrap();

    let loaded = repo.load(job.id).await.unwrap();
    assert_eq!(loaded.status(), JobStatus::GeneratingScript);
}

#[tokio::test]
async fn list_filters_by_status_and_skips_strays() {
    let dir = tempfile::tempdir().unwrap();
    let repo = FileSystemJobRepository::new(dir.path()).unwrap();

    let pending = job("pending");
    let mut failed = job("failed");
    failed.transition_to(JobStatus::Failed).unwrap();
    repo.save(&pending).await.unwrap();
    repo.save(&failed).await.unwrap();

    // A directory without a snapshot and a corrupt snapshot are ignored
    std::fs::create_dir_all(dir.path().join("not-a-job")).unwrap();
    std::fs::create_dir_all(dir.path().join("corrupt")).unwrap();
    std::fs::write(dir.path().join("corrupt/job.json"), b"{").unwrap();

    let all = repo.list(&JobFilter::new()).await.unwrap();
    assert_eq!(all.len(), 2);

    let only_failed = repo
        .list(&JobFilter::new().with_status(JobStatus::Failed))
        .await
        .unwrap();
    assert_eq!(only_failed.len(), 1);
    assert_eq!(only_failed[0].id, failed.id);
}

#[tokio::test]
async fn delete_removes_job_directory_with_assets() {
    let dir = tempfile::tempdir().unwrap();
    let repo = FileSystemJobRepository::new(dir.path()).unwrap();
    let other = job("other");
    let job = job("drop assets");

    let layout = repo.layout().clone();
    layout.prepare(job.id).await.unwrap();
    let image = layout.scene_asset(job.id, 0, AssetKind::Image);
    std::fs::write(&image, b"png").unwrap();
    repo.save(&job).await.unwrap();
    repo.save(&other).await.unwrap();

    repo.delete(job.id).await.unwrap();

    assert!(repo.load(job.id).await.is_err());
    assert!(!image.exists());
    assert!(!layout.job_dir(job.id).exists());
    assert_eq!(repo.load(other.id).await.unwrap(), other);
    assert!(repo.delete(job.id).await.is_err());
}

#[tokio::test]
async fn statistics_sum_status_duration_and_video_size() {
    let dir = tempfile::tempdir().unwrap();
    let repo = FileSystemJobRepository::new(dir.path()).unwrap();
    let layout = repo.layout().clone();

    let mut completed = job("finished");
    layout.prepare(completed.id).await.unwrap();
    let video = layout.final_video(completed.id);
    std::fs::write(&video, vec![0u8; 1500]).unwrap();
    completed.video = Some(VideoAsset {
        duration_seconds: Some(42.5),
        ..VideoAsset::new(&video)
    });
    completed.transition_to(JobStatus::Assembling).unwrap();
    completed.transition_to(JobStatus::Completed).unwrap();

    let mut failed = job("broken");
    failed.transition_to(JobStatus::Failed).unwrap();

    let waiting = job("waiting");
    for stored in [&completed, &failed, &waiting] {
        repo.save(stored).await.unwrap();
    }

    let stats = repo.statistics().await.unwrap();
    assert_eq!(stats.total, 3);
    assert_eq!(stats.completed, 1);
    assert_eq!(stats.failed, 1);
    assert_eq!(stats.total_duration_seconds, 42.5);
    assert_eq!(stats.total_size_bytes, 1500);
}

#[tokio::test]
async fn duplicate_copies_request_of_stored_job() {
    let dir = tempfile::tempdir().unwrap();
    let repo = FileSystemJobRepository::new(dir.path()).unwrap();
    let mut original = job("tides");
    original.transition_to(JobStatus::Failed).unwrap();
    repo.save(&original).await.unwrap();

    let copy = repo.duplicate(original.id).await.unwrap();

    assert_ne!(copy.id, original.id);
    assert_eq!(copy.status(), JobStatus::Pending);
    assert_eq!(copy.input, original.input);
    assert!(repo.load(copy.id).await.is_err());
    assert!(repo.duplicate(reelweave_core::JobId::new()).await.is_err());
}

#[test]
fn asset_paths_are_unique_per_scene_and_kind() {
    let layout = AssetLayout::new("/out");
    let job = reelweave_core::JobId::new();

    let paths = [
        layout.scene_asset(job, 0, AssetKind::Image),
        layout.scene_asset(job, 0, AssetKind::Audio),
        layout.scene_asset(job, 1, AssetKind::Image),
        layout.final_video(job),
    ];
    for (i, a) in paths.iter().enumerate() {
        for b in &paths[i + 1..] {
            assert_ne!(a, b);
        }
    }
    assert!(paths[1].to_string_lossy().ends_with("000_audio.mp3"));
}

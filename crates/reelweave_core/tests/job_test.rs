use reelweave_core::{
    BackendSelection, BgmMode, BgmTrack, ErrorInfo, FailureKind, GenerationJob, JobInput,
    JobStatus, Scene, Stage,
};
use reelweave_error::ErrorClass;

#[test]
fn happy_path_walks_every_status() {
    let mut job = GenerationJob::new(
        JobInput::Topic("habit of reading".into()),
        BackendSelection::default(),
    );

    for next in [
        JobStatus::GeneratingScript,
        JobStatus::GeneratingScenes,
        JobStatus::Assembling,
        JobStatus::Completed,
    ] {
        job.transition_to(next).unwrap();
    }

    assert_eq!(job.status(), JobStatus::Completed);
    assert!(job.finished_at.is_some());
    assert!(job.transition_to(JobStatus::Failed).is_err());
}

#[test]
fn backward_transition_is_rejected() {
    let mut job = GenerationJob::new(
        JobInput::FixedScript("One.".into()),
        BackendSelection::default(),
    );
    job.transition_to(JobStatus::Assembling).unwrap();

    let err = job.transition_to(JobStatus::GeneratingScenes).unwrap_err();
    assert!(err.to_string().contains("generating_scenes"));
    assert_eq!(job.status(), JobStatus::Assembling);
}

#[test]
fn job_snapshot_survives_json() {
    let selection = BackendSelection {
        image: Some("cloud-image".into()),
        ..Default::default()
    };
    let mut job = GenerationJob::new(JobInput::Topic("tides".into()), selection);
    job.selection.assembly.bgm = Some(BgmTrack::new("music/calm.mp3"));
    job.scenes = vec![Scene::new(0, "The sea breathes.")];
    job.transition_to(JobStatus::Failed).unwrap();
    job.failure = Some(
        ErrorInfo::classified(ErrorClass::Permanent, "bad size")
            .in_stage(Stage::Image)
            .for_scene(0),
    );

    let json = serde_json::to_string(&job).unwrap();
    let restored: GenerationJob = serde_json::from_str(&json).unwrap();

    assert_eq!(restored, job);
    assert_eq!(restored.status(), JobStatus::Failed);
    assert_eq!(restored.failure.unwrap().kind, FailureKind::Permanent);
}

#[test]
fn bgm_defaults_apply_when_fields_are_missing() {
    let track: BgmTrack = serde_json::from_str(r#"{"path": "bgm.mp3"}"#).unwrap();
    assert_eq!(track.volume, 0.2);
    assert_eq!(track.mode, BgmMode::Loop);

    let loud: BgmTrack = serde_json::from_str(r#"{"path": "bgm.mp3", "volume": 3.0}"#).unwrap();
    assert_eq!(loud.effective_volume(), 1.0);
}

//! Job-level policy for scenes that fail.

use serde::{Deserialize, Serialize};

/// What a job does when some scenes cannot be completed.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Default,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ScenePolicy {
    /// Any failed scene fails the job
    #[default]
    Fatal,
    /// Failed scenes are left out of the video
    BestEffort,
}

//! Script splitting command handler.

use super::commands::RuleArg;
use reelweave::{
    JsonError, PipelineConfig, ReelweaveResult, SegmentationRule, StorageError, StorageErrorKind,
    segment_script,
};
use std::path::Path;
use tokio::io::AsyncReadExt;

/// Segment a script and print its scenes as JSON.
pub async fn split_script(
    input: Option<&Path>,
    text: Option<&str>,
    rule: Option<RuleArg>,
    config: &PipelineConfig,
) -> ReelweaveResult<()> {
    let script = match (text, input) {
        (Some(text), _) => text.to_string(),
        (None, Some(path)) => tokio::fs::read_to_string(path).await.map_err(|e| {
            StorageError::new(StorageErrorKind::FileRead(format!("{}: {}", path.display(), e)))
        })?,
        (None, None) => {
            let mut buffer = String::new();
            tokio::io::stdin()
                .read_to_string(&mut buffer)
                .await
                .map_err(|e| {
                    StorageError::new(StorageErrorKind::FileRead(format!("stdin: {}", e)))
                })?;
            buffer
        }
    };

    let rule = rule
        .map(SegmentationRule::from)
        .unwrap_or(config.pipeline.segmentation);
    let scenes = segment_script(&script, rule).into_scenes();
    tracing::info!(rule = %rule, scenes = scenes.len(), "Split script");

    let json = serde_json::to_string_pretty(&scenes).map_err(|e| JsonError::new(e.to_string()))?;
    println!("{}", json);
    Ok(())
}

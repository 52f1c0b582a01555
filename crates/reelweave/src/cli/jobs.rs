//! Job archive command handlers.

use super::commands::{JobsCommands, OutputFormat};
use reelweave::{
    FileSystemJobRepository, JobFilter, JobId, JobRepository, JsonError, PipelineConfig,
    PipelineError, PipelineErrorKind, ReelweaveResult,
};

/// Handle job archive commands.
pub async fn handle_jobs_command(cmd: JobsCommands, config: &PipelineConfig) -> ReelweaveResult<()> {
    let repository = FileSystemJobRepository::new(&config.pipeline.output_dir)?;

    match cmd {
        JobsCommands::List {
            status,
            limit,
            format,
        } => {
            let mut filter = JobFilter::new().with_limit(limit);
            if let Some(status) = status {
                filter = filter.with_status(status.into());
            }
            list_jobs(&repository, &filter, format).await
        }

        JobsCommands::Show { id } => {
            let job = repository.load(parse_id(&id)?).await?;
            let json =
                serde_json::to_string_pretty(&job).map_err(|e| JsonError::new(e.to_string()))?;
            println!("{}", json);
            Ok(())
        }

        JobsCommands::Delete { id } => {
            let id = parse_id(&id)?;
            repository.delete(id).await?;
            println!("Deleted job {} and its assets", id);
            Ok(())
        }

        JobsCommands::Duplicate { id } => {
            let id = parse_id(&id)?;
            let copy = repository.duplicate(id).await?;
            repository.save(&copy).await?;
            println!("Created pending job {} from {}", copy.id, id);
            Ok(())
        }

        JobsCommands::Stats { format } => show_statistics(&repository, format).await,
    }
}

async fn show_statistics(
    repository: &FileSystemJobRepository,
    format: OutputFormat,
) -> ReelweaveResult<()> {
    let stats = repository.statistics().await?;

    match format {
        OutputFormat::Json => {
            let json =
                serde_json::to_string_pretty(&stats).map_err(|e| JsonError::new(e.to_string()))?;
            println!("{}", json);
        }
        OutputFormat::Human => {
            println!("Archive '{}':", repository.layout().root().display());
            println!("  Jobs:      {}", stats.total);
            println!("  Completed: {}", stats.completed);
            println!("  Failed:    {}", stats.failed);
            println!("  Duration:  {:.1}s", stats.total_duration_seconds);
            println!("  Size:      {:.1} MB", stats.total_size_bytes as f64 / 1_048_576.0);
        }
    }

    Ok(())
}

async fn list_jobs(
    repository: &FileSystemJobRepository,
    filter: &JobFilter,
    format: OutputFormat,
) -> ReelweaveResult<()> {
    let jobs = repository.list(filter).await?;

    match format {
        OutputFormat::Json => {
            let json =
                serde_json::to_string_pretty(&jobs).map_err(|e| JsonError::new(e.to_string()))?;
            println!("{}", json);
        }
        OutputFormat::Human => {
            println!("Jobs in '{}':", repository.layout().root().display());
            println!("{:-<80}", "");
            for job in &jobs {
                println!(
                    "{}  {:<18} {:>3}/{:<3} {}  {}",
                    job.id,
                    job.status.to_string(),
                    job.completed_scenes,
                    job.scene_count,
                    job.created_at.format("%Y-%m-%d %H:%M"),
                    job.title
                );
                if let Some(message) = &job.error_message {
                    println!("    {}", message);
                }
            }
            println!("{:-<80}", "");
            println!("Total: {} jobs", jobs.len());
        }
    }

    Ok(())
}

fn parse_id(id: &str) -> ReelweaveResult<JobId> {
    id.parse()
        .map_err(|_| PipelineError::new(PipelineErrorKind::JobNotFound(id.to_string())).into())
}

//! Hand a rendered script to sbatch.

use submit_slurm::{CommandError, Scheduler, parse_submitted_job_id};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SubmitError {
    #[error("Failed to submit job: {0}")]
    Rejected(String),
    #[error("Failed to run sbatch: {0}")]
    Execution(String),
    #[error("Could not extract job ID from: {0}")]
    MissingJobId(String),
}

/// A job accepted by the scheduler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmittedJob {
    pub job_id: String,
    /// sbatch's own confirmation text.
    pub message: String,
}

/// Pipe `script` to sbatch and read back the job ID.
///
/// A rejected submission is never retried.
pub async fn submit_job<S: Scheduler>(
    scheduler: &S,
    script: &str,
) -> Result<SubmittedJob, SubmitError> {
    let stdout = scheduler.submit_script(script).await.map_err(|e| match e {
        CommandError::Failed { stderr, .. } => SubmitError::Rejected(stderr),
        CommandError::Execution { error, .. } => SubmitError::Execution(error),
    })?;

    let job_id = parse_submitted_job_id(&stdout)
        .ok_or_else(|| SubmitError::MissingJobId(stdout.trim().to_string()))?;

    tracing::debug!("sbatch accepted job {}", job_id);

    Ok(SubmittedJob {
        job_id,
        message: stdout.trim().to_string(),
    })
}

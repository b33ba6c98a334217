//! Query the live queue via squeue.

use crate::scheduler::Scheduler;
use submit_parsers::CommandError;

/// squeue format field for the node list.
const NODES_FORMAT: &str = "%N";

/// squeue format field for the extended job state.
const STATE_FORMAT: &str = "%T";

/// Parse the `%N` field of squeue.
///
/// A pending job shows an empty field, "(null)", or a parenthesised reason;
/// none of those is an allocation.
pub fn parse_queue_nodes(stdout: &str) -> Option<String> {
    let nodes = stdout.trim();
    if nodes.is_empty() || nodes == "(null)" || nodes.contains('(') {
        return None;
    }
    Some(nodes.to_string())
}

/// Whether squeue still lists the job.
pub fn parse_in_queue(stdout: &str) -> bool {
    !stdout.trim().is_empty()
}

/// Nodes allocated to a job according to squeue, if it has started.
pub async fn query_queue_nodes<S: Scheduler>(
    scheduler: &S,
    job_id: &str,
) -> Result<Option<String>, CommandError> {
    let stdout = scheduler.queue_field(job_id, NODES_FORMAT).await?;
    Ok(parse_queue_nodes(&stdout))
}

/// Whether the job is still pending or running.
///
/// squeue errors once a job has been purged from the controller, so a
/// failed call counts as "no longer queued".
pub async fn query_in_queue<S: Scheduler>(scheduler: &S, job_id: &str) -> bool {
    match scheduler.queue_field(job_id, STATE_FORMAT).await {
        Ok(stdout) => parse_in_queue(&stdout),
        Err(e) => {
            tracing::debug!("squeue for job {} failed: {}", job_id, e);
            false
        }
    }
}

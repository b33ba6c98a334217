//! Polling loops that wait for node allocation and job completion.

use std::time::Duration;
use submit_parsers::format_duration;
use submit_slurm::{
    Scheduler, TerminalState, query_in_queue, query_job_nodes, query_queue_nodes,
    query_terminal_state,
};

/// How a pause between polls ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Wake {
    Elapsed,
    /// The user pressed Ctrl-C.
    Interrupted,
}

/// Sleep between polls. Injected so tests don't wait on the wall clock.
#[allow(async_fn_in_trait)]
pub trait Pause {
    async fn pause(&self, duration: Duration) -> Wake;
}

/// Real sleep that wakes early on Ctrl-C.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioPause;

impl Pause for TokioPause {
    async fn pause(&self, duration: Duration) -> Wake {
        tokio::select! {
            _ = tokio::time::sleep(duration) => Wake::Elapsed,
            res = tokio::signal::ctrl_c() => match res {
                Ok(()) => Wake::Interrupted,
                Err(e) => {
                    tracing::warn!("Cannot listen for Ctrl-C: {}", e);
                    tokio::time::sleep(duration).await;
                    Wake::Elapsed
                }
            },
        }
    }
}

/// Configuration for the polling loops.
#[derive(Debug, Clone)]
pub struct PollSettings {
    /// Time between scheduler queries.
    pub interval: Duration,
    /// Node discovery gives up after this many queries.
    pub max_attempts: u32,
}

impl Default for PollSettings {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(10),
            max_attempts: 30,
        }
    }
}

/// Final verdict of [`wait_for_completion`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobOutcome {
    Succeeded(TerminalState),
    /// FAILED or CANCELLED.
    Failed(TerminalState),
    /// Stopped watching on Ctrl-C; the job keeps running.
    Detached,
}

/// One look at the job's nodes: squeue first, then scontrol.
async fn observe_nodes<S: Scheduler>(scheduler: &S, job_id: &str) -> Option<String> {
    match query_queue_nodes(scheduler, job_id).await {
        Ok(Some(nodes)) => return Some(nodes),
        Ok(None) => {}
        Err(e) => tracing::debug!("squeue for job {} failed: {}", job_id, e),
    }

    match query_job_nodes(scheduler, job_id).await {
        Ok(nodes) => nodes,
        Err(e) => {
            tracing::debug!("scontrol for job {} failed: {}", job_id, e);
            None
        }
    }
}

/// Wait until the scheduler reports nodes for `job_id`.
///
/// Returns the raw node expression (e.g. `node[01-03]`), or None once
/// `max_attempts` queries came back empty or the user interrupted.
pub async fn wait_for_nodes<S: Scheduler, P: Pause>(
    scheduler: &S,
    pause: &P,
    job_id: &str,
    settings: &PollSettings,
) -> Option<String> {
    for attempt in 1..=settings.max_attempts {
        if let Some(nodes) = observe_nodes(scheduler, job_id).await {
            tracing::debug!("Job {} allocated nodes {}", job_id, nodes);
            return Some(nodes);
        }
        if attempt == settings.max_attempts {
            break;
        }

        if pause.pause(settings.interval).await == Wake::Interrupted {
            tracing::info!("Interrupted, no longer waiting for nodes");
            return None;
        }
        tracing::info!(
            "Waiting for job {} to be allocated nodes... (attempt {}/{})",
            job_id,
            attempt,
            settings.max_attempts
        );
    }

    tracing::warn!(
        "Job {} has no nodes after {} attempts",
        job_id,
        settings.max_attempts
    );
    None
}

/// Wait until `job_id` leaves the queue, then classify its final state.
///
/// There is no attempt limit; the job's own time limit bounds the wait.
/// A job that squeue no longer lists but sacct still shows as live is
/// waited on further.
pub async fn wait_for_completion<S: Scheduler, P: Pause>(
    scheduler: &S,
    pause: &P,
    job_id: &str,
    interval: Duration,
) -> JobOutcome {
    let mut waited = Duration::ZERO;

    let state = loop {
        if !query_in_queue(scheduler, job_id).await {
            let state = match query_terminal_state(scheduler, job_id).await {
                Ok(state) => state,
                Err(e) => {
                    tracing::warn!("sacct for job {} failed: {}", job_id, e);
                    TerminalState::Other(String::new())
                }
            };
            if !state.is_active() {
                break state;
            }
            tracing::debug!(
                "squeue lost job {} but sacct reports {}, still waiting",
                job_id,
                state
            );
        }

        if pause.pause(interval).await == Wake::Interrupted {
            return JobOutcome::Detached;
        }
        waited += interval;
    };

    tracing::info!(
        "Job {} left the queue as {} after {} of waiting",
        job_id,
        state,
        format_duration(waited.as_secs())
    );

    if state.is_failure() {
        JobOutcome::Failed(state)
    } else {
        JobOutcome::Succeeded(state)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{FakeScheduler, RecordingPause};

    fn settings() -> PollSettings {
        PollSettings::default()
    }

    #[tokio::test]
    async fn test_wait_for_nodes_after_two_pending_polls() {
        let scheduler = FakeScheduler::new()
            .push_queue_nodes("(null)\n")
            .push_queue_nodes("(null)\n")
            .push_queue_nodes("node042\n");
        let pause = RecordingPause::new();

        let nodes = wait_for_nodes(&scheduler, &pause, "12345", &settings()).await;

        assert_eq!(nodes.as_deref(), Some("node042"));
        assert_eq!(pause.count(), 2);
        assert_eq!(pause.total(), Duration::from_secs(20));
    }

    #[tokio::test]
    async fn test_wait_for_nodes_falls_back_to_scontrol() {
        let scheduler = FakeScheduler::new()
            .push_queue_nodes("(Priority)\n")
            .push_show_job("JobId=7 JobState=RUNNING\n   NodeList=node[01-02]\n");
        let pause = RecordingPause::new();

        let nodes = wait_for_nodes(&scheduler, &pause, "7", &settings()).await;

        assert_eq!(nodes.as_deref(), Some("node[01-02]"));
        assert_eq!(pause.count(), 0);
    }

    #[tokio::test]
    async fn test_wait_for_nodes_gives_up() {
        let scheduler = FakeScheduler::new();
        let pause = RecordingPause::new();
        let settings = PollSettings {
            interval: Duration::from_secs(10),
            max_attempts: 30,
        };

        let nodes = wait_for_nodes(&scheduler, &pause, "12345", &settings).await;

        assert_eq!(nodes, None);
        assert_eq!(scheduler.call_count("squeue"), 30);
        assert_eq!(scheduler.call_count("scontrol"), 30);
        assert_eq!(pause.count(), 29);
    }

    #[tokio::test]
    async fn test_wait_for_nodes_interrupted() {
        let scheduler = FakeScheduler::new();
        let pause = RecordingPause::interrupting_at(3);

        let nodes = wait_for_nodes(&scheduler, &pause, "12345", &settings()).await;

        assert_eq!(nodes, None);
        assert_eq!(pause.count(), 3);
        assert_eq!(scheduler.call_count("squeue"), 3);
    }

    #[tokio::test]
    async fn test_wait_for_completion_cancelled() {
        let scheduler = FakeScheduler::new()
            .push_queue_state("RUNNING\n")
            .push_queue_state("RUNNING\n")
            .push_queue_state("")
            .push_accounting("CANCELLED by 501\n");
        let pause = RecordingPause::new();

        let outcome =
            wait_for_completion(&scheduler, &pause, "12345", Duration::from_secs(10)).await;

        assert_eq!(outcome, JobOutcome::Failed(TerminalState::Cancelled));
        assert_eq!(pause.count(), 2);
    }

    #[tokio::test]
    async fn test_wait_for_completion_completed() {
        let scheduler = FakeScheduler::new()
            .push_queue_state("PENDING\n")
            .push_accounting("COMPLETED\n");
        let pause = RecordingPause::new();

        let outcome =
            wait_for_completion(&scheduler, &pause, "12345", Duration::from_secs(10)).await;

        assert_eq!(outcome, JobOutcome::Succeeded(TerminalState::Completed));
        assert_eq!(pause.count(), 1);
    }

    #[tokio::test]
    async fn test_wait_for_completion_other_state_is_success() {
        let scheduler = FakeScheduler::new().push_accounting("TIMEOUT\n");
        let pause = RecordingPause::new();

        let outcome =
            wait_for_completion(&scheduler, &pause, "12345", Duration::from_secs(10)).await;

        assert_eq!(
            outcome,
            JobOutcome::Succeeded(TerminalState::Other("TIMEOUT".to_string()))
        );
        assert_eq!(pause.count(), 0);
    }

    #[tokio::test]
    async fn test_wait_for_completion_keeps_waiting_while_sacct_shows_running() {
        let scheduler = FakeScheduler::new()
            .push_queue_state("RUNNING\n")
            .push_queue_state("")
            .push_queue_state("")
            .push_accounting("RUNNING\n")
            .push_accounting("FAILED\n");
        let pause = RecordingPause::new();

        let outcome =
            wait_for_completion(&scheduler, &pause, "12345", Duration::from_secs(10)).await;

        assert_eq!(outcome, JobOutcome::Failed(TerminalState::Failed));
        assert_eq!(scheduler.call_count("sacct"), 2);
        assert_eq!(pause.count(), 2);
    }

    #[tokio::test]
    async fn test_wait_for_completion_detached() {
        let scheduler = FakeScheduler::new()
            .push_queue_state("RUNNING\n")
            .push_queue_state("RUNNING\n");
        let pause = RecordingPause::interrupting_at(2);

        let outcome =
            wait_for_completion(&scheduler, &pause, "12345", Duration::from_secs(10)).await;

        assert_eq!(outcome, JobOutcome::Detached);
        assert_eq!(scheduler.call_count("sacct"), 0);
    }
}

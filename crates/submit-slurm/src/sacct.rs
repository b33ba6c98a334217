//! Query finished jobs via sacct.

use crate::scheduler::Scheduler;
use crate::types::TerminalState;
use submit_parsers::{CommandError, first_line};

/// Parse `sacct -X --format=State` output. The first line is the allocation.
pub fn parse_terminal_state(stdout: &str) -> TerminalState {
    TerminalState::parse(first_line(stdout).unwrap_or(""))
}

/// Final state of a job that has left the queue.
pub async fn query_terminal_state<S: Scheduler>(
    scheduler: &S,
    job_id: &str,
) -> Result<TerminalState, CommandError> {
    let stdout = scheduler.accounting_state(job_id).await?;
    Ok(parse_terminal_state(&stdout))
}

//! SLURM job types.

use std::fmt;

/// Final state of a job as reported by sacct once it has left the queue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TerminalState {
    Completed,
    Failed,
    Cancelled,
    /// Any other text, including an empty accounting record.
    Other(String),
}

impl TerminalState {
    /// Parse a sacct State value such as "COMPLETED" or "CANCELLED by 12345".
    pub fn parse(state: &str) -> Self {
        let base = state.split_whitespace().next().unwrap_or("");
        match base.to_uppercase().as_str() {
            "COMPLETED" | "CD" => TerminalState::Completed,
            "FAILED" | "F" => TerminalState::Failed,
            "CANCELLED" | "CA" => TerminalState::Cancelled,
            _ => TerminalState::Other(state.trim().to_string()),
        }
    }

    /// Whether the job should be reported as failed.
    ///
    /// Only FAILED and CANCELLED count; anything else that left the queue
    /// is treated as a success.
    pub fn is_failure(&self) -> bool {
        matches!(self, TerminalState::Failed | TerminalState::Cancelled)
    }

    /// Whether accounting still shows the job as live.
    ///
    /// squeue can drop a job for a moment while the controller is busy;
    /// sacct then still reports one of these states.
    pub fn is_active(&self) -> bool {
        let TerminalState::Other(state) = self else {
            return false;
        };
        let base = state.split_whitespace().next().unwrap_or("");
        matches!(
            base.to_uppercase().as_str(),
            "PENDING"
                | "PD"
                | "RUNNING"
                | "R"
                | "SUSPENDED"
                | "S"
                | "COMPLETING"
                | "CG"
                | "CONFIGURING"
                | "CF"
                | "REQUEUED"
                | "RQ"
                | "REQUEUE_HOLD"
                | "REQUEUE_FED"
                | "RESIZING"
                | "RS"
                | "STOPPED"
                | "ST"
        )
    }
}

impl fmt::Display for TerminalState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TerminalState::Completed => write!(f, "COMPLETED"),
            TerminalState::Failed => write!(f, "FAILED"),
            TerminalState::Cancelled => write!(f, "CANCELLED"),
            TerminalState::Other(s) if s.is_empty() => write!(f, "UNKNOWN"),
            TerminalState::Other(s) => write!(f, "{}", s),
        }
    }
}

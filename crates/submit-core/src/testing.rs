//! Test doubles for [`Scheduler`] and [`Pause`].
//!
//! Responses are queued per tool and consumed in order; once a queue is
//! empty the tool answers with empty output, which reads as "nothing yet".

use crate::poll::{Pause, Wake};
use std::cell::{Cell, RefCell};
use std::collections::{HashMap, VecDeque};
use std::time::Duration;
use submit_slurm::{CommandError, Scheduler};

type Responses = RefCell<VecDeque<Result<String, CommandError>>>;

/// Scripted scheduler.
#[derive(Default)]
pub struct FakeScheduler {
    submit: Responses,
    queue_nodes: Responses,
    queue_state: Responses,
    show_job: Responses,
    accounting: Responses,
    associations: HashMap<String, String>,
    submitted: RefCell<Vec<String>>,
    calls: RefCell<Vec<&'static str>>,
}

impl FakeScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_submit_output(self, stdout: &str) -> Self {
        self.submit.borrow_mut().push_back(Ok(stdout.to_string()));
        self
    }

    pub fn with_submit_rejection(self, stderr: &str) -> Self {
        self.submit.borrow_mut().push_back(Err(CommandError::Failed {
            command: "sbatch".to_string(),
            stderr: stderr.to_string(),
        }));
        self
    }

    /// Queue an answer for `squeue --format=%N`.
    pub fn push_queue_nodes(self, stdout: &str) -> Self {
        self.queue_nodes.borrow_mut().push_back(Ok(stdout.to_string()));
        self
    }

    /// Queue an answer for `squeue --format=%T`.
    pub fn push_queue_state(self, stdout: &str) -> Self {
        self.queue_state.borrow_mut().push_back(Ok(stdout.to_string()));
        self
    }

    pub fn push_show_job(self, stdout: &str) -> Self {
        self.show_job.borrow_mut().push_back(Ok(stdout.to_string()));
        self
    }

    pub fn push_accounting(self, stdout: &str) -> Self {
        self.accounting.borrow_mut().push_back(Ok(stdout.to_string()));
        self
    }

    /// Answer `sacctmgr ... format=<field>` with `stdout` every time.
    pub fn with_association(mut self, field: &str, stdout: &str) -> Self {
        self.associations
            .insert(field.to_string(), stdout.to_string());
        self
    }

    /// Scripts received by `submit_script`, in order.
    pub fn submitted_scripts(&self) -> Vec<String> {
        self.submitted.borrow().clone()
    }

    /// Number of invocations of a tool ("sbatch", "squeue", "scontrol", "sacct", "sacctmgr").
    pub fn call_count(&self, tool: &str) -> usize {
        self.calls.borrow().iter().filter(|c| **c == tool).count()
    }

    fn next(&self, tool: &'static str, responses: &Responses) -> Result<String, CommandError> {
        self.calls.borrow_mut().push(tool);
        responses
            .borrow_mut()
            .pop_front()
            .unwrap_or_else(|| Ok(String::new()))
    }
}

impl Scheduler for FakeScheduler {
    async fn submit_script(&self, script: &str) -> Result<String, CommandError> {
        self.submitted.borrow_mut().push(script.to_string());
        self.next("sbatch", &self.submit)
    }

    async fn queue_field(&self, _job_id: &str, format: &str) -> Result<String, CommandError> {
        match format {
            "%N" => self.next("squeue", &self.queue_nodes),
            _ => self.next("squeue", &self.queue_state),
        }
    }

    async fn show_job(&self, _job_id: &str) -> Result<String, CommandError> {
        self.next("scontrol", &self.show_job)
    }

    async fn accounting_state(&self, _job_id: &str) -> Result<String, CommandError> {
        self.next("sacct", &self.accounting)
    }

    async fn association_field(&self, field: &str) -> Result<String, CommandError> {
        self.calls.borrow_mut().push("sacctmgr");
        Ok(self.associations.get(field).cloned().unwrap_or_default())
    }
}

/// Pause that returns immediately and records what it was asked to sleep.
#[derive(Debug, Default)]
pub struct RecordingPause {
    sleeps: RefCell<Vec<Duration>>,
    interrupt_at: Option<usize>,
    seen: Cell<usize>,
}

impl RecordingPause {
    pub fn new() -> Self {
        Self::default()
    }

    /// The `n`th pause (1-based) reports an interrupt.
    pub fn interrupting_at(n: usize) -> Self {
        Self {
            interrupt_at: Some(n),
            ..Self::default()
        }
    }

    /// Number of pauses taken.
    pub fn count(&self) -> usize {
        self.seen.get()
    }

    /// Total simulated sleep.
    pub fn total(&self) -> Duration {
        self.sleeps.borrow().iter().sum()
    }
}

impl Pause for RecordingPause {
    async fn pause(&self, duration: Duration) -> Wake {
        let n = self.seen.get() + 1;
        self.seen.set(n);
        if self.interrupt_at == Some(n) {
            return Wake::Interrupted;
        }
        self.sleeps.borrow_mut().push(duration);
        Wake::Elapsed
    }
}

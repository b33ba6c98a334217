//! The narrow capability through which everything talks to SLURM.
//!
//! Each method runs one scheduler tool and hands back its raw stdout. The
//! per-tool modules (`sbatch`, `squeue`, `scontrol`, `sacct`, `sacctmgr`)
//! build typed queries on top of it, which lets the polling logic run
//! against a fake in tests.

use submit_parsers::{CommandError, run_command, run_command_with_input};
use tokio::process::Command;

#[allow(async_fn_in_trait)]
pub trait Scheduler {
    /// `sbatch` with the script on stdin.
    async fn submit_script(&self, script: &str) -> Result<String, CommandError>;

    /// `squeue -j <job_id> --noheader --format=<format>`.
    async fn queue_field(&self, job_id: &str, format: &str) -> Result<String, CommandError>;

    /// `scontrol show job <job_id>`.
    async fn show_job(&self, job_id: &str) -> Result<String, CommandError>;

    /// `sacct -j <job_id> -X --noheader --format=State`.
    async fn accounting_state(&self, job_id: &str) -> Result<String, CommandError>;

    /// `sacctmgr show association where user=<user> format=<field> --noheader --parsable`.
    async fn association_field(&self, field: &str) -> Result<String, CommandError>;
}

/// Scheduler backed by the real SLURM command-line tools.
#[derive(Debug, Clone)]
pub struct SlurmCli {
    user: String,
}

impl SlurmCli {
    pub fn new(user: impl Into<String>) -> Self {
        Self { user: user.into() }
    }

    /// Use the invoking user from `$USER`.
    pub fn from_env() -> Self {
        Self::new(std::env::var("USER").unwrap_or_default())
    }
}

impl Scheduler for SlurmCli {
    async fn submit_script(&self, script: &str) -> Result<String, CommandError> {
        let mut cmd = Command::new("sbatch");
        run_command_with_input(&mut cmd, "sbatch", script).await
    }

    async fn queue_field(&self, job_id: &str, format: &str) -> Result<String, CommandError> {
        let mut cmd = Command::new("squeue");
        cmd.args(["-j", job_id, "--noheader", &format!("--format={}", format)]);
        run_command(&mut cmd, "squeue").await
    }

    async fn show_job(&self, job_id: &str) -> Result<String, CommandError> {
        let mut cmd = Command::new("scontrol");
        cmd.args(["show", "job", job_id]);
        run_command(&mut cmd, "scontrol").await
    }

    async fn accounting_state(&self, job_id: &str) -> Result<String, CommandError> {
        let mut cmd = Command::new("sacct");
        cmd.args(["-j", job_id, "-X", "--noheader", "--format=State"]);
        run_command(&mut cmd, "sacct").await
    }

    async fn association_field(&self, field: &str) -> Result<String, CommandError> {
        let mut cmd = Command::new("sacctmgr");
        cmd.args([
            "show",
            "association",
            "where",
            &format!("user={}", self.user),
            &format!("format={}", field),
            "--noheader",
            "--parsable",
        ]);
        run_command(&mut cmd, "sacctmgr").await
    }
}

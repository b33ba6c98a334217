//! SLURM integration for submit.
//!
//! Submit through sbatch, follow jobs via squeue, scontrol and sacct, and
//! look up the user's association via sacctmgr.

pub mod sacct;
pub mod sacctmgr;
pub mod sbatch;
pub mod scheduler;
pub mod scontrol;
pub mod squeue;
pub mod types;

pub use sacct::query_terminal_state;
pub use sacctmgr::{query_cluster_name, query_default_account};
pub use sbatch::parse_submitted_job_id;
pub use scheduler::{Scheduler, SlurmCli};
pub use scontrol::query_job_nodes;
pub use squeue::{query_in_queue, query_queue_nodes};
pub use submit_parsers::CommandError;
pub use types::TerminalState;

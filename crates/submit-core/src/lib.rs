//! Job submission for the supported SLURM clusters.
//!
//! Detect the cluster, render a batch script for it, submit it, wait for
//! nodes and (optionally) completion, and format what the user needs to
//! attach to the job.

pub mod cluster;
pub mod config;
pub mod detect;
pub mod poll;
pub mod present;
pub mod script;
pub mod submit;
#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use cluster::{Cluster, ClusterError, ResourceRequest, derive_ssh_port};
pub use config::{ConfigError, JobConfig};
pub use detect::{default_account, detect_cluster};
pub use poll::{
    JobOutcome, Pause, PollSettings, TokioPause, Wake, wait_for_completion, wait_for_nodes,
};
pub use present::{DEFAULT_BOX_WIDTH, first_node, format_in_box, ssh_instructions};
pub use script::{ScriptError, build_script, prepare_script};
pub use submit::{SubmitError, SubmittedJob, submit_job};

//! CLI argument parsing for submit and ssh-info.

use camino::Utf8PathBuf;
use clap::Parser;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "submit")]
#[command(about = "Submit a command as a SLURM batch job inside a tmux session")]
pub struct SubmitArgs {
    /// SLURM account to use (default: first account from sacctmgr)
    #[arg(short = 'a', long, env = "SUBMIT_ACCOUNT")]
    pub account: Option<String>,

    /// Time allocation in SLURM format
    #[arg(short, long, default_value = "0-00:30:00")]
    pub time: String,

    /// Number of GPUs per node
    #[arg(short, long, default_value = "1")]
    pub gpus_per_node: u32,

    /// Device type, e.g. A100:80GB, or "cpu" for no GPU (default: cluster default)
    #[arg(short = 'm', long)]
    pub device: Option<String>,

    /// CPU cores per GPU
    #[arg(long, default_value = "16", alias = "cpus-per-node")]
    pub cpus_per_gpu: u32,

    /// Number of nodes
    #[arg(short = 'N', long, default_value = "1")]
    pub nodes: u32,

    /// Number of tasks
    #[arg(short, long, default_value = "1")]
    pub num_tasks: u32,

    /// Prefix for the command, e.g. "uv run"
    #[arg(long, default_value = "")]
    pub shell_env: String,

    /// Start an empty tmux session instead of running a command
    #[arg(short, long)]
    pub interactive: bool,

    /// Print the batch script without submitting it
    #[arg(long)]
    pub dry_run: bool,

    /// Wait for the job to finish and exit non-zero if it failed
    #[arg(long)]
    pub blocking: bool,

    /// Do not start an SSH server inside the job
    #[arg(long)]
    pub no_ssh: bool,

    /// Directory for job output (default: ~/.cache/slurm)
    #[arg(long)]
    pub stdout_path: Option<Utf8PathBuf>,

    /// Scheduler poll interval in seconds
    #[arg(long, default_value = "10", value_parser = clap::value_parser!(u64).range(1..))]
    pub poll_interval: u64,

    /// Log debug output
    #[arg(short, long)]
    pub verbose: bool,

    /// The command to run, along with its arguments
    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    pub command: Vec<String>,
}

impl SubmitArgs {
    /// Output directory, defaulting to `$HOME/.cache/slurm`.
    pub fn output_dir(&self) -> Option<Utf8PathBuf> {
        self.stdout_path.clone().or_else(default_output_dir)
    }
}

#[derive(Parser, Debug)]
#[command(name = "ssh-info")]
#[command(about = "Show how to reach a running SLURM job over ssh")]
pub struct SshInfoArgs {
    /// SLURM job ID
    #[arg(short, long)]
    pub job: String,

    /// Scheduler poll interval in seconds
    #[arg(long, default_value = "10", value_parser = clap::value_parser!(u64).range(1..))]
    pub poll_interval: u64,

    /// Log debug output
    #[arg(short, long)]
    pub verbose: bool,
}

/// `$HOME/.cache/slurm`, if `$HOME` is set.
pub fn default_output_dir() -> Option<Utf8PathBuf> {
    let home = std::env::var("HOME").ok().filter(|h| !h.is_empty())?;
    Some(Utf8PathBuf::from(home).join(".cache").join("slurm"))
}

/// Log to stderr, honouring `RUST_LOG` when set.
pub fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .init();
}

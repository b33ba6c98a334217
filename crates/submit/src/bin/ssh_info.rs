//! ssh-info - print SSH and tmux instructions for an already submitted job.

use clap::Parser;
use miette::{IntoDiagnostic, Result};
use std::time::Duration;
use submit_cli::{SshInfoArgs, init_tracing};
use submit_core::{PollSettings, TokioPause, detect_cluster, ssh_instructions, wait_for_nodes};
use submit_slurm::SlurmCli;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let args = SshInfoArgs::parse();
    init_tracing(args.verbose);

    let scheduler = SlurmCli::from_env();
    let cluster = detect_cluster(&scheduler).await.into_diagnostic()?;

    let settings = PollSettings {
        interval: Duration::from_secs(args.poll_interval),
        ..PollSettings::default()
    };
    let nodes = wait_for_nodes(&scheduler, &TokioPause, &args.job, &settings).await;

    let info = ssh_instructions(&args.job, nodes.as_deref(), cluster, false).into_diagnostic()?;
    println!("{}", info);

    Ok(())
}

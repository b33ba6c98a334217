//! submit - run a command as a SLURM batch job inside a tmux session.

use clap::Parser;
use miette::{IntoDiagnostic, Result, miette};
use std::process::ExitCode;
use std::time::Duration;
use submit_cli::{SubmitArgs, init_tracing};
use submit_core::{
    DEFAULT_BOX_WIDTH, JobConfig, JobOutcome, PollSettings, TokioPause, default_account,
    detect_cluster, format_in_box, prepare_script, ssh_instructions, submit_job,
    wait_for_completion, wait_for_nodes,
};
use submit_slurm::SlurmCli;

/// Exit code when the user stops a blocking wait with Ctrl-C.
const EXIT_DETACHED: u8 = 130;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<ExitCode> {
    let args = SubmitArgs::parse();
    init_tracing(args.verbose);

    let scheduler = SlurmCli::from_env();
    let cluster = detect_cluster(&scheduler).await.into_diagnostic()?;
    tracing::debug!("Submitting to {}", cluster);

    let account = match args.account.clone() {
        Some(account) => account,
        None => default_account(&scheduler)
            .await
            .into_diagnostic()?
            .ok_or_else(|| miette!("No SLURM account given and none found via sacctmgr"))?,
    };
    let output_dir = args
        .output_dir()
        .ok_or_else(|| miette!("HOME is not set; pass --stdout-path"))?;

    let config = JobConfig {
        account,
        time_limit: args.time.clone(),
        gpus_per_node: args.gpus_per_node,
        device: args.device.clone(),
        cpus_per_gpu: args.cpus_per_gpu,
        nodes: args.nodes,
        num_tasks: args.num_tasks,
        shell_env: Some(args.shell_env.clone()),
        interactive: args.interactive,
        no_ssh: args.no_ssh,
        output_dir,
        command: args.command.clone(),
    }
    .validate(cluster)
    .into_diagnostic()?;

    let script = prepare_script(&config, cluster).into_diagnostic()?;

    if args.dry_run {
        println!("If dry run was disabled, the following sbatch script would have been run:");
        println!("{}", format_in_box(&script, DEFAULT_BOX_WIDTH));
        return Ok(ExitCode::SUCCESS);
    }

    println!("Running the following sbatch script:");
    println!("{}", format_in_box(&script, DEFAULT_BOX_WIDTH));

    let job = submit_job(&scheduler, &script).await.into_diagnostic()?;
    println!("{}", job.message);

    let pause = TokioPause;
    let settings = PollSettings {
        interval: Duration::from_secs(args.poll_interval),
        ..PollSettings::default()
    };

    let nodes = wait_for_nodes(&scheduler, &pause, &job.job_id, &settings).await;
    let info = ssh_instructions(&job.job_id, nodes.as_deref(), cluster, config.no_ssh)
        .into_diagnostic()?;
    println!("{}", info);

    if !args.blocking {
        return Ok(ExitCode::SUCCESS);
    }

    println!("Waiting for job {} to complete...", job.job_id);
    match wait_for_completion(&scheduler, &pause, &job.job_id, settings.interval).await {
        JobOutcome::Succeeded(state) => {
            println!("Job {} finished ({})", job.job_id, state);
            Ok(ExitCode::SUCCESS)
        }
        JobOutcome::Failed(state) => {
            println!("Job {} failed or was cancelled ({})", job.job_id, state);
            Ok(ExitCode::FAILURE)
        }
        JobOutcome::Detached => {
            println!(
                "Stopped waiting; job {} keeps running. Check it with: squeue -j {}",
                job.job_id, job.job_id
            );
            Ok(ExitCode::from(EXIT_DETACHED))
        }
    }
}

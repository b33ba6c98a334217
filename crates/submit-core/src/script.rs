//! Batch script assembly.

use crate::cluster::Cluster;
use crate::config::JobConfig;
use camino::Utf8Path;
use std::fs;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ScriptError {
    #[error("Failed to create output directory {path}: {source}")]
    OutputDir {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Cannot shell-quote the job command: {0}")]
    Quote(#[from] shlex::QuoteError),
}

/// Create the job output directory if it does not exist yet.
pub fn ensure_output_dir(dir: &Utf8Path) -> Result<(), ScriptError> {
    fs::create_dir_all(dir).map_err(|source| ScriptError::OutputDir {
        path: dir.to_string(),
        source,
    })
}

/// The line that runs the job inside a tmux session named after the job ID.
///
/// `script` supplies the pseudo-terminal tmux needs inside a batch job.
/// Interactive jobs get an empty session that keeps the allocation alive;
/// batch jobs tee their output to `<output_dir>/$SLURM_JOB_ID.out`.
///
/// The job line is quoted once for the shell `script` starts, and the tmux
/// line once more for the batch shell, so every argument arrives intact.
pub fn command_line(config: &JobConfig) -> Result<String, ScriptError> {
    let mut session = "tmux new-session -s $SLURM_JOB_ID".to_string();
    if !config.interactive {
        let job = format!(
            "{} 2>&1 | tee {}/$SLURM_JOB_ID.out",
            config.full_command()?,
            shlex::try_quote(config.output_dir.as_str())?
        );
        session = format!("{} {}", session, shlex::try_quote(&job)?);
    }

    Ok(format!("script -qec {} /dev/null", shlex::try_quote(&session)?))
}

/// Render the complete batch script for `cluster`.
///
/// `%A` in the output directive is expanded by SLURM, not here.
pub fn build_script(config: &JobConfig, cluster: Cluster) -> Result<String, ScriptError> {
    let mut lines = vec![
        "#!/bin/bash".to_string(),
        format!("#SBATCH -A {}", config.account),
        format!("#SBATCH -t {}", config.time_limit),
    ];
    if config.num_tasks > 1 {
        lines.push(format!("#SBATCH --ntasks {}", config.num_tasks));
    }
    lines.extend(cluster.resource_directives(&config.resources(cluster)));
    lines.push(format!("#SBATCH -o {}", config.output_dir.join("%A.out")));

    let bootstrap = cluster.ssh_bootstrap(config.no_ssh);
    if !bootstrap.is_empty() {
        lines.push(bootstrap);
    }

    lines.push(command_line(config)?);

    let mut script = lines.join("\n");
    script.push('\n');
    Ok(script)
}

/// Create the output directory and render the script.
pub fn prepare_script(config: &JobConfig, cluster: Cluster) -> Result<String, ScriptError> {
    ensure_output_dir(&config.output_dir)?;
    build_script(config, cluster)
}

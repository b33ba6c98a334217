//! Terminal output: boxed text and SSH connection instructions.

use crate::cluster::{Cluster, ClusterError, job_ssh_dir};
use submit_parsers::trim_lines;

/// Default inner width of [`format_in_box`].
pub const DEFAULT_BOX_WIDTH: usize = 76;

/// Wrap `text` in a box-drawing border, hard-wrapping lines longer than `width`.
///
/// Width is counted in characters, not bytes.
pub fn format_in_box(text: &str, width: usize) -> String {
    let width = width.max(1);
    let horizontal = "─".repeat(width + 2);

    let mut lines = vec![format!("┌{}┐", horizontal)];
    for line in text.trim().lines() {
        let chars: Vec<char> = line.chars().collect();
        if chars.is_empty() {
            lines.push(format!("│ {:<width$} │", ""));
            continue;
        }
        for chunk in chars.chunks(width) {
            let segment: String = chunk.iter().collect();
            lines.push(format!("│ {:<width$} │", segment));
        }
    }
    lines.push(format!("└{}┘", horizontal));

    lines.join("\n")
}

/// First host in a SLURM node expression.
///
/// Only the leading item is looked at: `node[01-03,07]` gives `node01`,
/// `gpu1,gpu2` gives `gpu1`. The rest of the range syntax is not expanded.
pub fn first_node(nodes: &str) -> String {
    let nodes = nodes.trim();
    match nodes.find(['[', ',']) {
        Some(i) if nodes[i..].starts_with('[') => {
            let first = nodes[i + 1..].split([',', '-', ']']).next().unwrap_or("");
            format!("{}{}", &nodes[..i], first)
        }
        Some(i) => nodes[..i].to_string(),
        None => nodes.to_string(),
    }
}

/// Text telling the user how to reach the job's tmux session.
///
/// With `no_ssh` only a short summary is given. Without nodes the job has
/// not started yet and a "not yet available" notice is returned instead.
pub fn ssh_instructions(
    job_id: &str,
    nodes: Option<&str>,
    cluster: Cluster,
    no_ssh: bool,
) -> Result<String, ClusterError> {
    if no_ssh {
        let mut lines = vec![format!("Job {} submitted successfully!", job_id)];
        if let Some(nodes) = nodes {
            lines.push(format!("Allocated nodes: {}", nodes));
        }
        lines.push(format!(
            "Note: tmux session '{}' will be available once job starts",
            job_id
        ));
        return Ok(lines.join("\n"));
    }

    let Some(nodes) = nodes else {
        return Ok(format!(
            "Job {id} submitted, but node information not yet available.\n\
             Check job status with: squeue -j {id}\n\
             tmux session '{id}' will be available once job starts on a node",
            id = job_id
        ));
    };

    let port = cluster.ssh_port(job_id)?;
    let host = first_node(nodes);

    let mut info = format!(
        "SSH Connection Information with tmux:
        Job ID: {job_id}
        Node(s): {nodes}
        SSH Port: {port}
        tmux session: {job_id}
        To connect and monitor real-time output:
        ssh -t -p {port} $USER@{host} tmux attach-session -t {job_id}
        To detach from tmux (leave job running): Ctrl-b d
        To list tmux sessions: tmux list-sessions
        You can check job status with: squeue -j {job_id}"
    );
    if cluster.needs_ssh_bootstrap() {
        info.push_str(&format!(
            "\nNote: SSH daemon files are stored in {} on the compute node",
            job_ssh_dir(job_id)
        ));
    }

    Ok(format_in_box(&trim_lines(&info), DEFAULT_BOX_WIDTH))
}

//! Parse sbatch submission output.

use once_cell::sync::Lazy;
use regex::Regex;

static SUBMITTED_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"Submitted batch job (\d+)").expect("valid regex"));

/// Extract the job ID from sbatch output ("Submitted batch job 12345").
///
/// Returns None when the line is missing; nothing else is trusted as a job ID.
pub fn parse_submitted_job_id(stdout: &str) -> Option<String> {
    SUBMITTED_RE
        .captures(stdout)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}

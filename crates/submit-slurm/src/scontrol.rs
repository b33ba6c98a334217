//! Query detailed job information via scontrol.

use crate::scheduler::Scheduler;
use once_cell::sync::Lazy;
use regex::Regex;
use submit_parsers::{CommandError, non_empty_string};

// Anchored so ReqNodeList= and ExcNodeList= are skipped.
static NODELIST_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)(?:^|\s)NodeList=(\S+)").expect("valid regex"));

/// Extract the allocated `NodeList=` value from `scontrol show job` output.
pub fn parse_nodelist(stdout: &str) -> Option<String> {
    NODELIST_RE
        .captures_iter(stdout)
        .filter_map(|caps| caps.get(1))
        .find_map(|m| non_empty_string(m.as_str()))
}

/// Nodes allocated to a job according to scontrol.
pub async fn query_job_nodes<S: Scheduler>(
    scheduler: &S,
    job_id: &str,
) -> Result<Option<String>, CommandError> {
    let stdout = scheduler.show_job(job_id).await?;
    Ok(parse_nodelist(&stdout))
}

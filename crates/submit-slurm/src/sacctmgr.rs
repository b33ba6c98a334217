//! Query the invoking user's associations via sacctmgr.

use crate::scheduler::Scheduler;
use submit_parsers::{CommandError, first_line, non_empty_string};

/// First field of the first association line (`--parsable` output ends
/// every field with `|`).
pub fn parse_association_field(stdout: &str) -> Option<String> {
    let line = first_line(stdout)?;
    line.split('|').next().and_then(non_empty_string)
}

/// Name of the cluster the user's association belongs to.
pub async fn query_cluster_name<S: Scheduler>(
    scheduler: &S,
) -> Result<Option<String>, CommandError> {
    let stdout = scheduler.association_field("Cluster").await?;
    Ok(parse_association_field(&stdout))
}

/// The user's first listed account.
pub async fn query_default_account<S: Scheduler>(
    scheduler: &S,
) -> Result<Option<String>, CommandError> {
    let stdout = scheduler.association_field("Account").await?;
    Ok(parse_association_field(&stdout))
}

//! Work out which cluster we are on from the user's SLURM association.

use crate::cluster::{Cluster, ClusterError};
use submit_slurm::{CommandError, Scheduler, query_cluster_name, query_default_account};

/// Detect the cluster via sacctmgr.
///
/// There is no fallback profile: an unknown or missing name is an error.
pub async fn detect_cluster<S: Scheduler>(scheduler: &S) -> Result<Cluster, ClusterError> {
    let name = query_cluster_name(scheduler)
        .await
        .map_err(|e| ClusterError::Lookup(e.to_string()))?
        .unwrap_or_default();

    let cluster = name.parse::<Cluster>()?;
    tracing::debug!("Detected cluster: {}", cluster);
    Ok(cluster)
}

/// First account the user is associated with, if any.
pub async fn default_account<S: Scheduler>(scheduler: &S) -> Result<Option<String>, CommandError> {
    let account = query_default_account(scheduler).await?;
    tracing::debug!("Default account: {:?}", account);
    Ok(account)
}

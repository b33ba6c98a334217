//! Cluster profiles.
//!
//! Each supported cluster renders its own `#SBATCH` resource directives and,
//! where compute nodes don't run sshd for users, a bootstrap fragment that
//! starts a private sshd inside the job.

use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ClusterError {
    #[error("Cluster {0:?} not supported")]
    Unsupported(String),
    #[error("Failed to look up cluster: {0}")]
    Lookup(String),
    #[error("Invalid job ID: {0:?}")]
    InvalidJobId(String),
}

/// Lowest port handed out to per-job sshd instances.
pub const SSH_PORT_BASE: u64 = 10000;

/// Number of distinct per-job ports; keeps every port below 65000.
pub const SSH_PORT_RANGE: u64 = 55000;

/// Port the per-job sshd listens on: `10000 + (job_id mod 55000)`.
pub fn derive_ssh_port(job_id: u64) -> u16 {
    // Always < 65000, so the cast is lossless.
    (SSH_PORT_BASE + job_id % SSH_PORT_RANGE) as u16
}

/// Whether a device type asks for no GPU at all.
pub fn is_cpu_only(device: &str) -> bool {
    device.eq_ignore_ascii_case("cpu") || device.eq_ignore_ascii_case("nogpu")
}

/// Directory on the compute node holding the per-job sshd state.
pub fn job_ssh_dir(job_id: &str) -> String {
    format!("/tmp/slurm_ssh_{}", job_id)
}

/// Resources requested for a job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceRequest<'a> {
    pub device: &'a str,
    pub gpus_per_node: u32,
    pub cpus_per_gpu: u32,
    pub nodes: u32,
}

/// Supported clusters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cluster {
    /// Alvis (C3SE): users may ssh into nodes running their jobs.
    Alvis,
    /// Berzelius (NSC): sshd has to be started from inside the job.
    Berzelius,
}

const ALVIS_DEVICES: &[&str] = &["A100:40GB", "A100:80GB", "A40", "V100", "T4", "cpu"];
const BERZELIUS_DEVICES: &[&str] = &["A100", "A100:80GB", "A100:40GB", "A100:10GB", "cpu"];

const SSH_BOOTSTRAP: &str = r#"# Unique SSH port for this job: 10000 + job_id % 55000
SSH_PORT=$((10000 + $SLURM_JOB_ID % 55000))
JOB_SSH_DIR="/tmp/slurm_ssh_$SLURM_JOB_ID"
mkdir -p "$JOB_SSH_DIR"
if [ ! -f "$JOB_SSH_DIR/ssh_host_key" ]; then
    ssh-keygen -t rsa -f "$JOB_SSH_DIR/ssh_host_key" -N '' -q
fi
cat > "$JOB_SSH_DIR/sshd_config" << EOF
Port $SSH_PORT
PidFile $JOB_SSH_DIR/sshd.pid
HostKey $JOB_SSH_DIR/ssh_host_key
AuthorizedKeysFile ~/.ssh/authorized_keys
PasswordAuthentication no
PubkeyAuthentication yes
ChallengeResponseAuthentication no
Subsystem sftp internal-sftp
EOF
/usr/sbin/sshd -f "$JOB_SSH_DIR/sshd_config" -D &
echo "$SSH_PORT" > "$JOB_SSH_DIR/ssh_port""#;

impl Cluster {
    /// Name as reported by sacctmgr.
    pub fn name(&self) -> &'static str {
        match self {
            Cluster::Alvis => "alvis",
            Cluster::Berzelius => "berzelius",
        }
    }

    pub fn default_device(&self) -> &'static str {
        match self {
            Cluster::Alvis => "A100:40GB",
            Cluster::Berzelius => "A100",
        }
    }

    pub fn supported_devices(&self) -> &'static [&'static str] {
        match self {
            Cluster::Alvis => ALVIS_DEVICES,
            Cluster::Berzelius => BERZELIUS_DEVICES,
        }
    }

    /// Catalogue spelling of `device`, if this cluster offers it.
    ///
    /// Matching ignores case; "NOGPU" is accepted for "cpu".
    pub fn canonical_device(&self, device: &str) -> Option<&'static str> {
        if is_cpu_only(device) {
            return Some("cpu");
        }
        self.supported_devices()
            .iter()
            .copied()
            .find(|d| d.eq_ignore_ascii_case(device))
    }

    /// Whether jobs need [`Cluster::ssh_bootstrap`] to be reachable over ssh.
    pub fn needs_ssh_bootstrap(&self) -> bool {
        matches!(self, Cluster::Berzelius)
    }

    /// `#SBATCH` lines selecting GPUs, CPUs and nodes.
    pub fn resource_directives(&self, req: &ResourceRequest<'_>) -> Vec<String> {
        let cpu_only = is_cpu_only(req.device);
        let mut lines = Vec::new();

        match self {
            Cluster::Alvis => {
                if cpu_only {
                    lines.push("#SBATCH -C NOGPU".to_string());
                } else {
                    lines.push(format!("#SBATCH --gpus-per-node {}", req.gpus_per_node));
                }
                lines.push(format!(
                    "#SBATCH --cpus-per-task {}",
                    req.cpus_per_gpu.saturating_mul(req.nodes)
                ));
            }
            Cluster::Berzelius => {
                if cpu_only {
                    lines.push("#SBATCH --partition=berzelius-cpu".to_string());
                } else {
                    lines.push(format!("#SBATCH --gpus-per-node {}", req.gpus_per_node));
                    if let Some(tier) = berzelius_tier(req.device) {
                        lines.push(tier.to_string());
                    }
                    lines.push(format!("#SBATCH --cpus-per-gpu {}", req.cpus_per_gpu));
                }
            }
        }

        lines.push(format!("#SBATCH --nodes {}", req.nodes));
        lines
    }

    /// Shell fragment that starts a per-job sshd, or "" when not needed.
    pub fn ssh_bootstrap(&self, no_ssh: bool) -> String {
        if no_ssh || !self.needs_ssh_bootstrap() {
            return String::new();
        }
        SSH_BOOTSTRAP.to_string()
    }

    /// Port to ssh into on the job's first node.
    pub fn ssh_port(&self, job_id: &str) -> Result<u16, ClusterError> {
        match self {
            Cluster::Alvis => Ok(22),
            Cluster::Berzelius => job_id
                .trim()
                .parse::<u64>()
                .map(derive_ssh_port)
                .map_err(|_| ClusterError::InvalidJobId(job_id.to_string())),
        }
    }
}

/// Memory or sharing tier encoded in a Berzelius device type.
fn berzelius_tier(device: &str) -> Option<&'static str> {
    let device = device.to_ascii_uppercase();
    if device.contains("80GB") {
        Some("#SBATCH -C fat")
    } else if device.contains("40GB") {
        Some("#SBATCH -C thin")
    } else if device.contains("10GB") {
        Some("#SBATCH --reservation=1g.10gb")
    } else {
        None
    }
}

impl FromStr for Cluster {
    type Err = ClusterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "alvis" => Ok(Cluster::Alvis),
            "berzelius" => Ok(Cluster::Berzelius),
            other => Err(ClusterError::Unsupported(other.to_string())),
        }
    }
}

impl fmt::Display for Cluster {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(device: &str) -> ResourceRequest<'_> {
        ResourceRequest {
            device,
            gpus_per_node: 2,
            cpus_per_gpu: 8,
            nodes: 1,
        }
    }

    #[test]
    fn test_from_str() {
        assert_eq!("alvis".parse::<Cluster>().unwrap(), Cluster::Alvis);
        assert_eq!("berzelius\n".parse::<Cluster>().unwrap(), Cluster::Berzelius);
        assert!(matches!(
            "tetralith".parse::<Cluster>(),
            Err(ClusterError::Unsupported(name)) if name == "tetralith"
        ));
        assert!("Alvis".parse::<Cluster>().is_err());
    }

    #[test]
    fn test_alvis_gpu_directives() {
        assert_eq!(
            Cluster::Alvis.resource_directives(&request("A40")),
            vec![
                "#SBATCH --gpus-per-node 2",
                "#SBATCH --cpus-per-task 8",
                "#SBATCH --nodes 1",
            ]
        );
    }

    #[test]
    fn test_alvis_cpu_directives() {
        let req = ResourceRequest {
            nodes: 2,
            ..request("cpu")
        };
        assert_eq!(
            Cluster::Alvis.resource_directives(&req),
            vec!["#SBATCH -C NOGPU", "#SBATCH --cpus-per-task 16", "#SBATCH --nodes 2"]
        );
    }

    #[test]
    fn test_berzelius_memory_tiers() {
        let fat = Cluster::Berzelius.resource_directives(&request("A100:80GB"));
        assert_eq!(
            fat,
            vec![
                "#SBATCH --gpus-per-node 2",
                "#SBATCH -C fat",
                "#SBATCH --cpus-per-gpu 8",
                "#SBATCH --nodes 1",
            ]
        );

        let thin = Cluster::Berzelius.resource_directives(&request("A100:40GB"));
        assert_eq!(thin[1], "#SBATCH -C thin");

        let shared = Cluster::Berzelius.resource_directives(&request("A100:10GB"));
        assert_eq!(shared[1], "#SBATCH --reservation=1g.10gb");

        let plain = Cluster::Berzelius.resource_directives(&request("A100"));
        assert_eq!(plain.len(), 3);
    }

    #[test]
    fn test_berzelius_cpu_directives() {
        assert_eq!(
            Cluster::Berzelius.resource_directives(&request("cpu")),
            vec!["#SBATCH --partition=berzelius-cpu", "#SBATCH --nodes 1"]
        );
        assert_eq!(
            Cluster::Berzelius.resource_directives(&request("NOGPU")),
            vec!["#SBATCH --partition=berzelius-cpu", "#SBATCH --nodes 1"]
        );
    }

    #[test]
    fn test_directives_do_not_depend_on_call_order() {
        for cluster in [Cluster::Alvis, Cluster::Berzelius] {
            let devices: Vec<&str> = cluster.supported_devices().to_vec();
            let forward: Vec<_> = devices
                .iter()
                .map(|d| cluster.resource_directives(&request(d)))
                .collect();
            let mut backward: Vec<_> = devices
                .iter()
                .rev()
                .map(|d| cluster.resource_directives(&request(d)))
                .collect();
            backward.reverse();
            assert_eq!(forward, backward);
        }
    }

    #[test]
    fn test_ssh_bootstrap() {
        assert_eq!(Cluster::Alvis.ssh_bootstrap(false), "");
        assert_eq!(Cluster::Berzelius.ssh_bootstrap(true), "");

        let fragment = Cluster::Berzelius.ssh_bootstrap(false);
        assert!(fragment.contains("SSH_PORT=$((10000 + $SLURM_JOB_ID % 55000))"));
        assert!(fragment.contains("ssh-keygen -t rsa"));
        assert!(fragment.contains("/usr/sbin/sshd -f \"$JOB_SSH_DIR/sshd_config\" -D &"));
        // The heredoc terminator must start its line.
        assert!(fragment.lines().any(|l| l == "EOF"));
    }

    #[test]
    fn test_derive_ssh_port() {
        assert_eq!(derive_ssh_port(0), 10000);
        assert_eq!(derive_ssh_port(12345), 22345);
        assert_eq!(derive_ssh_port(54999), 64999);
        assert_eq!(derive_ssh_port(55000), 10000);
        for job_id in [1, 999, 55001, 123_456_789, u64::MAX] {
            let port = derive_ssh_port(job_id);
            assert!((10000..65000).contains(&port));
            assert_eq!(port, derive_ssh_port(job_id));
        }
    }

    #[test]
    fn test_ssh_port_per_cluster() {
        assert_eq!(Cluster::Alvis.ssh_port("12345").unwrap(), 22);
        assert_eq!(Cluster::Berzelius.ssh_port("12345").unwrap(), 22345);
        assert!(matches!(
            Cluster::Berzelius.ssh_port("abc"),
            Err(ClusterError::InvalidJobId(_))
        ));
    }

    #[test]
    fn test_canonical_device() {
        assert_eq!(Cluster::Alvis.canonical_device("a40"), Some("A40"));
        assert_eq!(Cluster::Alvis.canonical_device("NOGPU"), Some("cpu"));
        assert_eq!(Cluster::Alvis.canonical_device("A100"), None);
        assert_eq!(Cluster::Berzelius.canonical_device("A100"), Some("A100"));
        assert_eq!(Cluster::Berzelius.canonical_device("T4"), None);
    }
}

//! Job configuration assembled from the command line.

use crate::cluster::{Cluster, ResourceRequest};
use camino::Utf8PathBuf;
use submit_parsers::{format_duration_slurm, parse_duration};
use thiserror::Error;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Invalid time limit {0:?}, expected SLURM format such as 0-00:30:00")]
    InvalidTimeLimit(String),
    #[error("{field} must be at least 1")]
    ZeroCount { field: &'static str },
    #[error("Device type {device:?} not available on {cluster}, expected one of: {supported}")]
    UnsupportedDevice {
        device: String,
        cluster: Cluster,
        supported: String,
    },
    #[error("No command given; pass a command or use --interactive")]
    MissingCommand,
    #[error("cpus-per-gpu ({cpus_per_gpu}) times nodes ({nodes}) is too large")]
    TooManyCpus { cpus_per_gpu: u32, nodes: u32 },
    #[error("SLURM account must not be empty")]
    MissingAccount,
}

/// Everything needed to render a batch script.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobConfig {
    pub account: String,
    /// Time limit in SLURM duration syntax.
    pub time_limit: String,
    pub gpus_per_node: u32,
    /// Device type; `None` picks the cluster default.
    pub device: Option<String>,
    pub cpus_per_gpu: u32,
    pub nodes: u32,
    pub num_tasks: u32,
    /// Prefix placed in front of the command, e.g. `uv run`.
    pub shell_env: Option<String>,
    pub interactive: bool,
    pub no_ssh: bool,
    pub output_dir: Utf8PathBuf,
    pub command: Vec<String>,
}

impl JobConfig {
    /// Check the configuration against `cluster` and normalize it.
    ///
    /// After this the time limit is `D-HH:MM:SS`, the device is the
    /// catalogue spelling, and an empty shell prefix is `None`.
    pub fn validate(mut self, cluster: Cluster) -> Result<Self, ConfigError> {
        if self.account.trim().is_empty() {
            return Err(ConfigError::MissingAccount);
        }

        let limit = parse_duration(&self.time_limit)
            .ok_or_else(|| ConfigError::InvalidTimeLimit(self.time_limit.clone()))?;
        self.time_limit = format_duration_slurm(limit.as_secs());

        for (field, value) in [
            ("gpus-per-node", self.gpus_per_node),
            ("cpus-per-gpu", self.cpus_per_gpu),
            ("nodes", self.nodes),
            ("num-tasks", self.num_tasks),
        ] {
            if value == 0 {
                return Err(ConfigError::ZeroCount { field });
            }
        }
        if self.cpus_per_gpu.checked_mul(self.nodes).is_none() {
            return Err(ConfigError::TooManyCpus {
                cpus_per_gpu: self.cpus_per_gpu,
                nodes: self.nodes,
            });
        }

        let requested = self
            .device
            .as_deref()
            .unwrap_or_else(|| cluster.default_device());
        let device = cluster
            .canonical_device(requested)
            .ok_or_else(|| ConfigError::UnsupportedDevice {
                device: requested.to_string(),
                cluster,
                supported: cluster.supported_devices().join(", "),
            })?;
        self.device = Some(device.to_string());

        self.shell_env = self
            .shell_env
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty());

        if !self.interactive && self.command.iter().all(|arg| arg.trim().is_empty()) {
            return Err(ConfigError::MissingCommand);
        }

        Ok(self)
    }

    /// Device type, falling back to the cluster default.
    pub fn device_or_default(&self, cluster: Cluster) -> &str {
        self.device
            .as_deref()
            .unwrap_or_else(|| cluster.default_device())
    }

    pub fn resources(&self, cluster: Cluster) -> ResourceRequest<'_> {
        ResourceRequest {
            device: self.device_or_default(cluster),
            gpus_per_node: self.gpus_per_node,
            cpus_per_gpu: self.cpus_per_gpu,
            nodes: self.nodes,
        }
    }

    /// The user command as one shell line.
    ///
    /// Each argument is shell-quoted so it reaches the program unchanged.
    /// The shell prefix is shell text already and goes in as written.
    pub fn full_command(&self) -> Result<String, shlex::QuoteError> {
        let args = shlex::try_join(self.command.iter().map(String::as_str))?;
        Ok(match &self.shell_env {
            Some(prefix) => format!("{} {}", prefix, args),
            None => args,
        })
    }
}

#[cfg(test)]
pub(crate) fn sample_config() -> JobConfig {
    JobConfig {
        account: "berzelius-2024-1".to_string(),
        time_limit: "0-00:30:00".to_string(),
        gpus_per_node: 1,
        device: None,
        cpus_per_gpu: 16,
        nodes: 1,
        num_tasks: 1,
        shell_env: None,
        interactive: false,
        no_ssh: false,
        output_dir: Utf8PathBuf::from("/home/user/.cache/slurm"),
        command: vec!["python".to_string(), "train.py".to_string()],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_normalizes() {
        let config = JobConfig {
            time_limit: "2:00:00".to_string(),
            device: Some("a100:80gb".to_string()),
            shell_env: Some("  uv run ".to_string()),
            ..sample_config()
        }
        .validate(Cluster::Berzelius)
        .unwrap();

        assert_eq!(config.time_limit, "0-02:00:00");
        assert_eq!(config.device.as_deref(), Some("A100:80GB"));
        assert_eq!(config.shell_env.as_deref(), Some("uv run"));
        assert_eq!(config.full_command().unwrap(), "uv run python train.py");
    }

    #[test]
    fn test_validate_uses_cluster_default_device() {
        let config = sample_config().validate(Cluster::Alvis).unwrap();
        assert_eq!(config.device.as_deref(), Some("A100:40GB"));

        let config = sample_config().validate(Cluster::Berzelius).unwrap();
        assert_eq!(config.device.as_deref(), Some("A100"));
    }

    #[test]
    fn test_validate_rejects_bad_input() {
        let bad_time = JobConfig {
            time_limit: "forever".to_string(),
            ..sample_config()
        };
        assert_eq!(
            bad_time.validate(Cluster::Alvis),
            Err(ConfigError::InvalidTimeLimit("forever".to_string()))
        );

        let zero_nodes = JobConfig {
            nodes: 0,
            ..sample_config()
        };
        assert_eq!(
            zero_nodes.validate(Cluster::Alvis),
            Err(ConfigError::ZeroCount { field: "nodes" })
        );

        let wrong_device = JobConfig {
            device: Some("T4".to_string()),
            ..sample_config()
        };
        assert!(matches!(
            wrong_device.validate(Cluster::Berzelius),
            Err(ConfigError::UnsupportedDevice { .. })
        ));

        let no_account = JobConfig {
            account: " ".to_string(),
            ..sample_config()
        };
        assert_eq!(
            no_account.validate(Cluster::Alvis),
            Err(ConfigError::MissingAccount)
        );
    }

    #[test]
    fn test_validate_command_rules() {
        let empty = JobConfig {
            command: Vec::new(),
            ..sample_config()
        };
        assert_eq!(
            empty.clone().validate(Cluster::Alvis),
            Err(ConfigError::MissingCommand)
        );

        let interactive = JobConfig {
            interactive: true,
            ..empty
        };
        assert!(interactive.validate(Cluster::Alvis).is_ok());

        let quoted = JobConfig {
            command: vec!["python".to_string(), "-c".to_string(), "print('hi')".to_string()],
            ..sample_config()
        };
        assert!(quoted.validate(Cluster::Alvis).is_ok());
    }

    #[test]
    fn test_validate_rejects_cpu_product_overflow() {
        let config = JobConfig {
            cpus_per_gpu: 100_000,
            nodes: 100_000,
            ..sample_config()
        };
        assert_eq!(
            config.validate(Cluster::Alvis),
            Err(ConfigError::TooManyCpus {
                cpus_per_gpu: 100_000,
                nodes: 100_000,
            })
        );

        let config = JobConfig {
            cpus_per_gpu: 64,
            nodes: 128,
            ..sample_config()
        };
        assert!(config.validate(Cluster::Alvis).is_ok());
    }

    #[test]
    fn test_full_command_quotes_each_argument() {
        let config = JobConfig {
            command: vec![
                "python".to_string(),
                "-c".to_string(),
                "import os; print(1)".to_string(),
                "it's".to_string(),
            ],
            shell_env: Some("uv run".to_string()),
            ..sample_config()
        };
        let line = config.full_command().unwrap();

        assert!(line.starts_with("uv run python -c "));
        assert_eq!(
            shlex::split(&line).unwrap(),
            vec!["uv", "run", "python", "-c", "import os; print(1)", "it's"]
        );
    }
}

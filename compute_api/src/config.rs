// compute_api/src/config.rs

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use anyhow::Result;
use serde_yaml2;

pub const DEFAULT_COMPUTE_HOST: &str = "127.0.0.1";
pub const DEFAULT_COMPUTE_PORT: u16 = 3080;
pub const DEFAULT_PROJECTS_DIRECTORY: &str = "/tmp/netlab/projects";

/// Represents the configuration of the compute server, mirroring the content
/// under 'compute:' in compute_config.yaml.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ComputeConfig {
    pub host: String,
    pub port: u16,
    pub projects_directory: String,
}

impl Default for ComputeConfig {
    fn default() -> Self {
        ComputeConfig {
            host: DEFAULT_COMPUTE_HOST.to_string(),
            port: DEFAULT_COMPUTE_PORT,
            projects_directory: DEFAULT_PROJECTS_DIRECTORY.to_string(),
        }
    }
}

// Wrapper struct to match the 'compute:' key in the YAML config.
#[derive(Debug, Deserialize)]
struct ComputeConfigWrapper {
    compute: ComputeConfig,
}

/// Loads the compute server configuration from `compute_config.yaml`.
///
/// Falls back to the built-in defaults when no config file exists at the
/// resolved path.
pub fn load_compute_config(config_file_path: Option<PathBuf>) -> Result<ComputeConfig> {
    let default_config_path = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("compute_config.yaml");

    let path_to_use = config_file_path.unwrap_or(default_config_path);

    if !path_to_use.exists() {
        log::info!(
            "No compute config file at {}, using defaults",
            path_to_use.display()
        );
        return Ok(ComputeConfig::default());
    }

    let config_content = fs::read_to_string(&path_to_use)
        .map_err(|e| anyhow::anyhow!("Failed to read compute config file {}: {}", path_to_use.display(), e))?;

    let wrapper: ComputeConfigWrapper = serde_yaml2::from_str(&config_content)
        .map_err(|e| anyhow::anyhow!("Failed to parse compute config file {}: {}", path_to_use.display(), e))?;

    Ok(wrapper.compute)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn loads_config_from_a_yaml_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "compute:\n  host: \"0.0.0.0\"\n  port: 3081\n  projects_directory: \"/srv/netlab/projects\""
        )
        .unwrap();

        let config = load_compute_config(Some(file.path().to_path_buf())).unwrap();
        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.port, 3081);
        assert_eq!(config.projects_directory, "/srv/netlab/projects");
    }

    #[test]
    fn falls_back_to_defaults_when_the_file_is_missing() {
        let config = load_compute_config(Some(PathBuf::from("/nonexistent/compute_config.yaml"))).unwrap();
        assert_eq!(config.host, DEFAULT_COMPUTE_HOST);
        assert_eq!(config.port, DEFAULT_COMPUTE_PORT);
    }

    #[test]
    fn rejects_a_malformed_config_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "compute: [not, a, mapping]").unwrap();
        assert!(load_compute_config(Some(file.path().to_path_buf())).is_err());
    }
}

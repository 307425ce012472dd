//! Startup configuration, loaded once from a YAML file.

use serde::Deserialize;

use crate::error::CoreError;

#[derive(Debug, Clone, Deserialize)]
pub struct TasklistConfig {
    pub url: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub tasklist: TasklistConfig,
    #[serde(default = "default_workers")]
    pub workers: usize,
    pub port: u16,
}

fn default_workers() -> usize {
    1
}

impl Config {
    pub fn from_yaml_str(s: &str) -> Result<Self, CoreError> {
        let mut cfg: Config =
            serde_yaml::from_str(s).map_err(|e| CoreError::Config(e.to_string()))?;
        if cfg.workers == 0 {
            cfg.workers = 1;
        }
        Ok(cfg)
    }

    pub fn from_file(path: &std::path::Path) -> Result<Self, CoreError> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| CoreError::Config(format!("reading {}: {e}", path.display())))?;
        Self::from_yaml_str(&contents)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_minimal_config() {
        let yaml = "tasklist:\n  url: postgres://localhost/tasklist\nport: 8080\n";
        let cfg = Config::from_yaml_str(yaml).unwrap();
        assert_eq!(cfg.tasklist.url, "postgres://localhost/tasklist");
        assert_eq!(cfg.port, 8080);
        assert_eq!(cfg.workers, 1, "workers defaults to 1 when omitted");
    }

    #[test]
    fn zero_workers_is_normalized_to_one() {
        let yaml = "tasklist:\n  url: postgres://localhost/tasklist\nworkers: 0\nport: 8080\n";
        let cfg = Config::from_yaml_str(yaml).unwrap();
        assert_eq!(cfg.workers, 1);
    }

    #[test]
    fn missing_required_field_is_config_error() {
        let yaml = "workers: 2\n";
        assert!(Config::from_yaml_str(yaml).is_err());
    }
}

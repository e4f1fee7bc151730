use crate::model::ConfigError;
use serde::Deserialize;
use std::fs;

#[derive(Debug, Clone, Deserialize)]
pub struct ClusteringConfig {
    #[serde(default = "default_cluster_count")]
    pub cluster_count: usize,
    #[serde(default)]
    pub seed: u64,
    #[serde(default = "default_max_features")]
    pub max_features: usize,
    #[serde(default = "default_max_iterations")]
    pub max_iterations: usize,
    /// Lower `cluster_count` to the collection size instead of failing.
    #[serde(default)]
    pub clamp_k: bool,
    #[serde(default = "default_top_terms")]
    pub top_terms: usize,
}

impl Default for ClusteringConfig {
    fn default() -> Self {
        Self {
            cluster_count: default_cluster_count(),
            seed: 0,
            max_features: default_max_features(),
            max_iterations: default_max_iterations(),
            clamp_k: false,
            top_terms: default_top_terms(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub project: String,
    /// Series to inspect; the project's active series is used when absent.
    #[serde(default)]
    pub series: Option<String>,
    #[serde(default = "default_statuses")]
    pub statuses: Vec<String>,
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,
    #[serde(default = "default_db_path")]
    pub db_path: String,
    #[serde(default = "default_timeout")]
    pub request_timeout_seconds: u64,
    /// Zero means a single pass.
    #[serde(default)]
    pub refresh_interval_seconds: u64,
    #[serde(default)]
    pub clustering: ClusteringConfig,
}

fn default_cluster_count() -> usize {
    5
}

fn default_max_features() -> usize {
    1000
}

fn default_max_iterations() -> usize {
    300
}

fn default_top_terms() -> usize {
    5
}

fn default_statuses() -> Vec<String> {
    vec!["New".into(), "In Progress".into()]
}

fn default_api_base_url() -> String {
    "https://api.launchpad.net/devel".into()
}

fn default_db_path() -> String {
    "bugs.db".into()
}

fn default_timeout() -> u64 {
    30
}

impl AppConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.project.trim().is_empty() {
            return Err(ConfigError::Invalid("project must not be empty".into()));
        }
        if self.statuses.is_empty() {
            return Err(ConfigError::Invalid("at least one status is required".into()));
        }
        if self.clustering.cluster_count < 2 {
            return Err(ConfigError::Invalid(format!(
                "cluster_count must be >= 2, got {}",
                self.clustering.cluster_count
            )));
        }
        if self.clustering.max_features == 0 {
            return Err(ConfigError::Invalid("max_features must be positive".into()));
        }
        if self.clustering.max_iterations == 0 {
            return Err(ConfigError::Invalid("max_iterations must be positive".into()));
        }
        Ok(())
    }
}

pub fn parse_config(content: &str) -> Result<AppConfig, ConfigError> {
    let config: AppConfig = serde_json::from_str(content)?;
    config.validate()?;
    Ok(config)
}

pub fn load_config(path: &str) -> Result<AppConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    parse_config(&content)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minimal_config_gets_defaults() {
        let cfg = parse_config(r#"{ "project": "ubuntu" }"#).unwrap();
        assert_eq!(cfg.series, None);
        assert_eq!(cfg.statuses, vec!["New", "In Progress"]);
        assert_eq!(cfg.clustering.cluster_count, 5);
        assert_eq!(cfg.clustering.max_features, 1000);
        assert_eq!(cfg.clustering.max_iterations, 300);
        assert_eq!(cfg.refresh_interval_seconds, 0);
    }

    #[test]
    fn rejects_single_cluster() {
        let err = parse_config(r#"{ "project": "ubuntu", "clustering": { "cluster_count": 1 } }"#)
            .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn rejects_zero_vocabulary() {
        let err = parse_config(r#"{ "project": "ubuntu", "clustering": { "max_features": 0 } }"#)
            .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn malformed_json_is_a_parse_error() {
        assert!(matches!(parse_config("{"), Err(ConfigError::Parse(_))));
    }
}

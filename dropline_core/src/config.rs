use std::{fs, path::Path};

use anyhow::Context;
use serde::{Deserialize, Serialize};
use sheet_schema::Seconds;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SessionConfig {
    /// Seconds a note takes to fall from the top edge to the hit line.
    /// Also the length of the count-in.
    pub lead_time_seconds: Seconds,
    /// Half-width of the hit window.
    pub hit_tolerance_seconds: Seconds,
    pub poll_interval_ms: u64,
    pub key_bindings: Vec<String>,
    pub lane_max_width: f32,
    pub lane_gap: f32,
    /// Hit line position as a fraction of the viewport height.
    pub hit_line_ratio: f32,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            lead_time_seconds: 3.0,
            hit_tolerance_seconds: 0.2,
            poll_interval_ms: 100,
            key_bindings: ["d", "f", "j", "k"].iter().map(|k| k.to_string()).collect(),
            lane_max_width: 150.0,
            lane_gap: 1.0,
            hit_line_ratio: 0.9,
        }
    }
}

impl SessionConfig {
    pub fn from_json_str(json: &str) -> anyhow::Result<Self> {
        let config: SessionConfig = serde_json::from_str(json).context("failed to parse session config")?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)
            .with_context(|| format!("failed to read config: {}", path.display()))?;
        Self::from_json_str(&text).with_context(|| format!("invalid config: {}", path.display()))
    }

    pub fn poll_interval(&self) -> Seconds {
        self.poll_interval_ms as Seconds / 1000.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_config_keeps_defaults() {
        let config = SessionConfig::from_json_str(r#"{ "lead_time_seconds": 1.5 }"#).unwrap();
        assert_eq!(config.lead_time_seconds, 1.5);
        assert_eq!(config.key_bindings, vec!["d", "f", "j", "k"]);
        assert!((config.poll_interval() - 0.1).abs() < 1e-9);
    }

    #[test]
    fn malformed_config_is_an_error() {
        let err = SessionConfig::from_json_str("{ lead").unwrap_err();
        assert!(err.to_string().contains("failed to parse session config"));
    }
}

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Tunable constants for structural edits and layout.
///
/// Every field has a default, so a config file only needs the keys it overrides.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EditorConfig {
    /// Fill value for every weight created by a structural edit.
    pub default_weight: f64,
    /// Node count of a newly added hidden layer.
    pub hidden_layer_size: usize,
    pub layout: LayoutConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LayoutConfig {
    /// Gap between adjacent ranks along the flow axis.
    pub rank_sep: f64,
    /// Gap between siblings within a rank.
    pub node_sep: f64,
    /// Barycenter sweeps (one forward plus one backward pass each).
    pub sweeps: usize,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            default_weight: 0.5,
            hidden_layer_size: 3,
            layout: LayoutConfig::default(),
        }
    }
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            rank_sep: 150.0,
            node_sep: 20.0,
            sweeps: 4,
        }
    }
}

impl EditorConfig {
    /// Loads and validates a JSON config file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json(&content)
    }

    pub fn from_json(content: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.default_weight.is_finite() {
            return Err(ConfigError::Invalid("defaultWeight must be finite".into()));
        }
        if self.hidden_layer_size == 0 {
            return Err(ConfigError::Invalid("hiddenLayerSize must be at least 1".into()));
        }
        let LayoutConfig { rank_sep, node_sep, .. } = self.layout;
        if !(rank_sep.is_finite() && rank_sep >= 0.0 && node_sep.is_finite() && node_sep >= 0.0) {
            return Err(ConfigError::Invalid("layout separations must be finite and non-negative".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_file_keeps_defaults() {
        let config = EditorConfig::from_json(r#"{"hiddenLayerSize": 5, "layout": {"rankSep": 80}}"#).unwrap();
        assert_eq!(config.hidden_layer_size, 5);
        assert_eq!(config.default_weight, 0.5);
        assert_eq!(config.layout.rank_sep, 80.0);
        assert_eq!(config.layout.node_sep, 20.0);
    }

    #[test]
    fn zero_sized_hidden_layer_is_rejected() {
        let err = EditorConfig::from_json(r#"{"hiddenLayerSize": 0}"#).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn negative_separation_is_rejected() {
        assert!(EditorConfig::from_json(r#"{"layout": {"nodeSep": -1}}"#).is_err());
    }
}

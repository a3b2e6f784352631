//! Engine configuration.
//!
//! Every field has a default, so a partial JSON or TOML document is enough to
//! override just the values a host cares about.

use crate::error::{ClusterError, Result};
use crate::level::Level;
use serde::{Deserialize, Serialize};

/// How adjacent grid cells are combined into clusters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum MergeStrategy {
    /// One pass in ascending cell-key order over each cell's 8 neighbors.
    /// Chains of close cells may stay split (approximate density clustering).
    #[default]
    SinglePass,
    /// Union-find over adjacent cells; closeness is transitive.
    Transitive,
}

/// Clustering configuration
///
/// # Example
///
/// ```rust
/// use geocluster::{Config, MergeStrategy};
///
/// let config = Config::default()
///     .with_max_cluster_radius(80.0)
///     .with_weight_property("population");
/// assert!(config.validate().is_ok());
///
/// let json = r#"{
///     "max_cluster_radius": 60,
///     "singleton_passthrough": false,
///     "merge_strategy": "transitive"
/// }"#;
/// let config = Config::from_json(json).unwrap();
/// assert_eq!(config.merge_strategy, MergeStrategy::Transitive);
/// assert_eq!(config.max_level, 20);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Cell edge in display units; multiplied by the level resolution to get world units
    #[serde(default = "Config::default_max_cluster_radius")]
    pub max_cluster_radius: f64,

    /// Feature property summed into `Cluster::property_sum` (None means counts only)
    #[serde(default)]
    pub weight_property: Option<String>,

    /// Report clusters of a single point as bare points
    #[serde(default = "Config::default_singleton_passthrough")]
    pub singleton_passthrough: bool,

    /// Coarsest level that is ever computed
    #[serde(default)]
    pub min_level: Level,

    /// Finest level that is ever computed
    #[serde(default = "Config::default_max_level")]
    pub max_level: Level,

    /// Merge radius as a fraction of the cell size
    #[serde(default = "Config::default_merge_radius_ratio")]
    pub merge_radius_ratio: f64,

    #[serde(default)]
    pub merge_strategy: MergeStrategy,
}

impl Config {
    const fn default_max_cluster_radius() -> f64 {
        160.0
    }

    const fn default_singleton_passthrough() -> bool {
        true
    }

    const fn default_max_level() -> Level {
        20
    }

    const fn default_merge_radius_ratio() -> f64 {
        0.5
    }

    pub fn with_max_cluster_radius(mut self, radius: f64) -> Self {
        self.max_cluster_radius = radius;
        self
    }

    pub fn with_weight_property(mut self, name: impl Into<String>) -> Self {
        self.weight_property = Some(name.into());
        self
    }

    pub fn with_singleton_passthrough(mut self, enabled: bool) -> Self {
        self.singleton_passthrough = enabled;
        self
    }

    pub fn with_levels(mut self, min_level: Level, max_level: Level) -> Self {
        self.min_level = min_level;
        self.max_level = max_level;
        self
    }

    pub fn with_merge_radius_ratio(mut self, ratio: f64) -> Self {
        self.merge_radius_ratio = ratio;
        self
    }

    pub fn with_merge_strategy(mut self, strategy: MergeStrategy) -> Self {
        self.merge_strategy = strategy;
        self
    }

    /// Clamp a requested level into `[min_level, max_level]`.
    pub fn clamp_level(&self, level: Level) -> Level {
        level.clamp(self.min_level, self.max_level)
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        if !self.max_cluster_radius.is_finite() || self.max_cluster_radius <= 0.0 {
            return Err(ClusterError::InvalidConfig(format!(
                "max_cluster_radius must be finite and positive, got: {}",
                self.max_cluster_radius
            )));
        }

        if !self.merge_radius_ratio.is_finite()
            || self.merge_radius_ratio <= 0.0
            || self.merge_radius_ratio > 1.0
        {
            return Err(ClusterError::InvalidConfig(format!(
                "merge_radius_ratio must be in (0, 1], got: {}",
                self.merge_radius_ratio
            )));
        }

        if self.min_level > self.max_level {
            return Err(ClusterError::InvalidConfig(format!(
                "min_level ({}) must be <= max_level ({})",
                self.min_level, self.max_level
            )));
        }

        if let Some(name) = &self.weight_property
            && name.trim().is_empty()
        {
            return Err(ClusterError::InvalidConfig(
                "weight_property must not be empty".to_string(),
            ));
        }

        Ok(())
    }

    /// Parse and validate a JSON configuration document.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Parse and validate a TOML configuration document.
    #[cfg(feature = "toml")]
    pub fn from_toml(toml_str: &str) -> Result<Self> {
        let config: Self = toml::from_str(toml_str)?;
        config.validate()?;
        Ok(config)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_cluster_radius: Self::default_max_cluster_radius(),
            weight_property: None,
            singleton_passthrough: Self::default_singleton_passthrough(),
            min_level: 0,
            max_level: Self::default_max_level(),
            merge_radius_ratio: Self::default_merge_radius_ratio(),
            merge_strategy: MergeStrategy::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.max_cluster_radius, 160.0);
        assert_eq!(config.weight_property, None);
        assert!(config.singleton_passthrough);
        assert_eq!(config.min_level, 0);
        assert_eq!(config.max_level, 20);
        assert_eq!(config.merge_radius_ratio, 0.5);
        assert_eq!(config.merge_strategy, MergeStrategy::SinglePass);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_empty_json_uses_defaults() {
        let config = Config::from_json("{}").unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let cases = [
            Config::default().with_max_cluster_radius(0.0),
            Config::default().with_max_cluster_radius(f64::NAN),
            Config::default().with_merge_radius_ratio(0.0),
            Config::default().with_merge_radius_ratio(1.5),
            Config::default().with_levels(10, 2),
            Config::default().with_weight_property("  "),
        ];

        for config in cases {
            assert!(
                matches!(config.validate(), Err(ClusterError::InvalidConfig(_))),
                "expected rejection for {:?}",
                config
            );
        }
    }

    #[test]
    fn test_from_json_rejects_invalid_config() {
        let result = Config::from_json(r#"{ "min_level": 5, "max_level": 1 }"#);
        assert!(matches!(result, Err(ClusterError::InvalidConfig(_))));

        let result = Config::from_json("not json");
        assert!(matches!(result, Err(ClusterError::Serialization(_))));
    }

    #[test]
    fn test_clamp_level() {
        let config = Config::default().with_levels(3, 12);
        assert_eq!(config.clamp_level(0), 3);
        assert_eq!(config.clamp_level(7), 7);
        assert_eq!(config.clamp_level(40), 12);
    }

    #[cfg(feature = "toml")]
    #[test]
    fn test_from_toml() {
        let config = Config::from_toml(
            r#"
            max_cluster_radius = 40.0
            weight_property = "capacity"
            merge_strategy = "transitive"
            "#,
        )
        .unwrap();
        assert_eq!(config.max_cluster_radius, 40.0);
        assert_eq!(config.weight_property.as_deref(), Some("capacity"));
        assert_eq!(config.merge_strategy, MergeStrategy::Transitive);
    }
}

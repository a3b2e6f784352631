use geo::Point;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// Stable identifier of a host feature.
///
/// Identifiers survive index rebuilds, so they are what cluster member lists hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FeatureId(pub u64);

impl fmt::Display for FeatureId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

impl From<u64> for FeatureId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

/// A point feature as supplied by the host map.
///
/// Only visible features with finite coordinates take part in clustering.
///
/// # Examples
///
/// ```
/// use geocluster_types::feature::{Feature, FeatureId};
/// use geo::Point;
///
/// let hidden = Feature::new(FeatureId(1), Point::new(0.0, 0.0)).hidden();
/// assert!(!hidden.visible);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Feature {
    pub id: FeatureId,
    pub coordinate: Point<f64>,
    #[serde(default = "Feature::default_visible")]
    pub visible: bool,
    #[serde(default)]
    pub properties: Map<String, Value>,
}

impl Feature {
    const fn default_visible() -> bool {
        true
    }

    /// Create a visible feature with no properties.
    pub fn new(id: impl Into<FeatureId>, coordinate: Point<f64>) -> Self {
        Self {
            id: id.into(),
            coordinate,
            visible: true,
            properties: Map::new(),
        }
    }

    /// Set a property, replacing any previous value under the same name.
    pub fn with_property(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.properties.insert(name.into(), value.into());
        self
    }

    /// Mark the feature as hidden.
    pub fn hidden(mut self) -> Self {
        self.visible = false;
        self
    }

    /// Whether both coordinates are finite.
    pub fn has_finite_coordinate(&self) -> bool {
        self.coordinate.x().is_finite() && self.coordinate.y().is_finite()
    }

    /// Read a property as a number.
    ///
    /// JSON numbers are returned as-is and strings are parsed; anything else,
    /// including non-finite results, yields `None`.
    pub fn numeric_property(&self, name: &str) -> Option<f64> {
        let value = match self.properties.get(name)? {
            Value::Number(n) => n.as_f64()?,
            Value::String(s) => s.trim().parse::<f64>().ok()?,
            _ => return None,
        };
        value.is_finite().then_some(value)
    }
}

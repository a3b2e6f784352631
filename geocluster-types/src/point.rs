use crate::feature::FeatureId;
use geo::Point;
use serde::{Deserialize, Serialize};

/// A clusterable point captured when the point index is built.
///
/// Snapshots are immutable: a feature edit produces a new snapshot on the
/// next rebuild rather than mutating this one.
///
/// # Examples
///
/// ```
/// use geocluster_types::{feature::FeatureId, point::ClusterPoint};
///
/// let point = ClusterPoint::new(FeatureId(3), 10.0, -4.0).with_weight(2.5);
/// assert_eq!(point.x(), 10.0);
/// assert_eq!(point.weight, 2.5);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClusterPoint {
    /// Planar position in world units
    pub position: Point<f64>,
    /// Identifier of the feature this point was taken from
    pub id: FeatureId,
    /// Value of the weight property, 0 when none is configured or present
    #[serde(default)]
    pub weight: f64,
}

impl ClusterPoint {
    pub fn new(id: FeatureId, x: f64, y: f64) -> Self {
        Self {
            position: Point::new(x, y),
            id,
            weight: 0.0,
        }
    }

    pub fn with_weight(mut self, weight: f64) -> Self {
        self.weight = weight;
        self
    }

    pub fn x(&self) -> f64 {
        self.position.x()
    }

    pub fn y(&self) -> f64 {
        self.position.y()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cluster_point_defaults_to_zero_weight() {
        let point = ClusterPoint::new(FeatureId(1), 1.0, 2.0);
        assert_eq!(point.weight, 0.0);
        assert_eq!(point.position, Point::new(1.0, 2.0));
    }
}

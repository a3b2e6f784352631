//! Read-side queries over a computed level: hit-testing and marker listing.

use crate::cluster::{Cluster, LevelResult};
use crate::error::{ClusterError, Result};
use geo::{Distance, Euclidean, Point};
use geocluster_types::feature::FeatureId;

/// What a renderer should draw for one cluster.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Marker<'a> {
    /// A single point reported without cluster decoration
    Point { id: FeatureId, position: Point<f64> },
    Cluster(&'a Cluster),
}

impl Marker<'_> {
    pub fn position(&self) -> Point<f64> {
        match self {
            Marker::Point { position, .. } => *position,
            Marker::Cluster(cluster) => cluster.center,
        }
    }

    /// Number of points behind the marker.
    pub fn count(&self) -> usize {
        match self {
            Marker::Point { .. } => 1,
            Marker::Cluster(cluster) => cluster.count,
        }
    }
}

/// Whether `cluster` is reported as a bare point under the passthrough policy.
pub fn is_passthrough(cluster: &Cluster, singleton_passthrough: bool) -> bool {
    singleton_passthrough && cluster.is_singleton()
}

/// Marker for `cluster` under the passthrough policy.
pub fn marker_for(cluster: &Cluster, singleton_passthrough: bool) -> Marker<'_> {
    match cluster.children.first() {
        Some(&id) if is_passthrough(cluster, singleton_passthrough) => Marker::Point {
            id,
            position: cluster.center,
        },
        _ => Marker::Cluster(cluster),
    }
}

/// Reject hit-test arguments that can never match anything meaningfully.
pub(crate) fn validate_hit_query(point: Point<f64>, hit_radius: f64) -> Result<()> {
    if !hit_radius.is_finite() || hit_radius < 0.0 {
        return Err(ClusterError::InvalidInput(format!(
            "hit radius must be finite and non-negative, got: {}",
            hit_radius
        )));
    }
    if !point.x().is_finite() || !point.y().is_finite() {
        return Err(ClusterError::InvalidInput(format!(
            "query point must be finite, got: ({}, {})",
            point.x(),
            point.y()
        )));
    }
    Ok(())
}

impl LevelResult {
    /// First cluster, in stored order, whose center is within `hit_radius`
    /// of `point` (inclusive). The closest match is not guaranteed.
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` if `hit_radius` is negative or not finite,
    /// or `point` has a non-finite coordinate.
    pub fn locate(&self, point: Point<f64>, hit_radius: f64) -> Result<Option<&Cluster>> {
        validate_hit_query(point, hit_radius)?;

        Ok(self
            .clusters()
            .iter()
            .find(|cluster| Euclidean.distance(cluster.center, point) <= hit_radius))
    }

    /// Markers for every cluster, in stored order.
    pub fn markers(&self, singleton_passthrough: bool) -> impl Iterator<Item = Marker<'_>> {
        self.clusters()
            .iter()
            .map(move |cluster| marker_for(cluster, singleton_passthrough))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::{CellKey, bucket};
    use crate::merge::merge;
    use crate::config::MergeStrategy;
    use geo::coord;
    use geocluster_types::point::ClusterPoint;

    fn level(coords: &[(f64, f64)]) -> LevelResult {
        let points: Vec<_> = coords
            .iter()
            .enumerate()
            .map(|(i, (x, y))| ClusterPoint::new(FeatureId(i as u64), *x, *y))
            .collect();
        let origin = coord! { x: 0.0, y: 0.0 };
        let merged = merge(bucket(&points, origin, 10.0), 5.0, MergeStrategy::SinglePass);
        LevelResult::new(0, 10.0, Some(origin), merged.clusters, merged.cluster_map)
    }

    #[test]
    fn test_locate_hit_and_miss() {
        let result = level(&[(0.0, 0.0), (1.0, 0.0), (100.0, 100.0)]);

        let hit = result.locate(Point::new(0.5, 2.0), 2.0).unwrap().unwrap();
        assert_eq!(hit.count, 2);

        let far = result.locate(Point::new(100.0, 103.0), 3.0).unwrap().unwrap();
        assert_eq!(far.children, vec![FeatureId(2)]);

        assert!(result.locate(Point::new(50.0, 50.0), 1.0).unwrap().is_none());
    }

    #[test]
    fn test_locate_first_match_wins() {
        let result = level(&[(0.0, 0.0), (40.0, 0.0)]);
        let hit = result.locate(Point::new(30.0, 0.0), 100.0).unwrap().unwrap();
        assert_eq!(hit.key, CellKey::new(0, 0));
    }

    #[test]
    fn test_locate_rejects_bad_radius() {
        let result = level(&[(0.0, 0.0)]);
        assert!(result.locate(Point::new(0.0, 0.0), -1.0).is_err());
        assert!(result.locate(Point::new(0.0, 0.0), f64::NAN).is_err());
        assert!(result.locate(Point::new(f64::NAN, 0.0), 1.0).is_err());
    }

    #[test]
    fn test_markers_apply_passthrough() {
        let result = level(&[(0.0, 0.0), (1.0, 0.0), (100.0, 100.0)]);

        let markers: Vec<_> = result.markers(true).collect();
        assert!(matches!(markers[0], Marker::Cluster(c) if c.count == 2));
        assert_eq!(
            markers[1],
            Marker::Point {
                id: FeatureId(2),
                position: Point::new(100.0, 100.0)
            }
        );

        assert!(result.markers(false).all(|m| matches!(m, Marker::Cluster(_))));
        assert_eq!(result.markers(true).map(|m| m.count()).sum::<usize>(), 3);
    }
}

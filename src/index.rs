//! Flat snapshot of the clusterable points and their combined extent.

use geo::{Rect, coord};
use geocluster_types::feature::Feature;
use geocluster_types::point::ClusterPoint;
use serde::{Deserialize, Serialize};

/// Counters describing the last index build.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexStats {
    /// Features offered to the build
    pub features_seen: usize,
    /// Features excluded because they were not visible
    pub hidden: usize,
    /// Features excluded because a coordinate was NaN or infinite
    pub skipped_non_finite: usize,
    /// Points that made it into the index
    pub indexed: usize,
}

/// Immutable point snapshot used by every level computation of one build.
///
/// Points keep the order in which features were supplied, which makes
/// bucketing and therefore tie-breaking reproducible.
#[derive(Debug, Clone, Default)]
pub struct PointIndex {
    points: Vec<ClusterPoint>,
    extent: Option<Rect<f64>>,
    stats: IndexStats,
}

impl PointIndex {
    /// Build a snapshot from the host's features.
    ///
    /// Hidden features and features with non-finite coordinates are left out.
    /// When `weight_property` is set, each point's weight is read from that
    /// property (0 when absent or not numeric).
    pub fn rebuild<'a, I>(features: I, weight_property: Option<&str>) -> Self
    where
        I: IntoIterator<Item = &'a Feature>,
    {
        let mut stats = IndexStats::default();
        let mut points = Vec::new();

        for feature in features {
            stats.features_seen += 1;
            if !feature.visible {
                stats.hidden += 1;
                continue;
            }
            if !feature.has_finite_coordinate() {
                stats.skipped_non_finite += 1;
                continue;
            }

            let weight = weight_property
                .and_then(|name| feature.numeric_property(name))
                .unwrap_or(0.0);
            points.push(
                ClusterPoint::new(feature.id, feature.coordinate.x(), feature.coordinate.y())
                    .with_weight(weight),
            );
        }
        stats.indexed = points.len();

        if stats.skipped_non_finite > 0 {
            log::warn!(
                "Skipped {} of {} features with non-finite coordinates",
                stats.skipped_non_finite,
                stats.features_seen
            );
        }

        let extent = compute_extent(&points);
        log::debug!(
            "Point index rebuilt: {} points indexed, {} hidden, extent {:?}",
            stats.indexed,
            stats.hidden,
            extent
        );

        Self {
            points,
            extent,
            stats,
        }
    }

    pub fn points(&self) -> &[ClusterPoint] {
        &self.points
    }

    /// Bounding box of all indexed points, `None` when the index is empty.
    pub fn extent(&self) -> Option<Rect<f64>> {
        self.extent
    }

    pub fn stats(&self) -> IndexStats {
        self.stats
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

/// Axis-aligned bounding box of a point set.
pub fn compute_extent(points: &[ClusterPoint]) -> Option<Rect<f64>> {
    let first = points.first()?;
    let (mut min_x, mut min_y) = (first.x(), first.y());
    let (mut max_x, mut max_y) = (min_x, min_y);

    for point in &points[1..] {
        min_x = min_x.min(point.x());
        min_y = min_y.min(point.y());
        max_x = max_x.max(point.x());
        max_y = max_y.max(point.y());
    }

    Some(Rect::new(
        coord! { x: min_x, y: min_y },
        coord! { x: max_x, y: max_y },
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::Point;
    use geocluster_types::feature::FeatureId;

    #[test]
    fn test_rebuild_filters_and_counts() {
        let features = vec![
            Feature::new(FeatureId(1), Point::new(0.0, 0.0)),
            Feature::new(FeatureId(2), Point::new(5.0, -3.0)).hidden(),
            Feature::new(FeatureId(3), Point::new(f64::NAN, 1.0)),
            Feature::new(FeatureId(4), Point::new(10.0, 4.0)),
            Feature::new(FeatureId(5), Point::new(2.0, f64::NEG_INFINITY)),
        ];

        let index = PointIndex::rebuild(&features, None);
        let stats = index.stats();

        assert_eq!(stats.features_seen, 5);
        assert_eq!(stats.hidden, 1);
        assert_eq!(stats.skipped_non_finite, 2);
        assert_eq!(stats.indexed, 2);

        let ids: Vec<_> = index.points().iter().map(|p| p.id).collect();
        assert_eq!(ids, vec![FeatureId(1), FeatureId(4)]);

        let extent = index.extent().unwrap();
        assert_eq!(extent.min(), coord! { x: 0.0, y: 0.0 });
        assert_eq!(extent.max(), coord! { x: 10.0, y: 4.0 });
    }

    #[test]
    fn test_rebuild_reads_weight_property() {
        let features = vec![
            Feature::new(FeatureId(1), Point::new(0.0, 0.0)).with_property("pop", 12),
            Feature::new(FeatureId(2), Point::new(1.0, 1.0)).with_property("pop", "x"),
            Feature::new(FeatureId(3), Point::new(2.0, 2.0)),
        ];

        let weighted = PointIndex::rebuild(&features, Some("pop"));
        let weights: Vec<_> = weighted.points().iter().map(|p| p.weight).collect();
        assert_eq!(weights, vec![12.0, 0.0, 0.0]);

        let unweighted = PointIndex::rebuild(&features, None);
        assert!(unweighted.points().iter().all(|p| p.weight == 0.0));
    }

    #[test]
    fn test_empty_index_has_no_extent() {
        let index = PointIndex::rebuild(std::iter::empty(), None);
        assert!(index.is_empty());
        assert!(index.extent().is_none());
        assert_eq!(index.stats(), IndexStats::default());
    }
}

//! Host-facing facade tying the feature set, point index and level cache together.

use crate::cluster::{Cluster, LevelResult};
use crate::config::Config;
use crate::error::Result;
use crate::index::{IndexStats, PointIndex};
use crate::level::{CacheStats, Level, LevelCache, LevelOutcome, ResolutionSource};
use crate::query::{Marker, validate_hit_query};
use geo::Point;
use geocluster_types::feature::{Feature, FeatureId};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Snapshot of engine counters for diagnostics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineStats {
    /// Features currently held, visible or not
    pub feature_count: usize,
    /// Counters of the last index build
    pub index: IndexStats,
    pub cache: CacheStats,
}

/// Clusters a live feature set at any level, recomputing lazily.
///
/// Any mutation of the feature set marks the point index stale and drops
/// every cached level; the next level request rebuilds both.
///
/// # Examples
///
/// ```rust
/// use geocluster::{ClusterEngine, Config, Feature, FeatureId, FixedResolutions};
/// use geo::Point;
///
/// let config = Config::default().with_max_cluster_radius(10.0).with_levels(0, 2);
/// let mut engine = ClusterEngine::new(config, FixedResolutions(vec![4.0, 2.0, 1.0]))?;
///
/// engine.set_features(vec![
///     Feature::new(FeatureId(1), Point::new(0.0, 0.0)),
///     Feature::new(FeatureId(2), Point::new(1.0, 0.0)),
///     Feature::new(FeatureId(3), Point::new(500.0, 500.0)),
/// ]);
///
/// let level = engine.level(2).into_result().unwrap();
/// assert_eq!(level.len(), 2);
/// assert_eq!(level.point_count(), 3);
/// # Ok::<(), geocluster::ClusterError>(())
/// ```
pub struct ClusterEngine {
    config: Config,
    resolutions: Box<dyn ResolutionSource + Send + Sync>,
    features: Vec<Feature>,
    index: PointIndex,
    index_dirty: bool,
    cache: LevelCache,
}

impl fmt::Debug for ClusterEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClusterEngine")
            .field("config", &self.config)
            .field("features", &self.features.len())
            .field("index_dirty", &self.index_dirty)
            .field("cache", &self.cache.stats())
            .finish_non_exhaustive()
    }
}

impl ClusterEngine {
    /// Create an engine with no features.
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig` when `config` fails validation.
    pub fn new<R>(config: Config, resolutions: R) -> Result<Self>
    where
        R: ResolutionSource + Send + Sync + 'static,
    {
        config.validate()?;
        Ok(Self {
            config,
            resolutions: Box::new(resolutions),
            features: Vec::new(),
            index: PointIndex::default(),
            index_dirty: false,
            cache: LevelCache::new(),
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Features in insertion order.
    pub fn features(&self) -> &[Feature] {
        &self.features
    }

    /// Replace the whole feature set.
    pub fn set_features<I>(&mut self, features: I)
    where
        I: IntoIterator<Item = Feature>,
    {
        self.features = features.into_iter().collect();
        self.invalidate();
    }

    /// Add a feature, replacing in place any feature with the same id.
    pub fn insert_feature(&mut self, feature: Feature) -> Option<Feature> {
        let previous = match self.features.iter_mut().find(|f| f.id == feature.id) {
            Some(slot) => Some(std::mem::replace(slot, feature)),
            None => {
                self.features.push(feature);
                None
            }
        };
        self.invalidate();
        previous
    }

    pub fn remove_feature(&mut self, id: FeatureId) -> Option<Feature> {
        let pos = self.features.iter().position(|f| f.id == id)?;
        let removed = self.features.remove(pos);
        self.invalidate();
        Some(removed)
    }

    pub fn clear(&mut self) {
        self.features.clear();
        self.invalidate();
    }

    fn invalidate(&mut self) {
        self.index_dirty = true;
        self.cache.invalidate();
    }

    fn ensure_index(&mut self) {
        if self.index_dirty {
            self.index =
                PointIndex::rebuild(&self.features, self.config.weight_property.as_deref());
            self.index_dirty = false;
        }
    }

    /// Clusters at `level`, clamped to the configured bounds.
    pub fn level(&mut self, level: Level) -> LevelOutcome {
        self.ensure_index();
        self.cache
            .get_level(level, &self.index, &self.config, self.resolutions.as_ref())
    }

    /// Already computed clusters at `level`, without triggering computation.
    ///
    /// Returns `None` while the feature set has pending changes.
    pub fn cached_level(&self, level: Level) -> Option<Arc<LevelResult>> {
        if self.index_dirty {
            return None;
        }
        self.cache.cached(self.config.clamp_level(level))
    }

    /// First cluster at `level` whose center is within `hit_radius` of `point`.
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` for a negative or non-finite radius or point.
    pub fn locate(
        &mut self,
        level: Level,
        point: Point<f64>,
        hit_radius: f64,
    ) -> Result<Option<Cluster>> {
        validate_hit_query(point, hit_radius)?;
        match self.level(level).into_result() {
            Some(result) => Ok(result.locate(point, hit_radius)?.cloned()),
            None => Ok(None),
        }
    }

    /// Owned markers for `level` with the configured singleton passthrough.
    pub fn markers(&mut self, level: Level) -> Vec<OwnedMarker> {
        let passthrough = self.config.singleton_passthrough;
        self.level(level)
            .into_result()
            .map(|result| result.markers(passthrough).map(OwnedMarker::from).collect())
            .unwrap_or_default()
    }

    /// The coarser cluster `cluster` (taken from `level`) links to.
    ///
    /// Parent keys belong to the grid one below the level the result was
    /// computed at, which for a reused level is lower than `level - 1`.
    pub fn parent_of(&mut self, level: Level, cluster: &Cluster) -> Option<Cluster> {
        let parent_key = cluster.parent?;
        let computed_at = self.level(level).into_result()?.level();
        let coarser = computed_at
            .checked_sub(1)
            .filter(|z| *z >= self.config.min_level)?;
        let result = self.level(coarser).into_result()?;
        result.get(&parent_key).cloned()
    }

    /// Diagnostics counters. Index counters reflect the last build.
    pub fn stats(&self) -> EngineStats {
        EngineStats {
            feature_count: self.features.len(),
            index: self.index.stats(),
            cache: self.cache.stats(),
        }
    }
}

/// `Marker` detached from the level it was read from.
#[derive(Debug, Clone, PartialEq)]
pub enum OwnedMarker {
    Point { id: FeatureId, position: Point<f64> },
    Cluster(Cluster),
}

impl From<Marker<'_>> for OwnedMarker {
    fn from(marker: Marker<'_>) -> Self {
        match marker {
            Marker::Point { id, position } => OwnedMarker::Point { id, position },
            Marker::Cluster(cluster) => OwnedMarker::Cluster(cluster.clone()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::level::FixedResolutions;

    fn engine() -> ClusterEngine {
        let config = Config::default().with_max_cluster_radius(10.0).with_levels(0, 2);
        ClusterEngine::new(config, FixedResolutions(vec![4.0, 2.0, 1.0])).unwrap()
    }

    fn feature(id: u64, x: f64, y: f64) -> Feature {
        Feature::new(FeatureId(id), Point::new(x, y))
    }

    #[test]
    fn test_new_rejects_invalid_config() {
        let config = Config::default().with_levels(5, 1);
        assert!(ClusterEngine::new(config, FixedResolutions::default()).is_err());
    }

    #[test]
    fn test_mutation_invalidates_cache() {
        let mut engine = engine();
        engine.set_features(vec![feature(1, 0.0, 0.0), feature(2, 1.0, 0.0)]);
        let before = engine.level(2).into_result().unwrap();
        assert_eq!(before.point_count(), 2);
        assert!(engine.cached_level(2).is_some());

        engine.insert_feature(feature(3, 300.0, 0.0));
        assert!(engine.cached_level(2).is_none());
        let after = engine.level(2).into_result().unwrap();
        assert_eq!(after.point_count(), 3);

        assert!(engine.remove_feature(FeatureId(1)).is_some());
        assert!(engine.remove_feature(FeatureId(99)).is_none());
        assert_eq!(engine.level(2).into_result().unwrap().point_count(), 2);

        engine.clear();
        assert!(engine.level(2).into_result().unwrap().is_empty());
    }

    #[test]
    fn test_insert_replaces_same_id() {
        let mut engine = engine();
        assert!(engine.insert_feature(feature(1, 0.0, 0.0)).is_none());
        let previous = engine.insert_feature(feature(1, 5.0, 5.0)).unwrap();
        assert_eq!(previous.coordinate, Point::new(0.0, 0.0));
        assert_eq!(engine.features().len(), 1);
        assert_eq!(engine.features()[0].coordinate, Point::new(5.0, 5.0));
    }

    #[test]
    fn test_stats_track_skipped_features() {
        let mut engine = engine();
        engine.set_features(vec![
            feature(1, 0.0, 0.0),
            feature(2, f64::NAN, 0.0),
            feature(3, 2.0, 2.0).hidden(),
        ]);
        let _ = engine.level(0);

        let stats = engine.stats();
        assert_eq!(stats.feature_count, 3);
        assert_eq!(stats.index.skipped_non_finite, 1);
        assert_eq!(stats.index.hidden, 1);
        assert_eq!(stats.index.indexed, 1);
        assert_eq!(stats.cache.cached_levels, 1);
    }

    #[test]
    fn test_parent_of_resolves_coarser_cluster() {
        let mut engine = engine();
        // Level 2 cell 10 splits the pair; level 1 cell 20 does not.
        engine.set_features(vec![feature(1, 0.0, 0.0), feature(2, 12.0, 0.0)]);

        let fine = engine.level(2).into_result().unwrap();
        assert_eq!(fine.len(), 2);
        for cluster in fine.clusters() {
            let parent = engine.parent_of(2, cluster).unwrap();
            assert_eq!(parent.count, 2);
            assert_eq!(parent.center, Point::new(6.0, 0.0));
        }

        let coarsest = engine.level(0).into_result().unwrap();
        assert!(engine.parent_of(0, &coarsest.clusters()[0]).is_none());
    }

    #[test]
    fn test_parent_of_on_reused_level() {
        // Cell sizes 16, 8, 4: level 1 splits the pair, so level 2 reuses level 1
        // and its parent keys point into the level 0 grid.
        let config = Config::default().with_max_cluster_radius(1.0).with_levels(0, 2);
        let mut engine =
            ClusterEngine::new(config, FixedResolutions(vec![16.0, 8.0, 4.0])).unwrap();
        engine.set_features(vec![feature(1, 0.0, 0.0), feature(2, 10.0, 0.0)]);

        let fine = engine.level(2).into_result().unwrap();
        assert_eq!(fine.level(), 1);
        assert_eq!(engine.stats().cache.reused, 1);

        let coarsest = engine.level(0).into_result().unwrap();
        for cluster in fine.clusters() {
            let parent = engine.parent_of(2, cluster).unwrap();
            assert!(cluster.children.iter().all(|id| parent.children.contains(id)));
            assert_eq!(coarsest.cluster_containing(cluster.center), Some(&parent));
            assert_eq!(parent.count, 2);
        }
    }

    #[test]
    fn test_locate_validates_before_level_lookup() {
        let config = Config::default().with_levels(0, 5);
        let mut engine = ClusterEngine::new(config, FixedResolutions(vec![1.0])).unwrap();
        engine.set_features(vec![feature(1, 0.0, 0.0)]);

        assert!(!engine.level(3).is_ready());
        assert!(engine.locate(3, Point::new(0.0, 0.0), -1.0).is_err());
        assert!(engine.locate(3, Point::new(f64::NAN, 0.0), 1.0).is_err());
        assert!(engine.locate(3, Point::new(0.0, 0.0), 1.0).unwrap().is_none());
    }

    #[test]
    fn test_markers_follow_passthrough_config() {
        let mut engine = engine();
        engine.set_features(vec![feature(1, 0.0, 0.0)]);
        assert_eq!(
            engine.markers(2),
            vec![OwnedMarker::Point {
                id: FeatureId(1),
                position: Point::new(0.0, 0.0)
            }]
        );
    }
}

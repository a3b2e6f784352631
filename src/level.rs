//! Per-level result cache with lazy computation of coarser levels.
//!
//! Level `z - 1` is always coarser than level `z`. Computing a level first
//! makes sure every coarser level down to `min_level` (or down to the first
//! level the host cannot resolve) is cached, then walks back up so each
//! level can link its clusters to the one below it.

use crate::cluster::LevelResult;
use crate::config::Config;
use crate::grid::bucket;
use crate::index::PointIndex;
use crate::merge::merge;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;

/// Discrete zoom step; higher is finer.
pub type Level = u8;

/// World units per display unit at each level, as supplied by the host map.
pub trait ResolutionSource {
    /// `None` when the host has no resolution for `level`.
    fn resolution(&self, level: Level) -> Option<f64>;
}

impl<F> ResolutionSource for F
where
    F: Fn(Level) -> Option<f64>,
{
    fn resolution(&self, level: Level) -> Option<f64> {
        self(level)
    }
}

/// Resolutions of the usual Web Mercator tile pyramid: each level halves the previous one.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WebMercatorResolutions {
    /// Resolution at level 0
    pub initial: f64,
}

impl WebMercatorResolutions {
    /// Level 0 resolution for 256 px tiles over EPSG:3857, in meters per pixel.
    pub const TILE_256: f64 = 156_543.033_928_040_97;

    pub fn new(initial: f64) -> Self {
        Self { initial }
    }
}

impl Default for WebMercatorResolutions {
    fn default() -> Self {
        Self::new(Self::TILE_256)
    }
}

impl ResolutionSource for WebMercatorResolutions {
    fn resolution(&self, level: Level) -> Option<f64> {
        Some(self.initial / 2f64.powi(i32::from(level)))
    }
}

/// Explicit resolution table indexed by level; levels past the end are unavailable.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FixedResolutions(pub Vec<f64>);

impl ResolutionSource for FixedResolutions {
    fn resolution(&self, level: Level) -> Option<f64> {
        self.0.get(usize::from(level)).copied()
    }
}

/// Cell size in world units for `level`, or `None` when the host resolution
/// is missing, non-finite or not positive.
pub fn cell_size_for(
    resolutions: &(impl ResolutionSource + ?Sized),
    level: Level,
    max_cluster_radius: f64,
) -> Option<f64> {
    resolutions
        .resolution(level)
        .map(|resolution| resolution * max_cluster_radius)
        .filter(|size| size.is_finite() && *size > 0.0)
}

/// Result of asking for a level.
#[derive(Debug, Clone)]
pub enum LevelOutcome {
    /// Clusters are available (possibly none, when there are no points)
    Ready(Arc<LevelResult>),
    /// The host had no resolution for this level; nothing was computed
    NoData { level: Level },
}

impl LevelOutcome {
    pub fn is_ready(&self) -> bool {
        matches!(self, Self::Ready(_))
    }

    pub fn result(&self) -> Option<&Arc<LevelResult>> {
        match self {
            Self::Ready(result) => Some(result),
            Self::NoData { .. } => None,
        }
    }

    pub fn into_result(self) -> Option<Arc<LevelResult>> {
        match self {
            Self::Ready(result) => Some(result),
            Self::NoData { .. } => None,
        }
    }
}

/// Cache counters, reset only with the cache itself.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheStats {
    /// Levels currently cached
    pub cached_levels: usize,
    /// Levels computed by bucketing and merging
    pub computed: usize,
    /// Levels that reused the adjacent coarser result
    pub reused: usize,
}

/// Memoized `LevelResult`s keyed by level.
///
/// Results are immutable once stored and handed out as `Arc`s. A level whose
/// coarser neighbor is fully unclustered shares that neighbor's `Arc`.
#[derive(Debug, Default)]
pub struct LevelCache {
    levels: BTreeMap<Level, Arc<LevelResult>>,
    computed: usize,
    reused: usize,
}

impl LevelCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop every cached level.
    pub fn invalidate(&mut self) {
        if !self.levels.is_empty() {
            log::debug!("Invalidating {} cached levels", self.levels.len());
        }
        self.levels.clear();
        self.computed = 0;
        self.reused = 0;
    }

    /// Cached result for `level`, without computing anything.
    pub fn cached(&self, level: Level) -> Option<Arc<LevelResult>> {
        self.levels.get(&level).cloned()
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            cached_levels: self.levels.len(),
            computed: self.computed,
            reused: self.reused,
        }
    }

    /// Result for `level` (clamped to the configured bounds), computing it
    /// and any missing coarser levels on demand.
    pub fn get_level(
        &mut self,
        level: Level,
        index: &PointIndex,
        config: &Config,
        resolutions: &(impl ResolutionSource + ?Sized),
    ) -> LevelOutcome {
        let level = config.clamp_level(level);
        if let Some(result) = self.levels.get(&level) {
            return LevelOutcome::Ready(Arc::clone(result));
        }

        let Some(cell_size) = cell_size_for(resolutions, level, config.max_cluster_radius) else {
            log::debug!("No resolution for level {}", level);
            return LevelOutcome::NoData { level };
        };

        let mut pending = vec![(level, cell_size)];
        let mut current = level;
        while current > config.min_level {
            let coarser = current - 1;
            if self.levels.contains_key(&coarser) {
                break;
            }
            let Some(size) = cell_size_for(resolutions, coarser, config.max_cluster_radius) else {
                break;
            };
            pending.push((coarser, size));
            current = coarser;
        }

        let mut last = None;
        for (z, size) in pending.into_iter().rev() {
            last = Some(self.compute(z, size, index, config));
        }

        match last {
            Some(result) => LevelOutcome::Ready(result),
            None => LevelOutcome::NoData { level },
        }
    }

    fn compute(
        &mut self,
        level: Level,
        cell_size: f64,
        index: &PointIndex,
        config: &Config,
    ) -> Arc<LevelResult> {
        let coarser = level
            .checked_sub(1)
            .filter(|z| *z >= config.min_level)
            .and_then(|z| self.levels.get(&z).cloned());

        if let Some(previous) = &coarser
            && previous.is_unclustered(index.len())
        {
            log::debug!(
                "Level {} reuses level {} ({} unclustered points)",
                level,
                previous.level(),
                index.len()
            );
            self.reused += 1;
            self.levels.insert(level, Arc::clone(previous));
            return Arc::clone(previous);
        }

        let result = match index.extent() {
            None => LevelResult::empty(level, cell_size),
            Some(extent) => {
                let origin = extent.min();
                let grid = bucket(index.points(), origin, cell_size);
                let merged = merge(
                    grid,
                    cell_size * config.merge_radius_ratio,
                    config.merge_strategy,
                );
                let mut result = LevelResult::new(
                    level,
                    cell_size,
                    Some(origin),
                    merged.clusters,
                    merged.cluster_map,
                );
                if let Some(previous) = &coarser {
                    link_parents(&mut result, previous);
                }
                result
            }
        };

        log::debug!(
            "Computed level {}: {} clusters from {} points (cell size {})",
            level,
            result.len(),
            index.len(),
            cell_size
        );
        self.computed += 1;
        let result = Arc::new(result);
        self.levels.insert(level, Arc::clone(&result));
        result
    }
}

/// Point each cluster at the coarser cluster its center buckets into.
fn link_parents(result: &mut LevelResult, coarser: &LevelResult) {
    for cluster in result.clusters_mut() {
        cluster.parent = coarser.cluster_containing(cluster.center).map(|p| p.key);
    }
}

//! Cluster and per-level result types.

use crate::grid::{Cell, CellKey};
use crate::level::Level;
use geo::{Coord, Point};
use geocluster_types::feature::FeatureId;
use rustc_hash::FxHashMap;

/// A group of one or more points at a given level.
#[derive(Debug, Clone, PartialEq)]
pub struct Cluster {
    /// Key of the cell the cluster grew from; absorbed neighbors do not change it
    pub key: CellKey,
    /// Mean of the member coordinates
    pub center: Point<f64>,
    /// Number of member points, always at least 1
    pub count: usize,
    /// Sum of the members' weight property
    pub property_sum: f64,
    /// Member feature ids in bucketing order
    pub children: Vec<FeatureId>,
    /// Key of the containing cluster at the next coarser level
    pub parent: Option<CellKey>,
}

impl Cluster {
    pub(crate) fn from_cell(cell: Cell) -> Self {
        Self {
            key: cell.key,
            center: cell.center(),
            count: cell.count,
            property_sum: cell.property_sum,
            children: cell.members,
            parent: None,
        }
    }

    /// A cluster holding exactly one point.
    pub fn is_singleton(&self) -> bool {
        self.count == 1
    }

    /// Position between `from` (usually the parent's center) and this
    /// cluster's center. `t` is clamped to `[0, 1]`; 0 yields `from`.
    ///
    /// # Examples
    ///
    /// ```
    /// use geocluster::{Cluster, CellKey};
    /// use geo::Point;
    ///
    /// let cluster = Cluster {
    ///     key: CellKey::new(0, 0),
    ///     center: Point::new(10.0, 0.0),
    ///     count: 3,
    ///     property_sum: 0.0,
    ///     children: vec![],
    ///     parent: None,
    /// };
    /// assert_eq!(cluster.interpolate(Point::new(0.0, 0.0), 0.25), Point::new(2.5, 0.0));
    /// ```
    pub fn interpolate(&self, from: Point<f64>, t: f64) -> Point<f64> {
        let t = if t.is_nan() { 0.0 } else { t.clamp(0.0, 1.0) };
        Point::new(
            from.x() + (self.center.x() - from.x()) * t,
            from.y() + (self.center.y() - from.y()) * t,
        )
    }
}

/// Clusters of one level plus the lookup from every original cell key to
/// the cluster that absorbed it.
///
/// `clusters` owns the data, sorted by key. `cluster_map` holds indices into
/// it, so an absorbed key never resolves through another absorbed key.
#[derive(Debug, Clone, PartialEq)]
pub struct LevelResult {
    level: Level,
    cell_size: f64,
    origin: Option<Coord<f64>>,
    clusters: Vec<Cluster>,
    cluster_map: FxHashMap<CellKey, usize>,
}

impl LevelResult {
    pub(crate) fn new(
        level: Level,
        cell_size: f64,
        origin: Option<Coord<f64>>,
        clusters: Vec<Cluster>,
        cluster_map: FxHashMap<CellKey, usize>,
    ) -> Self {
        Self {
            level,
            cell_size,
            origin,
            clusters,
            cluster_map,
        }
    }

    pub(crate) fn empty(level: Level, cell_size: f64) -> Self {
        Self::new(level, cell_size, None, Vec::new(), FxHashMap::default())
    }

    /// Level this result was computed at.
    ///
    /// A reused result keeps the level it was originally computed for.
    pub fn level(&self) -> Level {
        self.level
    }

    /// Cell edge in world units used to bucket this result.
    pub fn cell_size(&self) -> f64 {
        self.cell_size
    }

    pub fn clusters(&self) -> &[Cluster] {
        &self.clusters
    }

    pub fn len(&self) -> usize {
        self.clusters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clusters.is_empty()
    }

    /// Number of points across all clusters.
    pub fn point_count(&self) -> usize {
        self.clusters.iter().map(|c| c.count).sum()
    }

    /// Number of original cell keys, merged or not.
    pub fn cell_count(&self) -> usize {
        self.cluster_map.len()
    }

    /// Cluster whose own key is `key`.
    pub fn get(&self, key: &CellKey) -> Option<&Cluster> {
        self.resolve(key).filter(|cluster| cluster.key == *key)
    }

    /// Cluster that absorbed the cell `key`, including the cell's own cluster.
    pub fn resolve(&self, key: &CellKey) -> Option<&Cluster> {
        self.cluster_map
            .get(key)
            .and_then(|&idx| self.clusters.get(idx))
    }

    /// Cell key `point` falls into on this result's grid.
    pub fn cell_key_for(&self, point: Point<f64>) -> Option<CellKey> {
        self.origin
            .map(|origin| CellKey::containing(point.x(), point.y(), origin, self.cell_size))
    }

    /// Cluster that would contain `point` on this result's grid.
    pub fn cluster_containing(&self, point: Point<f64>) -> Option<&Cluster> {
        self.cell_key_for(point).and_then(|key| self.resolve(&key))
    }

    /// True when every cluster is a singleton covering `total_points`,
    /// meaning clustering had no effect at this level.
    pub fn is_unclustered(&self, total_points: usize) -> bool {
        self.clusters.len() == total_points
    }

    pub(crate) fn clusters_mut(&mut self) -> &mut [Cluster] {
        &mut self.clusters
    }
}

//! Uniform grid bucketing of points for a single level.

use geo::{Coord, Point, coord};
use geocluster_types::feature::FeatureId;
use geocluster_types::point::ClusterPoint;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Integer grid coordinates of a cell, relative to the extent's minimum corner.
///
/// Ordering is by `gx` then `gy`, which is the traversal order of the merge step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct CellKey {
    pub gx: i64,
    pub gy: i64,
}

impl CellKey {
    pub const fn new(gx: i64, gy: i64) -> Self {
        Self { gx, gy }
    }

    /// Cell containing `(x, y)` for a grid anchored at `origin`.
    ///
    /// Indices saturate at the `i64` bounds, so points beyond about
    /// `9.2e18` cells from the origin share the edge cell.
    pub fn containing(x: f64, y: f64, origin: Coord<f64>, cell_size: f64) -> Self {
        Self {
            gx: ((x - origin.x) / cell_size).floor() as i64,
            gy: ((y - origin.y) / cell_size).floor() as i64,
        }
    }

    /// The surrounding keys, row by row from `(-1, -1)` to `(1, 1)`.
    ///
    /// Keys that would fall outside the `i64` range are skipped, so a cell on
    /// the edge of the index space has fewer than 8 neighbors.
    pub fn neighbors(self) -> impl Iterator<Item = CellKey> {
        (-1..=1_i64).flat_map(move |dx| {
            (-1..=1_i64)
                .filter(move |&dy| dx != 0 || dy != 0)
                .filter_map(move |dy| {
                    Some(CellKey::new(self.gx.checked_add(dx)?, self.gy.checked_add(dy)?))
                })
        })
    }
}

impl fmt::Display for CellKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.gx, self.gy)
    }
}

/// Running aggregate of the points that fell into one cell.
#[derive(Debug, Clone, PartialEq)]
pub struct Cell {
    pub key: CellKey,
    pub sum: Coord<f64>,
    pub count: usize,
    pub property_sum: f64,
    pub members: Vec<FeatureId>,
}

impl Cell {
    fn empty(key: CellKey) -> Self {
        Self {
            key,
            sum: coord! { x: 0.0, y: 0.0 },
            count: 0,
            property_sum: 0.0,
            members: Vec::new(),
        }
    }

    fn push(&mut self, point: &ClusterPoint) {
        self.sum.x += point.x();
        self.sum.y += point.y();
        self.count += 1;
        self.property_sum += point.weight;
        self.members.push(point.id);
    }

    /// Mean of the member coordinates.
    pub fn center(&self) -> Point<f64> {
        let n = self.count as f64;
        Point::new(self.sum.x / n, self.sum.y / n)
    }

    /// Fold another cell's aggregate into this one.
    pub fn absorb(&mut self, other: Cell) {
        self.sum.x += other.sum.x;
        self.sum.y += other.sum.y;
        self.count += other.count;
        self.property_sum += other.property_sum;
        self.members.extend(other.members);
    }
}

/// Cells produced by one bucketing pass, ordered by key.
pub type CellGrid = BTreeMap<CellKey, Cell>;

/// Bucket `points` into square cells of `cell_size` anchored at `origin`.
///
/// Points are visited in slice order, so member lists follow the index order.
pub fn bucket(points: &[ClusterPoint], origin: Coord<f64>, cell_size: f64) -> CellGrid {
    let mut grid = CellGrid::new();
    for point in points {
        let key = CellKey::containing(point.x(), point.y(), origin, cell_size);
        grid.entry(key)
            .or_insert_with(|| Cell::empty(key))
            .push(point);
    }
    grid
}

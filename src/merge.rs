//! Merging of adjacent grid cells into clusters.

use crate::cluster::Cluster;
use crate::config::MergeStrategy;
use crate::grid::{CellGrid, CellKey};
use geo::{Distance, Euclidean, Point};
use rustc_hash::{FxHashMap, FxHashSet};
use smallvec::SmallVec;

/// Clusters produced from one grid plus the alias map of every input cell.
#[derive(Debug, Clone, Default)]
pub struct MergeOutput {
    /// Surviving clusters in ascending key order
    pub clusters: Vec<Cluster>,
    /// Every input cell key to the index of its cluster
    pub cluster_map: FxHashMap<CellKey, usize>,
}

impl MergeOutput {
    fn push(&mut self, cluster: Cluster, absorbed: &[CellKey]) {
        let idx = self.clusters.len();
        self.cluster_map.insert(cluster.key, idx);
        for key in absorbed {
            self.cluster_map.insert(*key, idx);
        }
        self.clusters.push(cluster);
    }
}

/// Merge the cells of `grid` whose pre-merge centers lie within `radius`
/// of each other (boundary inclusive).
pub fn merge(grid: CellGrid, radius: f64, strategy: MergeStrategy) -> MergeOutput {
    let cell_count = grid.len();
    let output = match strategy {
        MergeStrategy::SinglePass => merge_single_pass(grid, radius),
        MergeStrategy::Transitive => merge_transitive(grid, radius),
    };
    log::trace!(
        "Merged {} cells into {} clusters ({:?}, radius {})",
        cell_count,
        output.clusters.len(),
        strategy,
        radius
    );
    output
}

fn pre_merge_centers(grid: &CellGrid) -> FxHashMap<CellKey, Point<f64>> {
    grid.iter().map(|(key, cell)| (*key, cell.center())).collect()
}

fn within(a: Point<f64>, b: Point<f64>, radius: f64) -> bool {
    Euclidean.distance(a, b) <= radius
}

/// Each cell, in key order, absorbs its still-unsettled neighbors once.
///
/// A cell is settled once it has been absorbed or has acted as a merge
/// source. Settled cells are never absorbed again, so every alias points
/// straight at a surviving cluster.
fn merge_single_pass(mut grid: CellGrid, radius: f64) -> MergeOutput {
    let centers = pre_merge_centers(&grid);
    let keys: Vec<CellKey> = grid.keys().copied().collect();
    let mut settled = FxHashSet::default();
    let mut output = MergeOutput::default();

    for key in keys {
        if !settled.insert(key) {
            continue;
        }
        let Some(mut cell) = grid.remove(&key) else {
            continue;
        };
        let center = centers[&key];

        let absorbed: SmallVec<[CellKey; 8]> = key
            .neighbors()
            .filter(|n| !settled.contains(n))
            .filter(|n| centers.get(n).is_some_and(|c| within(center, *c, radius)))
            .collect();

        for neighbor in &absorbed {
            settled.insert(*neighbor);
            if let Some(other) = grid.remove(neighbor) {
                cell.absorb(other);
            }
        }

        output.push(Cluster::from_cell(cell), &absorbed);
    }

    output
}

/// Union-find over adjacent cells. The smallest key of each component
/// survives and absorbs the rest in ascending key order.
fn merge_transitive(grid: CellGrid, radius: f64) -> MergeOutput {
    let centers = pre_merge_centers(&grid);
    let keys: Vec<CellKey> = grid.keys().copied().collect();
    let position: FxHashMap<CellKey, usize> =
        keys.iter().enumerate().map(|(i, k)| (*k, i)).collect();
    let mut sets = DisjointSet::new(keys.len());

    for (i, key) in keys.iter().enumerate() {
        let center = centers[key];
        for neighbor in key.neighbors() {
            // Each adjacent pair is visited twice; checking one direction suffices.
            if neighbor <= *key {
                continue;
            }
            if let Some(&j) = position.get(&neighbor)
                && within(center, centers[&neighbor], radius)
            {
                sets.union(i, j);
            }
        }
    }

    let mut components: Vec<SmallVec<[usize; 4]>> = vec![SmallVec::new(); keys.len()];
    for i in 0..keys.len() {
        components[sets.find(i)].push(i);
    }

    let mut cells: Vec<_> = grid.into_values().map(Some).collect();
    let mut output = MergeOutput::default();
    for (root, members) in components.iter().enumerate() {
        if members.first() != Some(&root) {
            continue;
        }
        let Some(mut cell) = cells[root].take() else {
            continue;
        };
        let mut absorbed: SmallVec<[CellKey; 8]> = SmallVec::new();
        for &idx in &members[1..] {
            if let Some(other) = cells[idx].take() {
                absorbed.push(other.key);
                cell.absorb(other);
            }
        }
        output.push(Cluster::from_cell(cell), &absorbed);
    }

    output
}

/// Disjoint sets whose representative is always the smallest member.
struct DisjointSet {
    parent: Vec<usize>,
}

impl DisjointSet {
    fn new(len: usize) -> Self {
        Self {
            parent: (0..len).collect(),
        }
    }

    fn find(&mut self, mut i: usize) -> usize {
        while self.parent[i] != i {
            self.parent[i] = self.parent[self.parent[i]];
            i = self.parent[i];
        }
        i
    }

    fn union(&mut self, a: usize, b: usize) {
        let (ra, rb) = (self.find(a), self.find(b));
        if ra != rb {
            let (lo, hi) = if ra < rb { (ra, rb) } else { (rb, ra) };
            self.parent[hi] = lo;
        }
    }
}

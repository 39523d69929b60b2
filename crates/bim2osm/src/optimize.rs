// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Output optimizer
//!
//! Cleans a primitive set before it leaves the converter:
//!
//! 1. nodes within the merge tolerance collapse onto the earliest one
//! 2. repeated consecutive node refs inside a way collapse
//! 3. ways without length or area are dropped
//! 4. untagged nodes no way references are dropped
//!
//! Running the optimizer on its own output changes nothing.

use crate::primitives::{Node, PrimitiveId, PrimitiveSet, Way};
use rustc_hash::{FxHashMap, FxHashSet};

/// Smallest grid cell used for bucketing, in degrees
const MIN_CELL: f64 = 1e-9;

type Cell = (i64, i64);

pub struct OutputOptimizer {
    /// Merge distance per axis, in degrees
    tolerance: f64,
}

impl OutputOptimizer {
    pub fn new(tolerance: f64) -> Self {
        Self {
            tolerance: tolerance.max(0.0),
        }
    }

    pub fn tolerance(&self) -> f64 {
        self.tolerance
    }

    pub fn optimize(&self, mut set: PrimitiveSet) -> PrimitiveSet {
        let nodes = std::mem::take(&mut set.nodes);
        let ways = std::mem::take(&mut set.ways);
        let before = (nodes.len(), ways.len());

        let (nodes, remap) = self.merge_nodes(nodes);

        let positions: FxHashMap<PrimitiveId, (f64, f64)> =
            nodes.iter().map(|n| (n.id, (n.lon, n.lat))).collect();

        let ways: Vec<Way> = ways
            .into_iter()
            .map(|way| collapse_refs(way, &remap))
            .filter(|way| !self.is_degenerate(way, &positions))
            .collect();

        let referenced: FxHashSet<PrimitiveId> =
            ways.iter().flat_map(|w| w.nodes.iter().copied()).collect();
        let nodes: Vec<Node> = nodes
            .into_iter()
            .filter(|n| !n.tags.is_empty() || referenced.contains(&n.id))
            .collect();

        log::debug!(
            "Optimized output: {} -> {} nodes, {} -> {} ways",
            before.0,
            nodes.len(),
            before.1,
            ways.len()
        );

        set.replace(nodes, ways);
        set
    }

    fn cell_size(&self) -> f64 {
        self.tolerance.max(MIN_CELL)
    }

    fn cell_of(&self, node: &Node) -> Cell {
        let size = self.cell_size();
        (
            (node.lat / size).floor() as i64,
            (node.lon / size).floor() as i64,
        )
    }

    /// Merge nodes within tolerance; returns survivors and the id remap
    ///
    /// Survivors keep their position, so survivors are pairwise farther
    /// apart than the tolerance. Tags of merged nodes are added to the
    /// survivor without overwriting its own.
    fn merge_nodes(&self, nodes: Vec<Node>) -> (Vec<Node>, FxHashMap<PrimitiveId, PrimitiveId>) {
        let mut grid: FxHashMap<Cell, Vec<usize>> = FxHashMap::default();
        let mut survivors: Vec<Node> = Vec::with_capacity(nodes.len());
        let mut remap = FxHashMap::default();

        for node in nodes {
            let (row, col) = self.cell_of(&node);
            let mut found = None;
            'search: for dr in -1..=1 {
                for dc in -1..=1 {
                    let Some(bucket) = grid.get(&(row + dr, col + dc)) else {
                        continue;
                    };
                    for &index in bucket {
                        let other = &survivors[index];
                        if (other.lat - node.lat).abs() <= self.tolerance
                            && (other.lon - node.lon).abs() <= self.tolerance
                        {
                            found = Some(index);
                            break 'search;
                        }
                    }
                }
            }

            match found {
                Some(index) => {
                    let survivor = &mut survivors[index];
                    remap.insert(node.id, survivor.id);
                    for (key, value) in node.tags {
                        survivor.tags.entry(key).or_insert(value);
                    }
                }
                None => {
                    grid.entry((row, col)).or_default().push(survivors.len());
                    survivors.push(node);
                }
            }
        }

        (survivors, remap)
    }

    /// A way with fewer than two distinct nodes, or a ring without area
    fn is_degenerate(&self, way: &Way, positions: &FxHashMap<PrimitiveId, (f64, f64)>) -> bool {
        let distinct: FxHashSet<PrimitiveId> = way.nodes.iter().copied().collect();
        if !way.is_closed() {
            return distinct.len() < 2;
        }
        if distinct.len() < 3 {
            return true;
        }

        let ring: Vec<(f64, f64)> = way
            .nodes
            .iter()
            .filter_map(|id| positions.get(id).copied())
            .collect();
        let Some(&(x0, y0)) = ring.first() else {
            return true;
        };
        // relative to the first node, absolute degrees swamp the tolerance
        let twice_area: f64 = ring
            .windows(2)
            .map(|w| {
                let (ax, ay) = (w[0].0 - x0, w[0].1 - y0);
                let (bx, by) = (w[1].0 - x0, w[1].1 - y0);
                ax * by - bx * ay
            })
            .sum();
        (twice_area / 2.0).abs() <= self.tolerance * self.tolerance
    }
}

/// Re-point merged refs and drop consecutive repeats
fn collapse_refs(mut way: Way, remap: &FxHashMap<PrimitiveId, PrimitiveId>) -> Way {
    for id in way.nodes.iter_mut() {
        if let Some(survivor) = remap.get(id) {
            *id = *survivor;
        }
    }
    way.nodes.dedup();
    way
}

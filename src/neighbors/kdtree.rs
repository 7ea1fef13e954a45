use super::{Neighbor, NeighborIndex, NeighborSearch};
use crate::algorithms::flocking::FlockParams;
use crate::sim::Snapshot;
use crate::vector::{distance_squared, Vec2};
use kd_tree::{KdPoint, KdTree2};
use ordered_float::OrderedFloat;

/// Distance reported for result slots that hold no neighbor.
pub const SENTINEL_DISTANCE: f64 = f64::INFINITY;

/// One slot of a bounded k-nearest query.
///
/// Missing results are padded with `dist2 == SENTINEL_DISTANCE` and
/// `index == tree.len()`; both must be filtered before use.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RankedNeighbor {
    pub dist2: f64,
    pub index: usize,
}

impl RankedNeighbor {
    pub fn is_sentinel(&self, len: usize) -> bool {
        !self.dist2.is_finite() || self.index >= len
    }
}

/// One tree entry: a position plus its snapshot slot.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TreePoint {
    pub point: Vec2,
    pub index: usize,
}

impl KdPoint for TreePoint {
    type Scalar = f64;
    type Dim = typenum::U2;
    fn at(&self, k: usize) -> f64 {
        self.point[k]
    }
}

/// Balanced 2-d tree over one snapshot's positions, rebuilt from scratch.
pub struct KdTree {
    tree: KdTree2<TreePoint>,
    len: usize,
}

impl KdTree {
    pub fn build(points: &[Vec2]) -> Self {
        let items: Vec<TreePoint> = points
            .iter()
            .enumerate()
            .map(|(index, &point)| TreePoint { point, index })
            .collect();
        Self {
            tree: KdTree2::build_by_ordered_float(items),
            len: points.len(),
        }
    }

    pub fn len(&self) -> usize { self.len }

    pub fn is_empty(&self) -> bool { self.len == 0 }

    /// Up to `k` nearest points with squared distance strictly below `radius²`,
    /// closest first. Always returns exactly `k` slots; missing ones are sentinels.
    pub fn nearest_within(&self, query: &Vec2, k: usize, radius: f64) -> Vec<RankedNeighbor> {
        let r2 = radius * radius;
        let mut out: Vec<RankedNeighbor> = Vec::with_capacity(k);
        let wanted = k.min(self.len);
        if wanted > 0 {
            let target = TreePoint {
                point: *query,
                index: self.len,
            };
            out.extend(
                self.tree
                    .nearests(&target, wanted)
                    .into_iter()
                    .map(|hit| RankedNeighbor {
                        dist2: distance_squared(query, &hit.item.point),
                        index: hit.item.index,
                    })
                    .filter(|hit| hit.dist2 < r2),
            );
            out.sort_by_key(|hit| (OrderedFloat(hit.dist2), hit.index));
        }
        out.resize(
            k,
            RankedNeighbor {
                dist2: SENTINEL_DISTANCE,
                index: self.len,
            },
        );
        out
    }
}

/// k-d tree rebuilt from scratch every step.
#[derive(Debug, Clone)]
pub struct KdTreeSearch {
    view_distance: f64,
}

/// Per-step tree plus the radius every query is bounded by.
pub struct KdNeighborIndex {
    tree: KdTree,
    radius: f64,
}

impl KdTreeSearch {
    pub fn new(params: &FlockParams) -> Self {
        Self {
            view_distance: params.view_distance,
        }
    }
}

impl KdNeighborIndex {
    pub fn tree(&self) -> &KdTree { &self.tree }
}

impl NeighborSearch for KdTreeSearch {
    type Index = KdNeighborIndex;

    fn name(&self) -> &'static str { "kd-tree" }

    fn rebuild(&mut self, snapshot: &mut Snapshot) -> KdNeighborIndex {
        KdNeighborIndex {
            tree: KdTree::build(&snapshot.positions),
            radius: self.view_distance,
        }
    }
}

impl NeighborIndex for KdNeighborIndex {
    /// Emulates a radius query with `k = flock size`; sentinel slots are dropped.
    fn for_each_candidate(&self, snapshot: &Snapshot, agent: usize, visit: &mut dyn FnMut(Neighbor)) {
        let n = self.tree.len();
        if agent >= n {
            return;
        }
        let p = snapshot.positions[agent];
        for hit in self.tree.nearest_within(&p, n, self.radius) {
            if hit.is_sentinel(n) {
                continue;
            }
            visit(Neighbor {
                index: hit.index,
                offset: p - snapshot.positions[hit.index],
                dist2: hit.dist2,
            });
        }
    }
}

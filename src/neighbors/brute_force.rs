use super::{Neighbor, NeighborIndex, NeighborSearch};
use crate::sim::Snapshot;
use crate::vector::Vec2;

/// Pairwise scan over the whole flock.
#[derive(Debug, Clone, Copy, Default)]
pub struct BruteForce;

/// Dense N×N offset and squared-distance matrices, row-major.
#[derive(Debug, Clone, Default)]
pub struct PairwiseOffsets {
    n: usize,
    offsets: Vec<Vec2>,
    dist2: Vec<f64>,
}

impl PairwiseOffsets {
    pub fn build(positions: &[Vec2]) -> Self {
        let n = positions.len();
        let mut offsets = Vec::with_capacity(n * n);
        let mut dist2 = Vec::with_capacity(n * n);
        for pi in positions {
            for pj in positions {
                let off = pi - pj;
                dist2.push(off.norm_squared());
                offsets.push(off);
            }
        }
        Self { n, offsets, dist2 }
    }

    pub fn len(&self) -> usize { self.n }

    pub fn is_empty(&self) -> bool { self.n == 0 }

    /// `pos_i - pos_j`.
    pub fn offset(&self, i: usize, j: usize) -> Vec2 { self.offsets[i * self.n + j] }

    pub fn distance_squared(&self, i: usize, j: usize) -> f64 { self.dist2[i * self.n + j] }

    /// Offsets and squared distances from agent `i` to every agent.
    pub fn row(&self, i: usize) -> (&[Vec2], &[f64]) {
        let span = i * self.n..(i + 1) * self.n;
        (&self.offsets[span.clone()], &self.dist2[span])
    }
}

impl NeighborIndex for PairwiseOffsets {
    fn for_each_candidate(&self, _snapshot: &Snapshot, agent: usize, visit: &mut dyn FnMut(Neighbor)) {
        let (offsets, dist2) = self.row(agent);
        for (index, (offset, d2)) in offsets.iter().zip(dist2).enumerate() {
            visit(Neighbor {
                index,
                offset: *offset,
                dist2: *d2,
            });
        }
    }
}

impl NeighborSearch for BruteForce {
    type Index = PairwiseOffsets;

    fn name(&self) -> &'static str { "brute-force" }

    fn rebuild(&mut self, snapshot: &mut Snapshot) -> PairwiseOffsets {
        PairwiseOffsets::build(&snapshot.positions)
    }
}

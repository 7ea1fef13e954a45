//! Neighbor search strategies.
//!
//! A strategy is rebuilt from the previous snapshot once per step and hands back
//! an index value; all per-agent queries of that step borrow the index. The
//! strategies only differ in how many candidates they hand to the rules, never in
//! which candidates survive the rules' radius filters.

pub mod brute_force;
pub mod grid;
pub mod kdtree;

pub use brute_force::{BruteForce, PairwiseOffsets};
pub use grid::{CellTable, UniformGrid};
pub use kdtree::{KdNeighborIndex, KdTree, KdTreeSearch, RankedNeighbor, TreePoint};

use crate::sim::Snapshot;
use crate::vector::Vec2;

/// One candidate neighbor of a queried agent.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Neighbor {
    /// Slot of the neighbor in the snapshot the index was built from.
    pub index: usize,
    /// Queried position minus neighbor position.
    pub offset: Vec2,
    /// Squared length of `offset`.
    pub dist2: f64,
}

/// Per-step query structure produced by [`NeighborSearch::rebuild`].
pub trait NeighborIndex: Sync {
    /// Visit every candidate neighbor of `agent`.
    ///
    /// Candidates may include `agent` itself and agents outside every rule radius.
    fn for_each_candidate(&self, snapshot: &Snapshot, agent: usize, visit: &mut dyn FnMut(Neighbor));
}

/// A neighbor search strategy.
pub trait NeighborSearch {
    type Index: NeighborIndex;

    fn name(&self) -> &'static str;

    /// Build this step's index. Strategies may reorder the snapshot slots.
    fn rebuild(&mut self, snapshot: &mut Snapshot) -> Self::Index;
}

/// Collect the candidates of `agent` into `out`, ordered by stable agent id.
///
/// Ordering by id makes every strategy accumulate forces in the same sequence,
/// so their trajectories agree bit for bit.
pub fn gather_candidates<I: NeighborIndex + ?Sized>(
    index: &I,
    snapshot: &Snapshot,
    agent: usize,
    out: &mut Vec<Neighbor>,
) {
    out.clear();
    index.for_each_candidate(snapshot, agent, &mut |n| out.push(n));
    out.sort_unstable_by_key(|n| snapshot.ids[n.index]);
}

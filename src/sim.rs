use crate::algorithms::flocking::{FlockParams, FlockingRules};
use crate::error::FlockError;
use crate::integrator::Integrator;
use crate::neighbors::{gather_candidates, NeighborIndex, NeighborSearch};
use crate::vector::Vec2;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

/// Positions, velocities and stable ids of the whole flock at one step (SoA).
///
/// Slot `i` of every vector describes the same agent. Neighbor searches may
/// permute the slots; `ids[i]` always names the agent's slot in the initial snapshot.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Snapshot {
    pub positions: Vec<Vec2>,
    pub velocities: Vec<Vec2>,
    pub ids: Vec<usize>,
}

impl Snapshot {
    pub fn from_parts(positions: Vec<Vec2>, velocities: Vec<Vec2>) -> Result<Self, FlockError> {
        if positions.len() != velocities.len() {
            return Err(FlockError::MismatchedSnapshot {
                positions: positions.len(),
                velocities: velocities.len(),
            });
        }
        let ids = (0..positions.len()).collect();
        Ok(Self {
            positions,
            velocities,
            ids,
        })
    }

    pub fn len(&self) -> usize { self.positions.len() }

    pub fn is_empty(&self) -> bool { self.positions.is_empty() }

    /// Check that every buffer has one entry per agent and that `ids` is a
    /// permutation of 0..len.
    pub fn validate(&self) -> Result<(), FlockError> {
        let n = self.positions.len();
        if self.velocities.len() != n {
            return Err(FlockError::MismatchedSnapshot {
                positions: n,
                velocities: self.velocities.len(),
            });
        }
        if self.ids.len() != n {
            return Err(FlockError::InvalidAgentIds { len: n });
        }
        let mut seen = vec![false; n];
        for &id in &self.ids {
            match seen.get_mut(id) {
                Some(slot) if !*slot => *slot = true,
                _ => return Err(FlockError::InvalidAgentIds { len: n }),
            }
        }
        Ok(())
    }

    /// Move slot `order[k]` to slot `k` for every buffer.
    pub(crate) fn reorder(&mut self, order: &[usize]) {
        self.positions = order.iter().map(|&i| self.positions[i]).collect();
        self.velocities = order.iter().map(|&i| self.velocities[i]).collect();
        self.ids = order.iter().map(|&i| self.ids[i]).collect();
    }

    /// State rows [x, y, vx, vy] in slot order.
    pub fn state_matrix(&self) -> Vec<[f64; 4]> {
        self.positions
            .iter()
            .zip(&self.velocities)
            .map(|(p, v)| [p.x, p.y, v.x, v.y])
            .collect()
    }
}

/// One recorded step, in the slot order of that step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Frame {
    pub positions: Vec<[f64; 2]>,
    pub velocities: Vec<[f64; 2]>,
    pub ids: Vec<usize>,
}

impl Frame {
    fn capture(snapshot: &Snapshot) -> Self {
        Self {
            positions: snapshot.positions.iter().map(|p| [p.x, p.y]).collect(),
            velocities: snapshot.velocities.iter().map(|v| [v.x, v.y]).collect(),
            ids: snapshot.ids.clone(),
        }
    }

    fn by_id(&self, values: &[[f64; 2]]) -> Vec<[f64; 2]> {
        let mut out = vec![[0.0; 2]; values.len()];
        for (slot, &id) in self.ids.iter().enumerate() {
            out[id] = values[slot];
        }
        out
    }
}

/// Append-only trajectory log handed to renderers.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct History {
    pub width: f64,
    pub height: f64,
    frames: Vec<Frame>,
}

impl History {
    pub fn new(width: f64, height: f64) -> Self {
        Self {
            width,
            height,
            frames: Vec::new(),
        }
    }

    pub fn push(&mut self, snapshot: &Snapshot) {
        self.frames.push(Frame::capture(snapshot));
    }

    pub fn len(&self) -> usize { self.frames.len() }

    pub fn is_empty(&self) -> bool { self.frames.is_empty() }

    pub fn frames(&self) -> &[Frame] { &self.frames }

    /// Step-major, agent-major, axis-minor positions as recorded.
    pub fn positions(&self) -> Vec<Vec<[f64; 2]>> {
        self.frames.iter().map(|f| f.positions.clone()).collect()
    }

    /// Positions with every frame re-ordered by stable agent id.
    pub fn aligned_positions(&self) -> Vec<Vec<[f64; 2]>> {
        self.frames.iter().map(|f| f.by_id(&f.positions)).collect()
    }

    /// Velocities with every frame re-ordered by stable agent id.
    pub fn aligned_velocities(&self) -> Vec<Vec<[f64; 2]>> {
        self.frames.iter().map(|f| f.by_id(&f.velocities)).collect()
    }

    /// Recorded positions flattened to [x0, y0, x1, y1, ...] frame after frame.
    pub fn positions_flat(&self) -> Vec<f64> {
        self.frames
            .iter()
            .flat_map(|f| f.positions.iter().flat_map(|p| p.iter().copied()))
            .collect()
    }
}

/// Fixed-step flock simulation over one neighbor search strategy.
///
/// Holds exactly two snapshots: `previous` is frozen while a step runs and
/// `current` receives the integrated state; they swap at the end of the step.
#[derive(Debug)]
pub struct FlockSimulation<S: NeighborSearch> {
    search: S,
    rules: FlockingRules,
    integrator: Integrator,
    previous: Snapshot,
    current: Snapshot,
    params: FlockParams,
    steps: usize,
}

impl<S: NeighborSearch> FlockSimulation<S> {
    pub fn new(params: &FlockParams, search: S, initial: Snapshot) -> Result<Self, FlockError> {
        params.validate()?;
        initial.validate()?;
        Ok(Self {
            search,
            rules: FlockingRules::new(params),
            integrator: Integrator::new(params),
            current: initial.clone(),
            previous: initial,
            params: params.clone(),
            steps: 0,
        })
    }

    pub fn len(&self) -> usize { self.previous.len() }

    pub fn is_empty(&self) -> bool { self.previous.is_empty() }

    /// Number of steps integrated so far.
    pub fn steps(&self) -> usize { self.steps }

    pub fn params(&self) -> &FlockParams { &self.params }

    pub fn search_name(&self) -> &'static str { self.search.name() }

    /// Most recent state.
    pub fn latest(&self) -> &Snapshot { &self.previous }

    /// Advance the whole flock by one step.
    pub fn step(&mut self) {
        // Barrier: the index is complete before any agent is queried.
        let index = self.search.rebuild(&mut self.previous);

        let prev = &self.previous;
        let cur = &mut self.current;
        cur.ids.clone_from(&prev.ids);
        cur.positions.resize(prev.len(), Vec2::zeros());
        cur.velocities.resize(prev.len(), Vec2::zeros());

        integrate_agents(
            prev,
            &index,
            &self.rules,
            &self.integrator,
            &mut cur.positions,
            &mut cur.velocities,
        );

        std::mem::swap(&mut self.previous, &mut self.current);
        self.steps += 1;
        trace!(step = self.steps, search = self.search.name(), "advanced flock");
    }

    /// Record `frames` frames: the current state followed by `frames - 1` steps.
    pub fn run(mut self, frames: usize) -> History {
        debug!(
            search = self.search.name(),
            agents = self.len(),
            frames,
            "running flock simulation"
        );
        let mut history = History::new(self.params.width, self.params.height);
        if frames == 0 {
            return history;
        }
        history.push(&self.previous);
        for _ in 1..frames {
            self.step();
            history.push(&self.previous);
        }
        history
    }
}

#[cfg(not(feature = "parallel"))]
fn integrate_agents<I: NeighborIndex>(
    prev: &Snapshot,
    index: &I,
    rules: &FlockingRules,
    integrator: &Integrator,
    positions: &mut [Vec2],
    velocities: &mut [Vec2],
) {
    let mut neighbors = Vec::new();
    for (i, (pos, vel)) in positions.iter_mut().zip(velocities.iter_mut()).enumerate() {
        gather_candidates(index, prev, i, &mut neighbors);
        let force = rules.net_force(prev, i, &neighbors);
        (*pos, *vel) = integrator.advance(prev.positions[i], prev.velocities[i], force);
    }
}

/// Every agent reads only `prev` and `index` and writes only its own slot.
#[cfg(feature = "parallel")]
fn integrate_agents<I: NeighborIndex>(
    prev: &Snapshot,
    index: &I,
    rules: &FlockingRules,
    integrator: &Integrator,
    positions: &mut [Vec2],
    velocities: &mut [Vec2],
) {
    use rayon::prelude::*;
    positions
        .par_iter_mut()
        .zip(velocities.par_iter_mut())
        .enumerate()
        .for_each_init(Vec::new, |neighbors, (i, (pos, vel))| {
            gather_candidates(index, prev, i, neighbors);
            let force = rules.net_force(prev, i, neighbors);
            (*pos, *vel) = integrator.advance(prev.positions[i], prev.velocities[i], force);
        });
}

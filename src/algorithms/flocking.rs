use crate::error::FlockError;
use crate::neighbors::Neighbor;
use crate::sim::Snapshot;
use crate::vector::{normalize_or_zero, zero, Vec2};
use serde::{Deserialize, Serialize};

pub const DEFAULT_WIDTH: f64 = 200.0;
pub const DEFAULT_HEIGHT: f64 = 200.0;
pub const DEFAULT_VIEW_DISTANCE: f64 = 40.0;
pub const DEFAULT_SEPARATION_RADIUS: f64 = 8.0;
pub const DEFAULT_SEPARATION_STRENGTH: f64 = 0.14;
pub const DEFAULT_ALIGNMENT_RADIUS: f64 = 24.0;
pub const DEFAULT_ALIGNMENT_STRENGTH: f64 = 0.03;
pub const DEFAULT_COHESION_RADIUS: f64 = 30.0;
pub const DEFAULT_COHESION_STRENGTH: f64 = 0.03;
pub const DEFAULT_MAX_FORCE: f64 = 0.15;
pub const DEFAULT_MAX_SPEED: f64 = 5.0;
pub const DEFAULT_INITIAL_SPEED: f64 = 1.5;

/// How the uniform grid derives its cell edge length from the view distance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CellSizing {
    /// Cell edge = view distance.
    #[default]
    ViewDistance,
    /// Cell edge = view distance squared, never below the view distance itself.
    /// Coarser cells; kept to reproduce historical runs of the grid variant.
    SquaredViewDistance,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FlockParams {
    /// Field extent along x. Positions live in [0, width].
    pub width: f64,
    /// Field extent along y.
    pub height: f64,
    /// Largest interaction radius. Sizes the grid cells and bounds k-d queries.
    pub view_distance: f64,

    pub separation_radius: f64,
    pub separation_strength: f64,
    pub alignment_radius: f64,
    pub alignment_strength: f64,
    pub cohesion_radius: f64,
    pub cohesion_strength: f64,

    /// Upper bound on the net steering force per step.
    pub max_force: f64,
    /// Upper bound on agent speed.
    pub max_speed: f64,
    /// Initial velocities are drawn from [-initial_speed, initial_speed) per axis.
    pub initial_speed: f64,

    pub cell_sizing: CellSizing,
}

impl Default for FlockParams {
    fn default() -> Self {
        Self {
            width: DEFAULT_WIDTH,
            height: DEFAULT_HEIGHT,
            view_distance: DEFAULT_VIEW_DISTANCE,
            separation_radius: DEFAULT_SEPARATION_RADIUS,
            separation_strength: DEFAULT_SEPARATION_STRENGTH,
            alignment_radius: DEFAULT_ALIGNMENT_RADIUS,
            alignment_strength: DEFAULT_ALIGNMENT_STRENGTH,
            cohesion_radius: DEFAULT_COHESION_RADIUS,
            cohesion_strength: DEFAULT_COHESION_STRENGTH,
            max_force: DEFAULT_MAX_FORCE,
            max_speed: DEFAULT_MAX_SPEED,
            initial_speed: DEFAULT_INITIAL_SPEED,
            cell_sizing: CellSizing::default(),
        }
    }
}

impl FlockParams {
    /// Check every constant once, before a simulation is built.
    pub fn validate(&self) -> Result<(), FlockError> {
        let positive = |v: f64| v.is_finite() && v > 0.0;

        if !positive(self.width) || !positive(self.height) {
            return Err(FlockError::InvalidField {
                width: self.width,
                height: self.height,
            });
        }
        if !positive(self.view_distance) {
            return Err(FlockError::InvalidViewDistance(self.view_distance));
        }

        for (rule, radius) in [
            ("separation", self.separation_radius),
            ("alignment", self.alignment_radius),
            ("cohesion", self.cohesion_radius),
        ] {
            if !positive(radius) {
                return Err(FlockError::InvalidRadius { rule, radius });
            }
            if radius > self.view_distance {
                return Err(FlockError::RadiusExceedsViewDistance {
                    rule,
                    radius,
                    view_distance: self.view_distance,
                });
            }
        }

        for (name, value) in [
            ("separation_strength", self.separation_strength),
            ("alignment_strength", self.alignment_strength),
            ("cohesion_strength", self.cohesion_strength),
            ("initial_speed", self.initial_speed),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(FlockError::NegativeParameter { name, value });
            }
        }

        for (name, value) in [("max_force", self.max_force), ("max_speed", self.max_speed)] {
            if !positive(value) {
                return Err(FlockError::NonPositiveBound { name, value });
            }
        }

        Ok(())
    }

    /// Edge length of one uniform-grid cell. Never smaller than the view distance,
    /// so a 3×3 cell neighborhood covers every rule radius.
    pub fn cell_size(&self) -> f64 {
        match self.cell_sizing {
            CellSizing::ViewDistance => self.view_distance,
            CellSizing::SquaredViewDistance => (self.view_distance * self.view_distance).max(self.view_distance),
        }
    }
}

/// Separation, alignment and cohesion evaluated against a frozen snapshot.
///
/// Every rule takes the candidate list of one agent as produced by a neighbor
/// search. Candidates may include the agent itself and agents outside the rule
/// radius; both are filtered here.
#[derive(Debug, Clone)]
pub struct FlockingRules {
    separation_r2: f64,
    separation_strength: f64,
    alignment_r2: f64,
    alignment_strength: f64,
    cohesion_r2: f64,
    cohesion_strength: f64,
}

impl FlockingRules {
    pub fn new(params: &FlockParams) -> Self {
        Self {
            separation_r2: params.separation_radius * params.separation_radius,
            separation_strength: params.separation_strength,
            alignment_r2: params.alignment_radius * params.alignment_radius,
            alignment_strength: params.alignment_strength,
            cohesion_r2: params.cohesion_radius * params.cohesion_radius,
            cohesion_strength: params.cohesion_strength,
        }
    }

    /// Push away from close neighbors, weighted by 1 / d².
    pub fn separation(&self, agent: usize, neighbors: &[Neighbor]) -> Vec2 {
        let mut sum = zero();
        for n in neighbors {
            if n.index == agent || n.dist2 >= self.separation_r2 {
                continue;
            }
            // Coincident agents have no direction to push along.
            if n.dist2 > 0.0 {
                sum += n.offset / n.dist2;
            }
        }
        normalize_or_zero(sum) * self.separation_strength
    }

    /// Steer towards the mean heading of nearby agents.
    pub fn alignment(&self, snapshot: &Snapshot, agent: usize, neighbors: &[Neighbor]) -> Vec2 {
        let mut sum = zero();
        let mut count = 0usize;
        for n in neighbors {
            if n.index == agent || n.dist2 >= self.alignment_r2 {
                continue;
            }
            sum += snapshot.velocities[n.index];
            count += 1;
        }
        if count == 0 {
            return zero();
        }
        let steer = sum / count as f64 - snapshot.velocities[agent];
        normalize_or_zero(steer) * self.alignment_strength
    }

    /// Steer towards the centre of mass of nearby agents.
    pub fn cohesion(&self, snapshot: &Snapshot, agent: usize, neighbors: &[Neighbor]) -> Vec2 {
        let mut sum = zero();
        let mut count = 0usize;
        for n in neighbors {
            if n.index == agent || n.dist2 >= self.cohesion_r2 {
                continue;
            }
            sum += snapshot.positions[n.index];
            count += 1;
        }
        if count == 0 {
            return zero();
        }
        let steer = sum / count as f64 - snapshot.positions[agent];
        normalize_or_zero(steer) * self.cohesion_strength
    }

    /// Sum of all three rules (unclamped).
    pub fn net_force(&self, snapshot: &Snapshot, agent: usize, neighbors: &[Neighbor]) -> Vec2 {
        self.alignment(snapshot, agent, neighbors)
            + self.cohesion(snapshot, agent, neighbors)
            + self.separation(agent, neighbors)
    }
}

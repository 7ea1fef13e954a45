use crate::algorithms::flocking::FlockParams;
use crate::error::FlockError;
use crate::models::flock::{seeded_snapshot, DEFAULT_FLOCK_SIZE, DEFAULT_SEED, DEFAULT_STEPS};
use crate::neighbors::{BruteForce, KdTreeSearch, UniformGrid};
use crate::sim::{FlockSimulation, History, Snapshot};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::{Duration, Instant};
use tracing::debug;

pub const VARIANT_BRUTE_FORCE: &str = "brute-force";
pub const VARIANT_GRID: &str = "grid";
pub const VARIANT_KD_TREE: &str = "kd-tree";

pub struct VariantInfo {
    pub id: &'static str,
    pub name: &'static str,
    pub description: &'static str,
}

pub fn variant_catalog() -> &'static [VariantInfo] {
    &[
        VariantInfo {
            id: VARIANT_BRUTE_FORCE,
            name: "Brute force",
            description: "Dense pairwise offset/distance matrices rebuilt every step. O(N²).",
        },
        VariantInfo {
            id: VARIANT_GRID,
            name: "Uniform grid",
            description: "Agents sorted by cell; 3×3 cell neighborhood per query.",
        },
        VariantInfo {
            id: VARIANT_KD_TREE,
            name: "k-d tree",
            description: "Balanced 2-d tree rebuilt every step; bounded k-nearest queries.",
        },
    ]
}

/// Neighbor search strategy of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Variant {
    BruteForce,
    Grid,
    KdTree,
}

impl Variant {
    pub const ALL: [Variant; 3] = [Variant::BruteForce, Variant::Grid, Variant::KdTree];

    pub fn id(self) -> &'static str {
        match self {
            Variant::BruteForce => VARIANT_BRUTE_FORCE,
            Variant::Grid => VARIANT_GRID,
            Variant::KdTree => VARIANT_KD_TREE,
        }
    }

    pub fn from_id(id: &str) -> Result<Self, FlockError> {
        match id {
            VARIANT_BRUTE_FORCE => Ok(Variant::BruteForce),
            VARIANT_GRID => Ok(Variant::Grid),
            VARIANT_KD_TREE => Ok(Variant::KdTree),
            _ => Err(FlockError::UnknownVariant(id.to_string())),
        }
    }
}

impl fmt::Display for Variant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

impl FromStr for Variant {
    type Err = FlockError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Variant::from_id(s)
    }
}

/// Size, length and seed of one run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    pub flock_size: usize,
    /// Number of recorded frames, the seeded initial state included.
    pub steps: usize,
    pub seed: u64,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            flock_size: DEFAULT_FLOCK_SIZE,
            steps: DEFAULT_STEPS,
            seed: DEFAULT_SEED,
        }
    }
}

enum SimulationKind {
    BruteForce(FlockSimulation<BruteForce>),
    Grid(FlockSimulation<UniformGrid>),
    KdTree(FlockSimulation<KdTreeSearch>),
}

/// A flock simulation with its strategy chosen at runtime.
pub struct Engine {
    variant: Variant,
    sim: SimulationKind,
}

impl Engine {
    pub fn new(variant: Variant, params: &FlockParams, initial: Snapshot) -> Result<Self, FlockError> {
        let sim = match variant {
            Variant::BruteForce => {
                SimulationKind::BruteForce(FlockSimulation::new(params, BruteForce, initial)?)
            }
            Variant::Grid => {
                params.validate()?;
                let grid = UniformGrid::new(params)?;
                SimulationKind::Grid(FlockSimulation::new(params, grid, initial)?)
            }
            Variant::KdTree => {
                let tree = KdTreeSearch::new(params);
                SimulationKind::KdTree(FlockSimulation::new(params, tree, initial)?)
            }
        };
        Ok(Self { variant, sim })
    }

    /// Seeded initial conditions for `run`.
    pub fn seeded(variant: Variant, params: &FlockParams, run: &RunConfig) -> Result<Self, FlockError> {
        params.validate()?;
        let initial = seeded_snapshot(params, run.flock_size, run.seed);
        Self::new(variant, params, initial)
    }

    pub fn variant(&self) -> Variant { self.variant }

    pub fn len(&self) -> usize {
        match &self.sim {
            SimulationKind::BruteForce(sim) => sim.len(),
            SimulationKind::Grid(sim) => sim.len(),
            SimulationKind::KdTree(sim) => sim.len(),
        }
    }

    pub fn is_empty(&self) -> bool { self.len() == 0 }

    pub fn step(&mut self) {
        match &mut self.sim {
            SimulationKind::BruteForce(sim) => sim.step(),
            SimulationKind::Grid(sim) => sim.step(),
            SimulationKind::KdTree(sim) => sim.step(),
        }
    }

    pub fn latest(&self) -> &Snapshot {
        match &self.sim {
            SimulationKind::BruteForce(sim) => sim.latest(),
            SimulationKind::Grid(sim) => sim.latest(),
            SimulationKind::KdTree(sim) => sim.latest(),
        }
    }

    /// Latest positions as [x0, y0, x1, y1, ...] in current slot order.
    pub fn positions_flat(&self) -> Vec<f64> {
        self.latest()
            .positions
            .iter()
            .flat_map(|p| [p.x, p.y])
            .collect()
    }

    pub fn run(self, frames: usize) -> History {
        match self.sim {
            SimulationKind::BruteForce(sim) => sim.run(frames),
            SimulationKind::Grid(sim) => sim.run(frames),
            SimulationKind::KdTree(sim) => sim.run(frames),
        }
    }
}

/// Run one variant from seeded initial conditions.
pub fn run_variant(variant: Variant, params: &FlockParams, run: &RunConfig) -> Result<History, FlockError> {
    Ok(Engine::seeded(variant, params, run)?.run(run.steps))
}

fn run_default(variant: Variant, flock_size: usize, steps: usize) -> Result<History, FlockError> {
    let run = RunConfig {
        flock_size,
        steps,
        ..RunConfig::default()
    };
    run_variant(variant, &FlockParams::default(), &run)
}

/// Brute-force variant with default parameters and seed.
pub fn simulate_brute_force(flock_size: usize, steps: usize) -> Result<History, FlockError> {
    run_default(Variant::BruteForce, flock_size, steps)
}

/// Uniform-grid variant with default parameters and seed.
pub fn simulate_grid(flock_size: usize, steps: usize) -> Result<History, FlockError> {
    run_default(Variant::Grid, flock_size, steps)
}

/// k-d tree variant with default parameters and seed.
pub fn simulate_kdtree(flock_size: usize, steps: usize) -> Result<History, FlockError> {
    run_default(Variant::KdTree, flock_size, steps)
}

/// Mean wall time of one variant over a probe run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Timing {
    pub variant: Variant,
    pub mean: Duration,
}

/// Time every variant on `probe` (`repeat` runs each, at least one).
pub fn time_variants(params: &FlockParams, probe: &RunConfig, repeat: usize) -> Result<Vec<Timing>, FlockError> {
    params.validate()?;
    let repeat = repeat.max(1);
    let mut timings = Vec::with_capacity(Variant::ALL.len());
    for variant in Variant::ALL {
        let mut total = Duration::ZERO;
        for _ in 0..repeat {
            let engine = Engine::seeded(variant, params, probe)?;
            let started = Instant::now();
            let history = engine.run(probe.steps);
            total += started.elapsed();
            drop(history);
        }
        let mean = total / repeat as u32;
        debug!(variant = %variant, ?mean, "timed variant");
        timings.push(Timing { variant, mean });
    }
    Ok(timings)
}

/// Variant with the smallest mean time; ties keep catalog order.
pub fn fastest(timings: &[Timing]) -> Option<Variant> {
    timings
        .iter()
        .min_by_key(|t| t.mean)
        .map(|t| t.variant)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn catalog_ids_parse_back() {
        for info in variant_catalog() {
            let variant = Variant::from_id(info.id).unwrap();
            assert_eq!(variant.id(), info.id);
            assert_eq!(variant.to_string(), info.id);
        }
        assert_eq!(
            "octree".parse::<Variant>(),
            Err(FlockError::UnknownVariant("octree".to_string()))
        );
    }

    #[test]
    fn entry_points_have_the_requested_shape() {
        for history in [
            simulate_brute_force(7, 4).unwrap(),
            simulate_grid(7, 4).unwrap(),
            simulate_kdtree(7, 4).unwrap(),
        ] {
            assert_eq!(history.len(), 4);
            assert!(history.positions().iter().all(|frame| frame.len() == 7));
        }
    }

    #[test]
    fn entry_points_are_repeatable() {
        assert_eq!(simulate_grid(12, 6).unwrap(), simulate_grid(12, 6).unwrap());
        assert_eq!(simulate_kdtree(12, 6).unwrap(), simulate_kdtree(12, 6).unwrap());
    }

    #[test]
    fn fastest_picks_the_minimum() {
        let timings = [
            Timing {
                variant: Variant::BruteForce,
                mean: Duration::from_millis(5),
            },
            Timing {
                variant: Variant::Grid,
                mean: Duration::from_millis(2),
            },
            Timing {
                variant: Variant::KdTree,
                mean: Duration::from_millis(3),
            },
        ];
        assert_eq!(fastest(&timings), Some(Variant::Grid));
        assert_eq!(fastest(&[]), None);
    }

    #[test]
    fn time_variants_covers_every_variant() {
        let probe = RunConfig {
            flock_size: 5,
            steps: 2,
            seed: 3,
        };
        let timings = time_variants(&FlockParams::default(), &probe, 2).unwrap();
        let variants: Vec<Variant> = timings.iter().map(|t| t.variant).collect();
        assert_eq!(variants, Variant::ALL.to_vec());
    }

    #[test]
    fn oversized_grid_fails_before_the_first_step() {
        let params = FlockParams {
            width: 1e12,
            height: 1e12,
            view_distance: 1e-3,
            separation_radius: 1e-3,
            alignment_radius: 1e-3,
            cohesion_radius: 1e-3,
            ..FlockParams::default()
        };
        assert!(matches!(
            Engine::new(Variant::Grid, &params, Snapshot::default()),
            Err(FlockError::GridTooLarge { .. })
        ));
        assert!(Engine::new(Variant::KdTree, &params, Snapshot::default()).is_ok());
    }

    #[test]
    fn engine_steps_through_dispatch() {
        let params = FlockParams::default();
        let run = RunConfig {
            flock_size: 3,
            steps: 1,
            seed: 9,
        };
        let mut engine = Engine::seeded(Variant::KdTree, &params, &run).unwrap();
        let before = engine.positions_flat();
        engine.step();
        assert_eq!(engine.len(), 3);
        assert_eq!(engine.positions_flat().len(), before.len());
        assert_ne!(engine.positions_flat(), before);
    }
}

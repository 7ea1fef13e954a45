use crate::algorithms::flocking::FlockParams;
use crate::error::FlockError;
use crate::sim::Snapshot;
use crate::vector::Vec2;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

pub const DEFAULT_SEED: u64 = 42;
pub const DEFAULT_FLOCK_SIZE: usize = 50;
pub const DEFAULT_STEPS: usize = 100;

/// Reproducible initial conditions.
///
/// Positions are uniform over the field, velocities uniform over
/// [-initial_speed, initial_speed) per axis. All positions are drawn before any
/// velocity, so the same seed and flock size always give the same snapshot.
pub fn seeded_snapshot(params: &FlockParams, count: usize, seed: u64) -> Snapshot {
    let mut rng = StdRng::seed_from_u64(seed);

    let positions: Vec<Vec2> = (0..count)
        .map(|_| {
            let x = rng.gen_range(0.0..1.0) * params.width;
            let y = rng.gen_range(0.0..1.0) * params.height;
            Vec2::new(x, y)
        })
        .collect();

    let spread = 2.0 * params.initial_speed;
    let velocities: Vec<Vec2> = (0..count)
        .map(|_| {
            let vx = (rng.gen_range(0.0..1.0) - 0.5) * spread;
            let vy = (rng.gen_range(0.0..1.0) - 0.5) * spread;
            Vec2::new(vx, vy)
        })
        .collect();

    let ids = (0..count).collect();
    Snapshot {
        positions,
        velocities,
        ids,
    }
}

/// Convert packed states [x, y, vx, vy]* into a snapshot.
pub fn snapshot_from_states(states: &[f64]) -> Result<Snapshot, FlockError> {
    if states.len() % 4 != 0 {
        return Err(FlockError::MismatchedSnapshot {
            positions: states.len().div_ceil(4),
            velocities: states.len() / 4,
        });
    }
    let (positions, velocities): (Vec<Vec2>, Vec<Vec2>) = states
        .chunks_exact(4)
        .map(|s| (Vec2::new(s[0], s[1]), Vec2::new(s[2], s[3])))
        .unzip();
    Snapshot::from_parts(positions, velocities)
}

/// Layout of a hand-placed group of agents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClusterShape {
    /// Evenly filled disc (sunflower spiral).
    #[default]
    #[serde(alias = "disk")]
    Disc,
    /// Evenly spaced on the circle of the given radius.
    #[serde(alias = "circle")]
    Ring,
}

/// A group of agents around `center`, optionally moving together and/or
/// expanding outwards at `radial_speed`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cluster {
    #[serde(default)]
    pub shape: ClusterShape,
    pub count: usize,
    pub center: [f64; 2],
    pub radius: f64,
    #[serde(default)]
    pub velocity: Option<[f64; 2]>,
    #[serde(default, rename = "radialSpeed")]
    pub radial_speed: Option<f64>,
}

impl Cluster {
    /// (position, velocity) of every member, in placement order.
    pub fn members(&self) -> Vec<(Vec2, Vec2)> {
        let center = Vec2::new(self.center[0], self.center[1]);
        let base = self.velocity.map(|v| Vec2::new(v[0], v[1])).unwrap_or_else(Vec2::zeros);
        let layout = match self.shape {
            ClusterShape::Disc => disc_layout(self.count),
            ClusterShape::Ring => ring_layout(self.count),
        };
        layout
            .into_iter()
            .map(|(dir, r)| {
                let vel = match self.radial_speed {
                    Some(radial) => base + dir * radial,
                    None => base,
                };
                (center + dir * (r * self.radius), vel)
            })
            .collect()
    }
}

/// Explicit agents followed by the members of every cluster.
pub fn snapshot_from_clusters(agents: &[(Vec2, Vec2)], clusters: &[Cluster]) -> Result<Snapshot, FlockError> {
    let (positions, velocities): (Vec<Vec2>, Vec<Vec2>) = agents
        .iter()
        .copied()
        .chain(clusters.iter().flat_map(Cluster::members))
        .unzip();
    Snapshot::from_parts(positions, velocities)
}

/// Unit directions with a radial fraction in (0, 1], sunflower-spread over the disc.
fn disc_layout(count: usize) -> Vec<(Vec2, f64)> {
    let golden_angle = std::f64::consts::PI * (3.0 - 5.0_f64.sqrt());
    (0..count)
        .map(|i| {
            let r = ((i as f64 + 0.5) / count as f64).sqrt();
            let theta = i as f64 * golden_angle;
            (Vec2::new(theta.cos(), theta.sin()), r)
        })
        .collect()
}

fn ring_layout(count: usize) -> Vec<(Vec2, f64)> {
    (0..count)
        .map(|i| {
            let angle = (i as f64 / count as f64) * 2.0 * std::f64::consts::PI;
            (Vec2::new(angle.cos(), angle.sin()), 1.0)
        })
        .collect()
}

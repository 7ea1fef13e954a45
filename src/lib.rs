//! Boids flocking over three interchangeable neighbor searches.
//!
//! Separation, alignment and cohesion are evaluated against a frozen snapshot of
//! the previous step; the neighbors each rule needs come from a brute-force scan,
//! a uniform grid or a k-d tree. The search is a pure performance choice: all three
//! variants produce the same trajectory for the same seed.

pub mod algorithms;
pub mod engine;
pub mod error;
pub mod integrator;
pub mod models;
pub mod neighbors;
pub mod sim;
pub mod vector;

#[cfg(target_arch = "wasm32")]
pub mod wasm;

pub use algorithms::flocking::{CellSizing, FlockParams, FlockingRules};
pub use engine::{
    fastest, run_variant, simulate_brute_force, simulate_grid, simulate_kdtree, time_variants,
    variant_catalog, Engine, RunConfig, Timing, Variant, VariantInfo,
};
pub use error::FlockError;
pub use integrator::Integrator;
pub use models::flock::{seeded_snapshot, snapshot_from_clusters, Cluster, ClusterShape};
pub use neighbors::{BruteForce, KdTreeSearch, NeighborIndex, NeighborSearch, UniformGrid};
pub use sim::{FlockSimulation, Frame, History, Snapshot};

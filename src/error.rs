use thiserror::Error;

/// Errors raised while setting up a flock simulation.
///
/// All of these are configuration errors and are reported at construction time;
/// a simulation that was built successfully never fails mid-run.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FlockError {
    #[error("field size must be positive and finite (got {width} x {height})")]
    InvalidField { width: f64, height: f64 },

    #[error("view distance must be positive and finite (got {0})")]
    InvalidViewDistance(f64),

    #[error("{rule} radius must be positive and finite (got {radius})")]
    InvalidRadius { rule: &'static str, radius: f64 },

    #[error("{rule} radius {radius} exceeds the view distance {view_distance}")]
    RadiusExceedsViewDistance {
        rule: &'static str,
        radius: f64,
        view_distance: f64,
    },

    #[error("{name} must be finite and non-negative (got {value})")]
    NegativeParameter { name: &'static str, value: f64 },

    #[error("{name} must be positive and finite (got {value})")]
    NonPositiveBound { name: &'static str, value: f64 },

    #[error("snapshot has {positions} positions but {velocities} velocities")]
    MismatchedSnapshot { positions: usize, velocities: usize },

    #[error("grid cell size must be positive and finite (got {0})")]
    InvalidCellSize(f64),

    #[error("a {width} x {height} field with cell size {cell_size} needs more than {max_cells} grid cells")]
    GridTooLarge {
        width: f64,
        height: f64,
        cell_size: f64,
        max_cells: usize,
    },

    #[error("snapshot ids are not a permutation of 0..{len}")]
    InvalidAgentIds { len: usize },

    #[error("unknown variant id '{0}'")]
    UnknownVariant(String),
}

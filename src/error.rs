//! Error types for mesh assignment.

use thiserror::Error;

use crate::interlace::SubMesh;

/// Configuration and input errors reported by the assignment engine.
///
/// Contract violations that would silently corrupt forces (reading a cache
/// with a different order than it was filled with) are assertions instead.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AssignError {
    #[error("unsupported assignment order {0} (expected {min}..={max})",
            min = crate::constants::MIN_ORDER, max = crate::constants::MAX_ORDER)]
    UnsupportedOrder(usize),

    #[error("invalid mesh size {mesh}: {reason}")]
    InvalidMesh { mesh: usize, reason: String },

    #[error("invalid box length {0}")]
    InvalidBoxLength(f64),

    #[error("interpolation table resolution must be positive")]
    InvalidTableResolution,

    #[error("particle count mismatch: {positions} positions, {charges} charges")]
    ParticleCountMismatch { positions: usize, charges: usize },

    #[error("particle {index} at [{x}, {y}, {z}] lies outside the box [0, {length})")]
    ParticleOutsideBox { index: usize, x: f64, y: f64, z: f64, length: f64 },

    #[error("force buffer has {got} entries, expected {expected}")]
    ForceBufferLength { got: usize, expected: usize },

    #[error("mesh has {got} cells per axis, expected {expected}")]
    MeshMismatch { got: usize, expected: usize },

    #[error("analytic derivatives were not enabled for this table or assigner")]
    DerivativesUnavailable,

    #[error("no charge assignment recorded for the {0:?} sub-mesh")]
    MissingAssignment(SubMesh),

    #[error("interpolation table has order {table_order}, assigner expects {order}")]
    TableMismatch { table_order: usize, order: usize },

    #[error("particles live in a box of length {particles}, mesh covers {mesh}")]
    BoxLengthMismatch { particles: f64, mesh: f64 },

    #[error("the secondary sub-mesh is only available with interlacing enabled")]
    InterlacingDisabled,
}

impl AssignError {
    pub fn invalid_mesh(mesh: usize, reason: impl Into<String>) -> Self {
        AssignError::InvalidMesh { mesh, reason: reason.into() }
    }
}

pub type Result<T> = std::result::Result<T, AssignError>;

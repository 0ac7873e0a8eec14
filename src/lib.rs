//! Charge assignment and force back-interpolation for particle-mesh
//! (P3M) electrostatics in a cubic periodic box.
//!
//! Particles are spread onto a complex mesh with cardinal B-spline weights
//! sampled in an [`InterpolationTable`]; an external reciprocal-space solver
//! turns the charge mesh into a field or energy density; the same stencils
//! then gather forces back onto the particles. [`ChargeAssigner`] drives one
//! step, optionally interlaced over two half-cell-shifted meshes.

pub mod assign;
pub mod config;
pub mod constants;
pub mod error;
pub mod interlace;
pub mod interpolation;
pub mod mesh_3d;
pub mod output;
pub mod particles;
pub mod tuning;

pub use assign::{AssignmentCache, AssignmentKernel, MeshPass};
pub use config::AssignConfig;
pub use error::{AssignError, Result};
pub use interlace::{ChargeAssigner, InterlaceLayout, MeshSolver, SubMesh};
pub use interpolation::InterpolationTable;
pub use mesh_3d::{ComplexMesh, MeshGeometry, MeshSlot, VectorMesh};
pub use particles::ParticleSystem;
pub use tuning::TuningContext;

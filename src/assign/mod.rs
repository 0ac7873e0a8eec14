pub mod cache;
pub mod charge;
pub mod forces;
pub mod kernel;
pub mod parallel;
pub mod pass;
pub mod stencil;

pub use cache::AssignmentCache;
pub use charge::{assign_charges, assign_charges_and_derivatives, assign_charges_uncached,
                 assign_squared_charges};
pub use forces::{gather_energy_forces, gather_field_forces, gather_scalar_uncached};
pub use kernel::{kernel_for, AssignmentKernel, Cao, GenericKernel};
pub use pass::MeshPass;
pub use stencil::{locate, Stencil, StencilContext};

pub mod bspline;
pub mod spectral;
pub mod table;

pub use bspline::{assignment_weight, assignment_weight_derivative, centred_bspline};
pub use spectral::{aliasing_sum, kernel_hat, sinc};
pub use table::InterpolationTable;

pub mod diagnostic_output;
pub mod vti_output;

pub use diagnostic_output::AssignmentLogger;
pub use diagnostic_output::ForceDiagnostics;
pub use diagnostic_output::PassDiagnostics;
pub use vti_output::WriteVti;


pub const MIN_ORDER: usize = 1;
pub const MAX_ORDER: usize = 7;                // widest supported stencil

pub const MAX_INTERPOL: usize = 2048;          // table samples per half cell
pub const CONSERVATION_TOL: f64 = 1e-10;       // relative to the summed absolute charge

// Placeholder influence buffer used while tuning
pub const DUMMY_G_STEP: usize = 10;
pub const DUMMY_G_MIN_SIZE: usize = 32;
pub const DUMMY_G_MAX_SIZE: usize = 300;

// Smallest particle batch handed to one rayon task; each task owns a partial mesh
pub const PARALLEL_MIN_PARTICLES: usize = 1024;

pub mod particles;

pub use particles::{net_force, ParticleSystem};

use glam::DVec3;
use rand::Rng;

use crate::error::{AssignError, Result};

/// Point charges in a cubic periodic box. Read-only to the assignment passes.
#[derive(Debug, Clone, PartialEq)]
pub struct ParticleSystem {
    box_length: f64,
    positions: Vec<DVec3>,
    charges: Vec<f64>,
}

impl ParticleSystem {
    pub fn init(box_length: f64) -> Result<Self> {
        if !(box_length.is_finite() && box_length > 0.0) {
            return Err(AssignError::InvalidBoxLength(box_length));
        }
        Ok(Self { box_length, positions: Vec::new(), charges: Vec::new() })
    }

    pub fn from_parts(box_length: f64, positions: Vec<DVec3>, charges: Vec<f64>) -> Result<Self> {
        let mut s = Self::init(box_length)?;
        if positions.len() != charges.len() {
            return Err(AssignError::ParticleCountMismatch { positions: positions.len(),
                                                             charges: charges.len() });
        }
        s.positions = positions;
        s.charges = charges;
        s.validate()?;
        Ok(s)
    }

    /// Checks every position lies in `[0, L)` on each axis.
    pub fn validate(&self) -> Result<()> {
        for (index, p) in self.positions.iter().enumerate() {
            if !self.in_box(*p) {
                return Err(AssignError::ParticleOutsideBox { index, x: p.x, y: p.y, z: p.z,
                                                             length: self.box_length });
            }
        }
        Ok(())
    }

    fn in_box(&self, p: DVec3) -> bool {
        p.cmpge(DVec3::ZERO).all() && p.cmplt(DVec3::splat(self.box_length)).all()
    }

    pub fn push(&mut self, position: DVec3, charge: f64) -> Result<()> {
        if !self.in_box(position) {
            return Err(AssignError::ParticleOutsideBox { index: self.positions.len(),
                                                         x: position.x, y: position.y,
                                                         z: position.z, length: self.box_length });
        }
        self.positions.push(position);
        self.charges.push(charge);
        Ok(())
    }

    /// Loads `num_particles` uniformly distributed unit charges of alternating
    /// sign, then removes the mean so the box is exactly neutral.
    pub fn load_random_neutral<R: Rng>(&mut self, num_particles: usize, rng: &mut R) {
        self.positions.reserve(num_particles);
        self.charges.reserve(num_particles);

        let first = self.charges.len();
        for i in 0..num_particles {
            let pos = DVec3::new(rng.gen_range(0.0..self.box_length),
                                 rng.gen_range(0.0..self.box_length),
                                 rng.gen_range(0.0..self.box_length));
            self.positions.push(pos);
            self.charges.push(if i % 2 == 0 { 1.0 } else { -1.0 });
        }
        if num_particles > 0 {
            let mean = self.charges[first..].iter().sum::<f64>() / num_particles as f64;
            for q in self.charges[first..].iter_mut() {
                *q -= mean;
            }
        }
    }

    /// Moves every particle by `delta` and folds it back into the box.
    pub fn displace(&mut self, delta: &[DVec3]) -> Result<()> {
        if delta.len() != self.positions.len() {
            return Err(AssignError::ParticleCountMismatch { positions: delta.len(),
                                                             charges: self.charges.len() });
        }
        let l = self.box_length;
        for (p, d) in self.positions.iter_mut().zip(delta) {
            let mut moved = (*p + *d).rem_euclid(DVec3::splat(l));
            // rem_euclid can round up to exactly L for tiny negative inputs
            for dim in 0..3 {
                if moved[dim] >= l {
                    moved[dim] = 0.0;
                }
            }
            *p = moved;
        }
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    pub fn box_length(&self) -> f64 {
        self.box_length
    }

    pub fn positions(&self) -> &[DVec3] {
        &self.positions
    }

    pub fn charges(&self) -> &[f64] {
        &self.charges
    }

    pub fn total_charge(&self) -> f64 {
        self.charges.iter().sum()
    }

    pub fn sum_squared_charges(&self) -> f64 {
        self.charges.iter().map(|q| q * q).sum()
    }

    pub fn squared_charges(&self) -> Vec<f64> {
        self.charges.iter().map(|q| q * q).collect()
    }
}

/// Sum of all per-particle forces; zero for a momentum-conserving pass.
pub fn net_force(forces: &[DVec3]) -> DVec3 {
    forces.iter().fold(DVec3::ZERO, |acc, f| acc + *f)
}

use crate::error::{AssignError, Result};
use super::ComplexMesh;

/// Cubic periodic box discretised into `mesh` cells per axis.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MeshGeometry {
    mesh: usize,
    box_length: f64,
    // computed fields
    mesh_per_length: f64,
    length_inv: f64,
}

impl MeshGeometry {
    pub fn init(mesh: usize, box_length: f64) -> Result<Self> {
        if mesh == 0 {
            return Err(AssignError::invalid_mesh(mesh, "mesh must have at least one cell"));
        }
        if !(box_length.is_finite() && box_length > 0.0) {
            return Err(AssignError::InvalidBoxLength(box_length));
        }
        Ok(Self { mesh, box_length,
                  mesh_per_length: mesh as f64 / box_length,
                  length_inv: 1.0 / box_length })
    }

    pub fn mesh(&self) -> usize {
        self.mesh
    }

    pub fn box_length(&self) -> f64 {
        self.box_length
    }

    /// Cells per unit length, `mesh / L`.
    pub fn mesh_per_length(&self) -> f64 {
        self.mesh_per_length
    }

    pub fn length_inv(&self) -> f64 {
        self.length_inv
    }

    /// Mesh spacing `h = L / mesh`.
    pub fn spacing(&self) -> f64 {
        self.box_length / self.mesh as f64
    }

    pub fn check_mesh(&self, m: &ComplexMesh) -> Result<()> {
        if m.mesh() != self.mesh {
            return Err(AssignError::MeshMismatch { got: m.mesh(), expected: self.mesh });
        }
        Ok(())
    }
}

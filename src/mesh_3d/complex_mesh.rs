use glam::DVec3;
use serde::{Deserialize, Serialize};

/// Which half of an interleaved `(re, im)` pair a pass reads or writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MeshSlot {
    Real,
    Imaginary,
}

impl MeshSlot {
    #[inline]
    pub fn offset(self) -> usize {
        match self {
            MeshSlot::Real => 0,
            MeshSlot::Imaginary => 1,
        }
    }
}

/// Cubic mesh of complex values stored as interleaved reals, laid out so an
/// in-place 3D FFT can consume it directly. Cell `(i, j, k)` starts at
/// `2 * (mesh^2 * i + mesh * j + k)`, z fastest.
#[derive(Debug, Clone, PartialEq)]
pub struct ComplexMesh {
    mesh: usize,
    data: Vec<f64>,
}

impl ComplexMesh {
    pub fn init(mesh: usize) -> Self {
        Self { mesh, data: vec![0.0; 2 * mesh * mesh * mesh] }
    }

    pub fn mesh(&self) -> usize {
        self.mesh
    }

    pub fn n_cells(&self) -> usize {
        self.mesh * self.mesh * self.mesh
    }

    pub fn set_all(&mut self, val: f64) {
        self.data.fill(val);
    }

    pub fn zero(&mut self) {
        self.set_all(0.0);
    }

    /// Sets one half of every complex pair, leaving the other untouched.
    pub fn fill_slot(&mut self, slot: MeshSlot, val: f64) {
        for v in self.data.iter_mut().skip(slot.offset()).step_by(2) {
            *v = val;
        }
    }

    pub fn zero_slot(&mut self, slot: MeshSlot) {
        self.fill_slot(slot, 0.0);
    }

    #[inline]
    pub fn idx(&self, i: usize, j: usize, k: usize, slot: MeshSlot) -> usize {
        debug_assert!(i < self.mesh, "x index ({i}) out of bounds [0, {})", self.mesh);
        debug_assert!(j < self.mesh, "y index ({j}) out of bounds [0, {})", self.mesh);
        debug_assert!(k < self.mesh, "z index ({k}) out of bounds [0, {})", self.mesh);
        2 * (self.mesh * self.mesh * i + self.mesh * j + k) + slot.offset()
    }

    #[inline]
    pub fn get(&self, i: usize, j: usize, k: usize, slot: MeshSlot) -> f64 {
        self.data[self.idx(i, j, k, slot)]
    }

    pub fn set(&mut self, i: usize, j: usize, k: usize, slot: MeshSlot, val: f64) {
        let idx = self.idx(i, j, k, slot);
        self.data[idx] = val;
    }

    #[inline]
    pub fn add(&mut self, i: usize, j: usize, k: usize, slot: MeshSlot, val: f64) {
        let idx = self.idx(i, j, k, slot);
        self.data[idx] += val;
    }

    /// Iterates one slot of every cell in storage order.
    pub fn slot_values(&self, slot: MeshSlot) -> impl Iterator<Item = f64> + '_ {
        self.data.iter().skip(slot.offset()).step_by(2).copied()
    }

    pub fn sum(&self, slot: MeshSlot) -> f64 {
        self.slot_values(slot).sum()
    }

    pub fn max_abs(&self, slot: MeshSlot) -> f64 {
        self.slot_values(slot).fold(0.0, |acc, v| acc.max(v.abs()))
    }

    pub fn len(&self) -> usize { self.data.len() }

    pub fn is_empty(&self) -> bool { self.data.is_empty() }

    pub fn data(&self) -> &[f64] { &self.data }

    pub fn data_mut(&mut self) -> &mut [f64] { &mut self.data }

    pub fn elementwise_inplace_add(&mut self, other: &ComplexMesh) {
        assert_eq!(self.mesh, other.mesh, "adding meshes of different resolution");
        for (x, y) in self.data.iter_mut().zip(&other.data) {
            *x += *y;
        }
    }

    pub fn scalar_inplace_mult(&mut self, s: f64) {
        for x in self.data.iter_mut() {
            *x *= s;
        }
    }
}

/// Three component meshes holding a vector field computed in k-space.
#[derive(Debug, Clone, PartialEq)]
pub struct VectorMesh {
    components: [ComplexMesh; 3],
}

impl VectorMesh {
    pub fn init(mesh: usize) -> Self {
        Self { components: [ComplexMesh::init(mesh), ComplexMesh::init(mesh),
                            ComplexMesh::init(mesh)] }
    }

    pub fn mesh(&self) -> usize {
        self.components[0].mesh()
    }

    pub fn component(&self, axis: usize) -> &ComplexMesh {
        &self.components[axis]
    }

    pub fn component_mut(&mut self, axis: usize) -> &mut ComplexMesh {
        &mut self.components[axis]
    }

    pub fn set_all(&mut self, val: DVec3) {
        for (c, v) in self.components.iter_mut().zip(val.to_array()) {
            c.set_all(v);
        }
    }

    pub fn fill_slot(&mut self, slot: MeshSlot, val: DVec3) {
        for (c, v) in self.components.iter_mut().zip(val.to_array()) {
            c.fill_slot(slot, v);
        }
    }

    #[inline]
    pub fn get(&self, i: usize, j: usize, k: usize, slot: MeshSlot) -> DVec3 {
        let idx = self.components[0].idx(i, j, k, slot);
        DVec3::new(self.components[0].data[idx],
                   self.components[1].data[idx],
                   self.components[2].data[idx])
    }

    pub fn set(&mut self, i: usize, j: usize, k: usize, slot: MeshSlot, val: DVec3) {
        for (c, v) in self.components.iter_mut().zip(val.to_array()) {
            c.set(i, j, k, slot, v);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interleaved_layout_matches_fft_convention() {
        let m = ComplexMesh::init(4);
        assert_eq!(m.len(), 2 * 64);
        assert_eq!(m.idx(0, 0, 0, MeshSlot::Real), 0);
        assert_eq!(m.idx(0, 0, 1, MeshSlot::Real), 2);
        assert_eq!(m.idx(0, 1, 0, MeshSlot::Imaginary), 9);
        assert_eq!(m.idx(1, 0, 0, MeshSlot::Real), 32);
        assert_eq!(m.idx(3, 2, 1, MeshSlot::Imaginary), 2 * (16 * 3 + 4 * 2 + 1) + 1);
    }

    #[test]
    fn slots_are_independent() {
        let mut m = ComplexMesh::init(3);
        m.add(1, 2, 0, MeshSlot::Real, 2.0);
        m.add(1, 2, 0, MeshSlot::Imaginary, -5.0);
        m.add(1, 2, 0, MeshSlot::Real, 0.5);
        assert_eq!(m.get(1, 2, 0, MeshSlot::Real), 2.5);
        assert_eq!(m.sum(MeshSlot::Real), 2.5);
        assert_eq!(m.sum(MeshSlot::Imaginary), -5.0);
        assert_eq!(m.max_abs(MeshSlot::Imaginary), 5.0);
        m.zero_slot(MeshSlot::Real);
        assert_eq!(m.max_abs(MeshSlot::Real), 0.0);
        assert_eq!(m.sum(MeshSlot::Imaginary), -5.0);
        m.zero();
        assert_eq!(m.max_abs(MeshSlot::Imaginary), 0.0);
    }

    #[test]
    fn accumulate_and_scale() {
        let mut a = ComplexMesh::init(2);
        let mut b = ComplexMesh::init(2);
        a.set(0, 1, 1, MeshSlot::Real, 1.0);
        b.set(0, 1, 1, MeshSlot::Real, 3.0);
        a.elementwise_inplace_add(&b);
        a.scalar_inplace_mult(0.5);
        assert_eq!(a.get(0, 1, 1, MeshSlot::Real), 2.0);
    }

    #[test]
    fn vector_mesh_roundtrips_components() {
        let mut f = VectorMesh::init(4);
        f.set(2, 3, 1, MeshSlot::Real, DVec3::new(1.0, -2.0, 3.0));
        assert_eq!(f.get(2, 3, 1, MeshSlot::Real), DVec3::new(1.0, -2.0, 3.0));
        assert_eq!(f.get(2, 3, 1, MeshSlot::Imaginary), DVec3::ZERO);
        assert_eq!(f.component(1).sum(MeshSlot::Real), -2.0);
        f.set_all(DVec3::ONE);
        assert_eq!(f.component(2).sum(MeshSlot::Real), 64.0);
        f.fill_slot(MeshSlot::Imaginary, DVec3::new(0.0, 0.0, -1.0));
        assert_eq!(f.component(2).sum(MeshSlot::Imaginary), -64.0);
        assert_eq!(f.component(2).sum(MeshSlot::Real), 64.0);
    }
}

#![allow(dead_code)]

use glam::DVec3;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use p3m_charge_assign::{ComplexMesh, MeshSlot, MeshSolver, ParticleSystem, SubMesh, VectorMesh};

/// Uniformly placed particles with charges in `[-1, 2)`, so the total is not zero.
pub fn random_system(n: usize, box_length: f64, seed: u64) -> ParticleSystem {
    let mut rng = StdRng::seed_from_u64(seed);
    let positions = (0..n)
        .map(|_| DVec3::new(rng.gen_range(0.0..box_length), rng.gen_range(0.0..box_length),
                            rng.gen_range(0.0..box_length)))
        .collect();
    let charges = (0..n).map(|_| rng.gen_range(-1.0..2.0)).collect();
    ParticleSystem::from_parts(box_length, positions, charges).unwrap()
}

/// Particles confined to `[lo, hi)` on every axis.
pub fn clustered_system(n: usize, box_length: f64, lo: f64, hi: f64, seed: u64) -> ParticleSystem {
    let mut rng = StdRng::seed_from_u64(seed);
    let positions = (0..n)
        .map(|_| DVec3::new(rng.gen_range(lo..hi), rng.gen_range(lo..hi), rng.gen_range(lo..hi)))
        .collect();
    let charges = (0..n).map(|_| rng.gen_range(-1.0..1.0)).collect();
    ParticleSystem::from_parts(box_length, positions, charges).unwrap()
}

pub fn assert_close(a: DVec3, b: DVec3, tol: f64) {
    assert!((a - b).abs().max_element() <= tol, "{a} vs {b} (tol {tol})");
}

/// Field that is the same everywhere, ignoring the charge.
pub struct UniformField(pub DVec3);

impl MeshSolver for UniformField {
    fn solve_field(&mut self, _sub: SubMesh, slot: MeshSlot, _charge: &ComplexMesh,
                   field: &mut VectorMesh) {
        field.fill_slot(slot, self.0);
    }

    fn solve_energy(&mut self, _sub: SubMesh, slot: MeshSlot, mesh: &mut ComplexMesh) {
        mesh.fill_slot(slot, 0.0);
    }
}

/// Energy density equal to the x cell index, `phi(i, j, k) = i`.
pub struct LinearPotential;

impl MeshSolver for LinearPotential {
    fn solve_field(&mut self, _sub: SubMesh, slot: MeshSlot, _charge: &ComplexMesh,
                   field: &mut VectorMesh) {
        field.fill_slot(slot, DVec3::ZERO);
    }

    fn solve_energy(&mut self, _sub: SubMesh, slot: MeshSlot, mesh: &mut ComplexMesh) {
        fill_linear_x(mesh, slot);
    }
}

pub fn fill_linear_x(mesh: &mut ComplexMesh, slot: MeshSlot) {
    let m = mesh.mesh();
    for i in 0..m {
        for j in 0..m {
            for k in 0..m {
                mesh.set(i, j, k, slot, i as f64);
            }
        }
    }
}

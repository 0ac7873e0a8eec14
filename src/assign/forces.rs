//! Force back-interpolation from a solved mesh onto the particles.
//!
//! Forces are accumulated into the caller's buffer. `scale` is the sub-mesh
//! weight (0.5 per interlaced sub-mesh, 1 otherwise).

use glam::DVec3;

use crate::error::{AssignError, Result};
use crate::mesh_3d::{ComplexMesh, VectorMesh};
use crate::particles::ParticleSystem;
use super::cache::AssignmentCache;
use super::parallel::{gather_energy_parallel, gather_field_parallel, gather_scalar_parallel};
use super::pass::MeshPass;
use super::stencil::locate;

fn check_forces(cache: &AssignmentCache, forces: &[DVec3]) -> Result<()> {
    if forces.len() != cache.len() {
        return Err(AssignError::ForceBufferLength { got: forces.len(), expected: cache.len() });
    }
    Ok(())
}

/// Field-gather mode: `force -= scale * prefactor * sum_c cf_c * E_c` with the
/// cached weight fractions (which already carry the charge).
pub fn gather_field_forces(pass: &MeshPass, cache: &AssignmentCache, field: &VectorMesh,
                           prefactor: f64, scale: f64, forces: &mut [DVec3]) -> Result<()> {
    pass.assert_cache_order(cache);
    if field.mesh() != pass.geometry().mesh() {
        return Err(AssignError::MeshMismatch { got: field.mesh(), expected: pass.geometry().mesh() });
    }
    check_forces(cache, forces)?;

    let (kernel, slot) = (pass.kernel(), pass.slot());
    let factor = scale * prefactor;
    if pass.parallel() {
        gather_field_parallel(kernel, cache, field, slot, factor, forces);
    } else {
        for (i, f) in forces.iter_mut().enumerate() {
            *f -= kernel.gather_field(cache.base(i), cache.fractions(i), field, slot) * factor;
        }
    }
    log::debug!("gathered field forces on {} particles ({:?} slot, weight {scale})",
                forces.len(), slot);
    Ok(())
}

/// Analytic-derivative mode: `force -= scale * prefactor * sum_c phi_c * dQ_c`
/// with the derivative weights cached by
/// [`assign_charges_and_derivatives`](super::assign_charges_and_derivatives).
pub fn gather_energy_forces(pass: &MeshPass, cache: &AssignmentCache, energy: &ComplexMesh,
                            prefactor: f64, scale: f64, forces: &mut [DVec3]) -> Result<()> {
    pass.assert_cache_order(cache);
    pass.geometry().check_mesh(energy)?;
    check_forces(cache, forces)?;
    let derivatives = cache.all_derivatives().ok_or(AssignError::DerivativesUnavailable)?;

    let (kernel, slot) = (pass.kernel(), pass.slot());
    let factor = scale * prefactor;
    if pass.parallel() {
        gather_energy_parallel(kernel, cache, derivatives, energy, slot, factor, forces);
    } else {
        let n3 = cache.stencil_size();
        for (i, (f, d)) in forces.iter_mut().zip(derivatives.chunks(n3)).enumerate() {
            *f -= kernel.gather_energy_gradient(cache.base(i), d, energy, slot) * factor;
        }
    }
    log::debug!("gathered energy forces on {} particles ({:?} slot, weight {scale})",
                forces.len(), slot);
    Ok(())
}

/// Interpolates a scalar mesh quantity back onto each particle, recomputing
/// the weights instead of reading a cache. Charges are not applied.
pub fn gather_scalar_uncached(pass: &MeshPass, particles: &ParticleSystem,
                              mesh: &ComplexMesh) -> Result<Vec<f64>> {
    pass.check_inputs(particles, mesh)?;
    if pass.parallel() {
        return Ok(gather_scalar_parallel(pass, particles.positions(), mesh));
    }
    let ctx = pass.stencil_context();
    let (kernel, table, slot, order) = (pass.kernel(), pass.table(), pass.slot(), pass.order());
    Ok(particles.positions().iter()
        .map(|p| kernel.gather_scalar(&locate(*p, order, &ctx), table, mesh, slot))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assign::{assign_charges, assign_charges_and_derivatives, kernel_for};
    use crate::interpolation::InterpolationTable;
    use crate::mesh_3d::{MeshGeometry, MeshSlot};

    fn one_particle(pos: DVec3, q: f64) -> ParticleSystem {
        ParticleSystem::from_parts(8.0, vec![pos], vec![q]).unwrap()
    }

    #[test]
    fn constant_field_gives_charge_times_field() {
        let geometry = MeshGeometry::init(8, 8.0).unwrap();
        let table = InterpolationTable::with_resolution(5, false, 256).unwrap();
        let pass = MeshPass::new(kernel_for(5).unwrap(), &geometry, &table).unwrap();
        let particles = one_particle(DVec3::new(0.2, 7.7, 3.3), -2.0);

        let mut mesh = ComplexMesh::init(8);
        let mut cache = AssignmentCache::new(5);
        assign_charges(&pass, &particles, &mut mesh, &mut cache).unwrap();

        let mut field = VectorMesh::init(8);
        field.set_all(DVec3::new(1.0, -3.0, 0.5));
        let mut forces = vec![DVec3::new(10.0, 0.0, 0.0)];
        gather_field_forces(&pass, &cache, &field, 2.0, 0.5, &mut forces).unwrap();
        // 10 - 0.5 * 2 * (-2) * (1, -3, 0.5)
        let expected = DVec3::new(12.0, -6.0, 1.0);
        assert!((forces[0] - expected).length() < 1e-12, "{}", forces[0]);
    }

    #[test]
    fn energy_mode_needs_cached_derivatives() {
        let geometry = MeshGeometry::init(8, 8.0).unwrap();
        let table = InterpolationTable::with_resolution(3, true, 64).unwrap();
        let pass = MeshPass::new(kernel_for(3).unwrap(), &geometry, &table).unwrap();
        let particles = one_particle(DVec3::splat(4.0), 1.0);
        let mut mesh = ComplexMesh::init(8);
        let mut cache = AssignmentCache::new(3);
        assign_charges(&pass, &particles, &mut mesh, &mut cache).unwrap();

        let mut forces = vec![DVec3::ZERO];
        assert_eq!(gather_energy_forces(&pass, &cache, &mesh, 1.0, 1.0, &mut forces),
                   Err(AssignError::DerivativesUnavailable));

        assign_charges_and_derivatives(&pass, &particles, &mut mesh, &mut cache).unwrap();
        gather_energy_forces(&pass, &cache, &mesh, 1.0, 1.0, &mut forces).unwrap();
        // a lone symmetric particle feels no force from its own charge cloud
        assert!(forces[0].length() < 1e-14, "{}", forces[0]);
    }

    #[test]
    fn force_buffer_must_match_the_cache() {
        let geometry = MeshGeometry::init(8, 8.0).unwrap();
        let table = InterpolationTable::with_resolution(2, false, 64).unwrap();
        let pass = MeshPass::new(kernel_for(2).unwrap(), &geometry, &table).unwrap();
        let particles = one_particle(DVec3::splat(1.0), 1.0);
        let mut mesh = ComplexMesh::init(8);
        let mut cache = AssignmentCache::new(2);
        assign_charges(&pass, &particles, &mut mesh, &mut cache).unwrap();

        let field = VectorMesh::init(8);
        let mut forces = vec![DVec3::ZERO; 3];
        assert_eq!(gather_field_forces(&pass, &cache, &field, 1.0, 1.0, &mut forces),
                   Err(AssignError::ForceBufferLength { got: 3, expected: 1 }));
        let small = VectorMesh::init(4);
        assert_eq!(gather_field_forces(&pass, &cache, &small, 1.0, 1.0, &mut forces[..1]),
                   Err(AssignError::MeshMismatch { got: 4, expected: 8 }));
    }

    #[test]
    fn scalar_gather_of_a_uniform_mesh_is_uniform() {
        let geometry = MeshGeometry::init(8, 8.0).unwrap();
        let table = InterpolationTable::with_resolution(6, false, 64).unwrap();
        let pass = MeshPass::new(kernel_for(6).unwrap(), &geometry, &table).unwrap()
            .with_slot(MeshSlot::Imaginary);
        let particles = ParticleSystem::from_parts(
            8.0, vec![DVec3::new(0.1, 0.2, 0.3), DVec3::new(7.9, 4.4, 2.5)], vec![3.0, -1.0]).unwrap();
        let mut mesh = ComplexMesh::init(8);
        mesh.set_all(2.5);
        let values = gather_scalar_uncached(&pass, &particles, &mesh).unwrap();
        assert_eq!(values.len(), 2);
        for v in values {
            assert!((v - 2.5).abs() < 1e-13);
        }
    }
}

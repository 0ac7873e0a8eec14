//! Charge assignment: spreading particle charges onto a mesh slot.
//!
//! All variants add into the mesh; zeroing it before a pass is the caller's
//! job. Cached variants overwrite the cache with the rows for this pass.

use glam::DVec3;

use crate::constants::CONSERVATION_TOL;
use crate::error::{AssignError, Result};
use crate::mesh_3d::ComplexMesh;
use crate::particles::ParticleSystem;
use super::cache::AssignmentCache;
use super::parallel::spread_parallel;
use super::pass::MeshPass;
use super::stencil::locate;

/// Spreads every particle charge into `pass.slot()` and records the base
/// cells and weight fractions in `cache`.
pub fn assign_charges(pass: &MeshPass, particles: &ParticleSystem, mesh: &mut ComplexMesh,
                      cache: &mut AssignmentCache) -> Result<()> {
    pass.check_inputs(particles, mesh)?;
    pass.assert_cache_order(cache);
    cache.prepare(particles.len(), false);
    spread("charges", pass, particles.positions(), particles.charges(), mesh, Some(cache))
}

/// As [`assign_charges`], additionally caching the analytic derivative
/// weights `q / L * (dw_x w_y w_z, w_x dw_y w_z, w_x w_y dw_z)` per cell.
pub fn assign_charges_and_derivatives(pass: &MeshPass, particles: &ParticleSystem,
                                      mesh: &mut ComplexMesh,
                                      cache: &mut AssignmentCache) -> Result<()> {
    if !pass.table().has_derivatives() {
        return Err(AssignError::DerivativesUnavailable);
    }
    pass.check_inputs(particles, mesh)?;
    pass.assert_cache_order(cache);
    cache.prepare(particles.len(), true);
    spread("charges+derivatives", pass, particles.positions(), particles.charges(), mesh,
           Some(cache))
}

/// Spreads the charges without touching any cache.
pub fn assign_charges_uncached(pass: &MeshPass, particles: &ParticleSystem,
                               mesh: &mut ComplexMesh) -> Result<()> {
    pass.check_inputs(particles, mesh)?;
    spread("charges (uncached)", pass, particles.positions(), particles.charges(), mesh, None)
}

/// Spreads `q^2` instead of `q`, uncached. The result feeds error estimates
/// for inhomogeneous systems.
pub fn assign_squared_charges(pass: &MeshPass, particles: &ParticleSystem,
                              mesh: &mut ComplexMesh) -> Result<()> {
    pass.check_inputs(particles, mesh)?;
    let squared = particles.squared_charges();
    spread("squared charges", pass, particles.positions(), &squared, mesh, None)
}

fn spread(kind: &str, pass: &MeshPass, positions: &[DVec3], charges: &[f64],
          mesh: &mut ComplexMesh, cache: Option<&mut AssignmentCache>) -> Result<()> {
    let before = log::log_enabled!(log::Level::Debug).then(|| mesh.sum(pass.slot()));

    if pass.parallel() {
        spread_parallel(pass, positions, charges, mesh, cache)?;
    } else {
        spread_serial(pass, positions, charges, mesh, cache)?;
    }

    log::debug!("assigned {kind} of {} particles at order {} (shift {}, {:?} slot{})",
                positions.len(), pass.order(), pass.shift(), pass.slot(),
                if pass.parallel() { ", parallel" } else { "" });
    if let Some(before) = before {
        check_conservation(kind, mesh.sum(pass.slot()) - before, charges);
    }
    Ok(())
}

fn spread_serial(pass: &MeshPass, positions: &[DVec3], charges: &[f64],
                 mesh: &mut ComplexMesh, cache: Option<&mut AssignmentCache>) -> Result<()> {
    let ctx = pass.stencil_context();
    let (kernel, table, slot, order) = (pass.kernel(), pass.table(), pass.slot(), pass.order());

    let Some(cache) = cache else {
        for (p, &q) in positions.iter().zip(charges) {
            let stencil = locate(*p, order, &ctx);
            kernel.spread_particle(&stencil, q, table, mesh, slot, None);
        }
        return Ok(());
    };

    let n3 = cache.stencil_size();
    let length_inv = pass.geometry().length_inv();
    let (base, fractions, mut derivatives) = cache.parts_mut();
    for (i, (p, &q)) in positions.iter().zip(charges).enumerate() {
        let stencil = locate(*p, order, &ctx);
        let rows = i * n3..(i + 1) * n3;
        base[i] = stencil.base;
        kernel.spread_particle(&stencil, q, table, mesh, slot, Some(&mut fractions[rows.clone()]));
        if let Some(d) = derivatives.as_deref_mut() {
            kernel.derivative_weights(&stencil, q * length_inv, table, &mut d[rows])?;
        }
    }
    Ok(())
}

fn check_conservation(kind: &str, mesh_delta: f64, charges: &[f64]) {
    let assigned: f64 = charges.iter().sum();
    let scale: f64 = charges.iter().map(|q| q.abs()).sum::<f64>().max(1.0);
    let err = (mesh_delta - assigned).abs();
    if err > CONSERVATION_TOL * scale {
        log::warn!("{kind}: mesh gained {mesh_delta:e}, particles carry {assigned:e} (error {err:e})");
    }
}

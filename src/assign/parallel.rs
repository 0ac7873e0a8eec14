//! Rayon variants of the assignment and gather loops.
//!
//! Particles are independent; only the mesh accumulator is shared. Each
//! rayon task spreads into its own zeroed partial mesh, partials are summed
//! pairwise and the total is added into the destination once. Cache rows are
//! written through disjoint chunks, one per particle.

use glam::DVec3;
use rayon::prelude::*;

use crate::constants::PARALLEL_MIN_PARTICLES;
use crate::error::Result;
use crate::mesh_3d::{ComplexMesh, MeshSlot, VectorMesh};
use super::cache::AssignmentCache;
use super::kernel::AssignmentKernel;
use super::pass::MeshPass;
use super::stencil::locate;

fn reduce_partials<I, F>(items: I, mesh: usize, spread: F) -> Result<Option<ComplexMesh>>
where
    I: IndexedParallelIterator,
    F: Fn(&mut ComplexMesh, I::Item) -> Result<()> + Sync + Send,
{
    items.with_min_len(PARALLEL_MIN_PARTICLES)
        .try_fold(|| ComplexMesh::init(mesh), |mut local, item| -> Result<ComplexMesh> {
            spread(&mut local, item)?;
            Ok(local)
        })
        .try_reduce_with(|mut a, b| -> Result<ComplexMesh> {
            a.elementwise_inplace_add(&b);
            Ok(a)
        })
        .transpose()
}

pub(crate) fn spread_parallel(pass: &MeshPass, positions: &[DVec3], charges: &[f64],
                              mesh: &mut ComplexMesh,
                              cache: Option<&mut AssignmentCache>) -> Result<()> {
    let ctx = pass.stencil_context();
    let (kernel, table, slot, order) = (pass.kernel(), pass.table(), pass.slot(), pass.order());
    let length_inv = pass.geometry().length_inv();
    let m = mesh.mesh();
    let particles = positions.par_iter().zip(charges.par_iter());

    let partial = match cache {
        None => reduce_partials(particles, m, |local, (p, &q)| {
            kernel.spread_particle(&locate(*p, order, &ctx), q, table, local, slot, None);
            Ok(())
        })?,
        Some(cache) => {
            let n3 = cache.stencil_size();
            let (base, fractions, derivatives) = cache.parts_mut();
            let rows = particles.zip(base.par_iter_mut()).zip(fractions.par_chunks_mut(n3));
            match derivatives {
                None => reduce_partials(rows, m, |local, (((p, &q), b), f)| {
                    let stencil = locate(*p, order, &ctx);
                    *b = stencil.base;
                    kernel.spread_particle(&stencil, q, table, local, slot, Some(f));
                    Ok(())
                })?,
                Some(derivs) => reduce_partials(rows.zip(derivs.par_chunks_mut(n3)), m,
                                           |local, ((((p, &q), b), f), d)| {
                    let stencil = locate(*p, order, &ctx);
                    *b = stencil.base;
                    kernel.spread_particle(&stencil, q, table, local, slot, Some(f));
                    kernel.derivative_weights(&stencil, q * length_inv, table, d)
                })?,
            }
        }
    };

    if let Some(partial) = partial {
        mesh.elementwise_inplace_add(&partial);
    }
    Ok(())
}

pub(crate) fn gather_field_parallel(kernel: &dyn AssignmentKernel, cache: &AssignmentCache,
                                    field: &VectorMesh, slot: MeshSlot, factor: f64,
                                    forces: &mut [DVec3]) {
    let n3 = cache.stencil_size();
    forces.par_iter_mut()
        .zip(cache.bases().par_iter())
        .zip(cache.all_fractions().par_chunks(n3))
        .with_min_len(PARALLEL_MIN_PARTICLES)
        .for_each(|((f, &base), fractions)| {
            *f -= kernel.gather_field(base, fractions, field, slot) * factor;
        });
}

pub(crate) fn gather_energy_parallel(kernel: &dyn AssignmentKernel, cache: &AssignmentCache,
                                     derivatives: &[DVec3], energy: &ComplexMesh,
                                     slot: MeshSlot, factor: f64, forces: &mut [DVec3]) {
    let n3 = cache.stencil_size();
    forces.par_iter_mut()
        .zip(cache.bases().par_iter())
        .zip(derivatives.par_chunks(n3))
        .with_min_len(PARALLEL_MIN_PARTICLES)
        .for_each(|((f, &base), d)| {
            *f -= kernel.gather_energy_gradient(base, d, energy, slot) * factor;
        });
}

pub(crate) fn gather_scalar_parallel(pass: &MeshPass, positions: &[DVec3],
                                     mesh: &ComplexMesh) -> Vec<f64> {
    let ctx = pass.stencil_context();
    let (kernel, table, slot, order) = (pass.kernel(), pass.table(), pass.slot(), pass.order());
    positions.par_iter()
        .with_min_len(PARALLEL_MIN_PARTICLES)
        .map(|p| kernel.gather_scalar(&locate(*p, order, &ctx), table, mesh, slot))
        .collect()
}

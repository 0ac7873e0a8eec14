use std::fmt;

use glam::DVec3;

use crate::constants::{MAX_ORDER, MIN_ORDER};
use crate::error::{AssignError, Result};
use crate::interpolation::InterpolationTable;
use crate::mesh_3d::{wrap_mesh_index, ComplexMesh, MeshSlot, VectorMesh};
use super::stencil::Stencil;

/// Per-particle primitives of one assignment order.
///
/// Every method visits the `order^3` stencil cells in the same order: x
/// slowest, z fastest. Cache rows written by `spread_particle` and
/// `derivative_weights` are laid out the same way, which is what lets the
/// gathers walk them back without recomputing indices.
pub trait AssignmentKernel: fmt::Debug + Send + Sync {
    fn order(&self) -> usize;

    /// Adds `charge * w_x * w_y * w_z` into `slot` of every stencil cell.
    /// The per-cell weights are also written to `fractions` when given.
    fn spread_particle(&self, stencil: &Stencil, charge: f64, table: &InterpolationTable,
                       mesh: &mut ComplexMesh, slot: MeshSlot, fractions: Option<&mut [f64]>);

    /// Writes `scale * (dw_x w_y w_z, w_x dw_y w_z, w_x w_y dw_z)` per cell.
    fn derivative_weights(&self, stencil: &Stencil, scale: f64, table: &InterpolationTable,
                          out: &mut [DVec3]) -> Result<()>;

    /// `sum_c fractions[c] * field[c]` over a cached stencil.
    fn gather_field(&self, base: [usize; 3], fractions: &[f64], field: &VectorMesh,
                    slot: MeshSlot) -> DVec3;

    /// `sum_c derivatives[c] * energy[c]` over a cached stencil.
    fn gather_energy_gradient(&self, base: [usize; 3], derivatives: &[DVec3],
                              energy: &ComplexMesh, slot: MeshSlot) -> DVec3;

    /// `sum_c w_c * mesh[c]` with the weights recomputed from the table.
    fn gather_scalar(&self, stencil: &Stencil, table: &InterpolationTable,
                     mesh: &ComplexMesh, slot: MeshSlot) -> f64;
}

/// Kernel for a stencil width fixed at compile time, so every loop bound
/// below is a constant.
#[derive(Debug, Clone, Copy, Default)]
pub struct Cao<const N: usize>;

impl<const N: usize> Cao<N> {
    #[inline(always)]
    fn wrapped(base: usize, mesh: usize) -> [usize; N] {
        std::array::from_fn(|i| wrap_mesh_index((base + i) as isize, mesh))
    }

    #[inline(always)]
    fn row(rows: &[f64]) -> [f64; N] {
        std::array::from_fn(|i| rows[i])
    }

    #[inline(always)]
    fn axes(base: [usize; 3], mesh: usize) -> ([usize; N], [usize; N], [usize; N]) {
        (Self::wrapped(base[0], mesh), Self::wrapped(base[1], mesh), Self::wrapped(base[2], mesh))
    }
}

impl<const N: usize> AssignmentKernel for Cao<N> {
    fn order(&self) -> usize {
        N
    }

    #[inline]
    fn spread_particle(&self, stencil: &Stencil, charge: f64, table: &InterpolationTable,
                       mesh: &mut ComplexMesh, slot: MeshSlot,
                       mut fractions: Option<&mut [f64]>) {
        debug_assert_eq!(table.order(), N);
        let (ix, iy, iz) = Self::axes(stencil.base, mesh.mesh());
        let tx = Self::row(table.weights(stencil.sample[0]));
        let ty = Self::row(table.weights(stencil.sample[1]));
        let tz = Self::row(table.weights(stencil.sample[2]));

        let mut c = 0;
        for i0 in 0..N {
            let w0 = charge * tx[i0];
            for i1 in 0..N {
                let w01 = w0 * ty[i1];
                for i2 in 0..N {
                    let w = w01 * tz[i2];
                    mesh.add(ix[i0], iy[i1], iz[i2], slot, w);
                    if let Some(f) = fractions.as_deref_mut() {
                        f[c] = w;
                    }
                    c += 1;
                }
            }
        }
    }

    #[inline]
    fn derivative_weights(&self, stencil: &Stencil, scale: f64, table: &InterpolationTable,
                          out: &mut [DVec3]) -> Result<()> {
        let d = |s| table.derivatives(s).map(Self::row).ok_or(AssignError::DerivativesUnavailable);
        let (dx, dy, dz) = (d(stencil.sample[0])?, d(stencil.sample[1])?, d(stencil.sample[2])?);
        let tx = Self::row(table.weights(stencil.sample[0]));
        let ty = Self::row(table.weights(stencil.sample[1]));
        let tz = Self::row(table.weights(stencil.sample[2]));

        let mut c = 0;
        for i0 in 0..N {
            for i1 in 0..N {
                for i2 in 0..N {
                    out[c] = DVec3::new(dx[i0] * ty[i1] * tz[i2],
                                        tx[i0] * dy[i1] * tz[i2],
                                        tx[i0] * ty[i1] * dz[i2]) * scale;
                    c += 1;
                }
            }
        }
        Ok(())
    }

    #[inline]
    fn gather_field(&self, base: [usize; 3], fractions: &[f64], field: &VectorMesh,
                    slot: MeshSlot) -> DVec3 {
        let (ix, iy, iz) = Self::axes(base, field.mesh());
        let mut acc = DVec3::ZERO;
        let mut c = 0;
        for x0 in ix {
            for x1 in iy {
                for x2 in iz {
                    acc += field.get(x0, x1, x2, slot) * fractions[c];
                    c += 1;
                }
            }
        }
        acc
    }

    #[inline]
    fn gather_energy_gradient(&self, base: [usize; 3], derivatives: &[DVec3],
                              energy: &ComplexMesh, slot: MeshSlot) -> DVec3 {
        let (ix, iy, iz) = Self::axes(base, energy.mesh());
        let mut acc = DVec3::ZERO;
        let mut c = 0;
        for x0 in ix {
            for x1 in iy {
                for x2 in iz {
                    acc += derivatives[c] * energy.get(x0, x1, x2, slot);
                    c += 1;
                }
            }
        }
        acc
    }

    #[inline]
    fn gather_scalar(&self, stencil: &Stencil, table: &InterpolationTable,
                     mesh: &ComplexMesh, slot: MeshSlot) -> f64 {
        let (ix, iy, iz) = Self::axes(stencil.base, mesh.mesh());
        let tx = Self::row(table.weights(stencil.sample[0]));
        let ty = Self::row(table.weights(stencil.sample[1]));
        let tz = Self::row(table.weights(stencil.sample[2]));

        let mut acc = 0.0;
        for i0 in 0..N {
            for i1 in 0..N {
                for i2 in 0..N {
                    acc += tx[i0] * ty[i1] * tz[i2] * mesh.get(ix[i0], iy[i1], iz[i2], slot);
                }
            }
        }
        acc
    }
}

/// Runtime-order kernel walking the stencil as one flat index.
///
/// Slower than `Cao<N>` but written independently of it; both evaluate the
/// same products in the same order, so their results agree bit for bit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GenericKernel {
    order: usize,
}

impl GenericKernel {
    pub fn new(order: usize) -> Result<Self> {
        if !(MIN_ORDER..=MAX_ORDER).contains(&order) {
            return Err(AssignError::UnsupportedOrder(order));
        }
        Ok(Self { order })
    }

    #[inline]
    fn split(&self, c: usize) -> [usize; 3] {
        let n = self.order;
        [c / (n * n), (c / n) % n, c % n]
    }

    #[inline]
    fn cell(&self, base: [usize; 3], local: [usize; 3], mesh: usize) -> [usize; 3] {
        std::array::from_fn(|d| wrap_mesh_index((base[d] + local[d]) as isize, mesh))
    }

    fn stencil_size(&self) -> usize {
        self.order * self.order * self.order
    }
}

impl AssignmentKernel for GenericKernel {
    fn order(&self) -> usize {
        self.order
    }

    fn spread_particle(&self, stencil: &Stencil, charge: f64, table: &InterpolationTable,
                       mesh: &mut ComplexMesh, slot: MeshSlot,
                       mut fractions: Option<&mut [f64]>) {
        debug_assert_eq!(table.order(), self.order);
        let [sx, sy, sz] = stencil.sample;
        let m = mesh.mesh();
        for c in 0..self.stencil_size() {
            let [i0, i1, i2] = self.split(c);
            let w = charge * table.weight(sx, i0) * table.weight(sy, i1) * table.weight(sz, i2);
            let [x0, x1, x2] = self.cell(stencil.base, [i0, i1, i2], m);
            mesh.add(x0, x1, x2, slot, w);
            if let Some(f) = fractions.as_deref_mut() {
                f[c] = w;
            }
        }
    }

    fn derivative_weights(&self, stencil: &Stencil, scale: f64, table: &InterpolationTable,
                          out: &mut [DVec3]) -> Result<()> {
        let [sx, sy, sz] = stencil.sample;
        let (Some(dx), Some(dy), Some(dz)) =
            (table.derivatives(sx), table.derivatives(sy), table.derivatives(sz))
        else {
            return Err(AssignError::DerivativesUnavailable);
        };
        let (tx, ty, tz) = (table.weights(sx), table.weights(sy), table.weights(sz));
        for (c, d) in out.iter_mut().enumerate().take(self.stencil_size()) {
            let [i0, i1, i2] = self.split(c);
            *d = DVec3::new(dx[i0] * ty[i1] * tz[i2],
                            tx[i0] * dy[i1] * tz[i2],
                            tx[i0] * ty[i1] * dz[i2]) * scale;
        }
        Ok(())
    }

    fn gather_field(&self, base: [usize; 3], fractions: &[f64], field: &VectorMesh,
                    slot: MeshSlot) -> DVec3 {
        let m = field.mesh();
        let mut acc = DVec3::ZERO;
        for c in 0..self.stencil_size() {
            let [x0, x1, x2] = self.cell(base, self.split(c), m);
            acc += field.get(x0, x1, x2, slot) * fractions[c];
        }
        acc
    }

    fn gather_energy_gradient(&self, base: [usize; 3], derivatives: &[DVec3],
                              energy: &ComplexMesh, slot: MeshSlot) -> DVec3 {
        let m = energy.mesh();
        let mut acc = DVec3::ZERO;
        for c in 0..self.stencil_size() {
            let [x0, x1, x2] = self.cell(base, self.split(c), m);
            acc += derivatives[c] * energy.get(x0, x1, x2, slot);
        }
        acc
    }

    fn gather_scalar(&self, stencil: &Stencil, table: &InterpolationTable,
                     mesh: &ComplexMesh, slot: MeshSlot) -> f64 {
        let [sx, sy, sz] = stencil.sample;
        let m = mesh.mesh();
        let mut acc = 0.0;
        for c in 0..self.stencil_size() {
            let [i0, i1, i2] = self.split(c);
            let [x0, x1, x2] = self.cell(stencil.base, [i0, i1, i2], m);
            acc += table.weight(sx, i0) * table.weight(sy, i1) * table.weight(sz, i2)
                * mesh.get(x0, x1, x2, slot);
        }
        acc
    }
}

/// Specialised kernel for `order`, chosen once and reused for every pass.
pub fn kernel_for(order: usize) -> Result<&'static dyn AssignmentKernel> {
    let kernel: &'static dyn AssignmentKernel = match order {
        1 => &Cao::<1>,
        2 => &Cao::<2>,
        3 => &Cao::<3>,
        4 => &Cao::<4>,
        5 => &Cao::<5>,
        6 => &Cao::<6>,
        7 => &Cao::<7>,
        _ => return Err(AssignError::UnsupportedOrder(order)),
    };
    Ok(kernel)
}

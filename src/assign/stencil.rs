use glam::DVec3;

use crate::interpolation::InterpolationTable;
use crate::mesh_3d::{wrap_mesh_index, MeshGeometry};

/// Read-only state shared by every particle of one pass.
#[derive(Debug, Clone, Copy)]
pub struct StencilContext<'a> {
    pub geometry: &'a MeshGeometry,
    pub table: &'a InterpolationTable,
    /// 0 for the primary mesh, 0.5 cells for the interlaced one.
    pub shift: f64,
}

/// Where one particle's stencil starts and which table rows it uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Stencil {
    pub base: [usize; 3],
    pub sample: [usize; 3],
}

/// Locates the stencil of a particle at `position` for the given order.
///
/// In mesh units `pos = x / h - (order - 1) / 2 + shift`; the nearest mesh
/// point `floor(pos + 0.5)` is the first stencil cell and the remainder picks
/// the table row. Ties at cell boundaries go up, there is no special case.
#[inline]
pub fn locate(position: DVec3, order: usize, ctx: &StencilContext) -> Stencil {
    debug_assert!(position.cmpge(DVec3::ZERO).all()
                  && position.cmplt(DVec3::splat(ctx.geometry.box_length())).all(),
                  "particle at {position} outside the box");
    let pos_shift = 0.5 * (order - 1) as f64;
    let mesh = ctx.geometry.mesh();
    let hi = ctx.geometry.mesh_per_length();

    let mut base = [0; 3];
    let mut sample = [0; 3];
    for dim in 0..3 {
        let pos = position[dim] * hi - pos_shift + ctx.shift;
        let nmp = (pos + 0.5).floor();
        base[dim] = wrap_mesh_index(nmp as isize, mesh);
        sample[dim] = ctx.table.sample_index(pos - nmp + 0.5);
    }
    Stencil { base, sample }
}

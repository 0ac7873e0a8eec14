use crate::error::{AssignError, Result};
use crate::interpolation::InterpolationTable;
use crate::mesh_3d::{ComplexMesh, MeshGeometry, MeshSlot};
use crate::particles::ParticleSystem;
use super::cache::AssignmentCache;
use super::kernel::AssignmentKernel;
use super::stencil::StencilContext;

/// Everything one assignment or gather pass needs besides the particles and
/// the mesh: kernel, geometry, table, half-cell shift, slot, threading.
#[derive(Debug, Clone, Copy)]
pub struct MeshPass<'a> {
    kernel: &'a dyn AssignmentKernel,
    geometry: &'a MeshGeometry,
    table: &'a InterpolationTable,
    shift: f64,
    slot: MeshSlot,
    parallel: bool,
}

impl<'a> MeshPass<'a> {
    /// Serial pass on the real slot with no shift. Fails if the table was
    /// built for another order or the mesh is narrower than the stencil.
    pub fn new(kernel: &'a dyn AssignmentKernel, geometry: &'a MeshGeometry,
               table: &'a InterpolationTable) -> Result<Self> {
        let order = kernel.order();
        if table.order() != order {
            return Err(AssignError::TableMismatch { table_order: table.order(), order });
        }
        if geometry.mesh() < order {
            return Err(AssignError::invalid_mesh(
                geometry.mesh(), format!("needs at least {order} cells for order {order} stencils")));
        }
        Ok(Self { kernel, geometry, table, shift: 0.0, slot: MeshSlot::Real, parallel: false })
    }

    pub fn with_shift(mut self, shift: f64) -> Self {
        self.shift = shift;
        self
    }

    pub fn with_slot(mut self, slot: MeshSlot) -> Self {
        self.slot = slot;
        self
    }

    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    pub fn kernel(&self) -> &'a dyn AssignmentKernel {
        self.kernel
    }

    pub fn geometry(&self) -> &'a MeshGeometry {
        self.geometry
    }

    pub fn table(&self) -> &'a InterpolationTable {
        self.table
    }

    pub fn order(&self) -> usize {
        self.kernel.order()
    }

    pub fn shift(&self) -> f64 {
        self.shift
    }

    pub fn slot(&self) -> MeshSlot {
        self.slot
    }

    pub fn parallel(&self) -> bool {
        self.parallel
    }

    pub(crate) fn stencil_context(&self) -> StencilContext<'a> {
        StencilContext { geometry: self.geometry, table: self.table, shift: self.shift }
    }

    pub(crate) fn check_inputs(&self, particles: &ParticleSystem, mesh: &ComplexMesh) -> Result<()> {
        self.geometry.check_mesh(mesh)?;
        if particles.box_length() != self.geometry.box_length() {
            return Err(AssignError::BoxLengthMismatch { particles: particles.box_length(),
                                                        mesh: self.geometry.box_length() });
        }
        Ok(())
    }

    /// Reading a cache at another stencil width would silently scramble the
    /// per-cell weights, so this is fatal.
    pub(crate) fn assert_cache_order(&self, cache: &AssignmentCache) {
        assert_eq!(cache.order(), self.order(),
                   "assignment cache filled at order {} used with order {}",
                   cache.order(), self.order());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assign::kernel_for;

    #[test]
    fn rejects_mismatched_table_and_narrow_mesh() {
        let table = InterpolationTable::with_resolution(3, false, 8).unwrap();
        let geometry = MeshGeometry::init(8, 1.0).unwrap();
        assert_eq!(MeshPass::new(kernel_for(4).unwrap(), &geometry, &table).unwrap_err(),
                   AssignError::TableMismatch { table_order: 3, order: 4 });

        let narrow = MeshGeometry::init(2, 1.0).unwrap();
        assert!(matches!(MeshPass::new(kernel_for(3).unwrap(), &narrow, &table),
                         Err(AssignError::InvalidMesh { mesh: 2, .. })));
    }

    #[test]
    fn builder_sets_shift_and_slot() {
        let table = InterpolationTable::with_resolution(2, false, 8).unwrap();
        let geometry = MeshGeometry::init(4, 1.0).unwrap();
        let pass = MeshPass::new(kernel_for(2).unwrap(), &geometry, &table).unwrap()
            .with_shift(0.5)
            .with_slot(MeshSlot::Imaginary)
            .with_parallel(true);
        assert_eq!(pass.shift(), 0.5);
        assert_eq!(pass.slot(), MeshSlot::Imaginary);
        assert!(pass.parallel());
        assert_eq!(pass.order(), 2);
    }
}

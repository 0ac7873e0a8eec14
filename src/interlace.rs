//! Interlaced assignment: two meshes shifted by half a cell, each assigned,
//! solved and gathered on its own, with both force contributions weighted by
//! one half.

use std::sync::Arc;

use glam::DVec3;
use serde::{Deserialize, Serialize};

use crate::assign::{assign_charges, assign_charges_and_derivatives, gather_energy_forces,
                    gather_field_forces, kernel_for, AssignmentCache, AssignmentKernel, MeshPass};
use crate::config::AssignConfig;
use crate::error::{AssignError, Result};
use crate::interpolation::InterpolationTable;
use crate::mesh_3d::{ComplexMesh, MeshGeometry, MeshSlot, VectorMesh};
use crate::particles::ParticleSystem;

static SUB_MESHES: [SubMesh; 2] = [SubMesh::Primary, SubMesh::Secondary];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SubMesh {
    Primary,
    /// Shifted by half a cell on every axis.
    Secondary,
}

impl SubMesh {
    /// Shift added to particle positions in mesh units.
    pub fn shift(self) -> f64 {
        match self {
            SubMesh::Primary => 0.0,
            SubMesh::Secondary => 0.5,
        }
    }

    pub fn next(self) -> Option<SubMesh> {
        match self {
            SubMesh::Primary => Some(SubMesh::Secondary),
            SubMesh::Secondary => None,
        }
    }

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn name(self) -> &'static str {
        match self {
            SubMesh::Primary => "primary",
            SubMesh::Secondary => "secondary",
        }
    }
}

/// Where the secondary sub-mesh lives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum InterlaceLayout {
    /// One complex mesh per sub-mesh, both using the real slot.
    #[default]
    Separate,
    /// A single complex mesh: primary in the real slot, secondary in the
    /// imaginary one, so one complex FFT transforms both.
    Packed,
}

/// The reciprocal-space collaborator: FFT, influence function and back
/// transform. Implementations read and write only the given slot.
pub trait MeshSolver {
    /// Computes the field of the charge held in `slot` of `charge` into the
    /// same slot of `field`.
    fn solve_field(&mut self, sub: SubMesh, slot: MeshSlot, charge: &ComplexMesh,
                   field: &mut VectorMesh);

    /// Replaces the charge held in `slot` of `mesh` by its energy density.
    fn solve_energy(&mut self, sub: SubMesh, slot: MeshSlot, mesh: &mut ComplexMesh);
}

/// Owns everything that stays fixed for a run: configuration, geometry, the
/// order's kernel, the shared table, one cache per sub-mesh and the work
/// meshes used by [`ChargeAssigner::step`].
#[derive(Debug)]
pub struct ChargeAssigner {
    config: AssignConfig,
    geometry: MeshGeometry,
    kernel: &'static dyn AssignmentKernel,
    table: Arc<InterpolationTable>,
    caches: [AssignmentCache; 2],
    assigned: [bool; 2],
    meshes: Vec<ComplexMesh>,
    field: Option<VectorMesh>,
}

impl ChargeAssigner {
    /// Validates `config` and picks up the process-wide table for its order.
    pub fn new(config: AssignConfig) -> Result<Self> {
        config.validate()?;
        let table = InterpolationTable::shared_with_resolution(config.order, config.derivatives,
                                                               config.max_interpol)?;
        Self::with_table(config, table)
    }

    /// Uses a table supplied by the caller, e.g. a tuning context.
    pub fn with_table(config: AssignConfig, table: Arc<InterpolationTable>) -> Result<Self> {
        let geometry = config.validate()?;
        if table.order() != config.order {
            return Err(AssignError::TableMismatch { table_order: table.order(),
                                                    order: config.order });
        }
        if config.derivatives && !table.has_derivatives() {
            return Err(AssignError::DerivativesUnavailable);
        }
        let kernel = kernel_for(config.order)?;

        log::info!("charge assigner: order {}, mesh {}^3, box {}, interlaced {} ({:?}), {} forces",
                   config.order, config.mesh, config.box_length, config.interlaced, config.layout,
                   if config.derivatives { "analytic-derivative" } else { "field-gather" });

        let mesh_count = if config.interlaced && config.layout == InterlaceLayout::Separate { 2 } else { 1 };
        let meshes = (0..mesh_count).map(|_| ComplexMesh::init(config.mesh)).collect();
        Ok(Self {
            caches: [AssignmentCache::new(config.order), AssignmentCache::new(config.order)],
            assigned: [false; 2],
            meshes,
            field: None,
            geometry,
            kernel,
            table,
            config,
        })
    }

    pub fn config(&self) -> &AssignConfig {
        &self.config
    }

    pub fn geometry(&self) -> &MeshGeometry {
        &self.geometry
    }

    pub fn table(&self) -> &Arc<InterpolationTable> {
        &self.table
    }

    /// Sub-meshes visited by one step, in order.
    pub fn sub_meshes(&self) -> &'static [SubMesh] {
        if self.config.interlaced { &SUB_MESHES } else { &SUB_MESHES[..1] }
    }

    /// Slot a sub-mesh's charge is written to and its results are read from.
    pub fn slot(&self, sub: SubMesh) -> MeshSlot {
        match (self.config.layout, sub) {
            (InterlaceLayout::Packed, SubMesh::Secondary) => MeshSlot::Imaginary,
            _ => MeshSlot::Real,
        }
    }

    /// Complex meshes one step needs: two for separate interlacing, else one.
    pub fn mesh_count(&self) -> usize {
        self.meshes.len()
    }

    /// Index into [`charge_meshes`](Self::charge_meshes) holding `sub`.
    pub fn mesh_index(&self, sub: SubMesh) -> usize {
        match self.config.layout {
            InterlaceLayout::Packed => 0,
            InterlaceLayout::Separate => sub.index(),
        }
    }

    pub fn new_mesh(&self) -> ComplexMesh {
        ComplexMesh::init(self.config.mesh)
    }

    /// Work meshes of the last [`step`](Self::step). After a field-gather step
    /// they still hold the assigned charge; analytic-derivative steps leave
    /// the solver output in them.
    pub fn charge_meshes(&self) -> &[ComplexMesh] {
        &self.meshes
    }

    pub fn cache(&self, sub: SubMesh) -> &AssignmentCache {
        &self.caches[sub.index()]
    }

    /// Contribution weight of each sub-mesh.
    pub fn sub_mesh_weight(&self) -> f64 {
        if self.config.interlaced { 0.5 } else { 1.0 }
    }

    fn check_sub(&self, sub: SubMesh) -> Result<()> {
        if sub == SubMesh::Secondary && !self.config.interlaced {
            return Err(AssignError::InterlacingDisabled);
        }
        Ok(())
    }

    fn check_assigned(&self, sub: SubMesh) -> Result<()> {
        self.check_sub(sub)?;
        if !self.assigned[sub.index()] {
            return Err(AssignError::MissingAssignment(sub));
        }
        Ok(())
    }

    fn pass<'a>(config: &AssignConfig, kernel: &'a dyn AssignmentKernel, geometry: &'a MeshGeometry,
                table: &'a InterpolationTable, sub: SubMesh, slot: MeshSlot) -> Result<MeshPass<'a>> {
        Ok(MeshPass::new(kernel, geometry, table)?
            .with_shift(sub.shift())
            .with_slot(slot)
            .with_parallel(config.parallel))
    }

    /// Assigns the charges for `sub` into `mesh`, filling that sub-mesh's
    /// cache. The sub-mesh's slot is zeroed first; for the separate layout
    /// and the primary sub-mesh that means the whole mesh.
    pub fn assign(&mut self, particles: &ParticleSystem, sub: SubMesh,
                  mesh: &mut ComplexMesh) -> Result<()> {
        self.check_sub(sub)?;
        let slot = self.slot(sub);
        let Self { config, kernel, geometry, table, caches, assigned, .. } = self;
        let pass = Self::pass(config, *kernel, geometry, table, sub, slot)?;
        geometry.check_mesh(mesh)?;

        if slot == MeshSlot::Imaginary {
            mesh.zero_slot(slot);
        } else {
            mesh.zero();
        }
        assigned[sub.index()] = false;
        let cache = &mut caches[sub.index()];
        if config.derivatives {
            assign_charges_and_derivatives(&pass, particles, mesh, cache)?;
        } else {
            assign_charges(&pass, particles, mesh, cache)?;
        }
        assigned[sub.index()] = true;
        Ok(())
    }

    /// Gathers `field` (the solver output for `sub`) onto the particles.
    pub fn back_interpolate_field(&self, sub: SubMesh, field: &VectorMesh, prefactor: f64,
                                  forces: &mut [DVec3]) -> Result<()> {
        self.check_assigned(sub)?;
        let pass = Self::pass(&self.config, self.kernel, &self.geometry, &self.table, sub,
                              self.slot(sub))?;
        gather_field_forces(&pass, self.cache(sub), field, prefactor, self.sub_mesh_weight(), forces)
    }

    /// Gathers the energy density for `sub` through the cached derivative
    /// weights.
    pub fn back_interpolate_energy(&self, sub: SubMesh, energy: &ComplexMesh, prefactor: f64,
                                   forces: &mut [DVec3]) -> Result<()> {
        self.check_assigned(sub)?;
        let pass = Self::pass(&self.config, self.kernel, &self.geometry, &self.table, sub,
                              self.slot(sub))?;
        gather_energy_forces(&pass, self.cache(sub), energy, prefactor, self.sub_mesh_weight(),
                             forces)
    }

    /// One full mesh step: assign every sub-mesh, hand each to `solver`, and
    /// accumulate the weighted forces into `forces`.
    pub fn step<S: MeshSolver + ?Sized>(&mut self, particles: &ParticleSystem, solver: &mut S,
                                        prefactor: f64, forces: &mut [DVec3]) -> Result<()> {
        if forces.len() != particles.len() {
            return Err(AssignError::ForceBufferLength { got: forces.len(),
                                                        expected: particles.len() });
        }
        self.assigned = [false; 2];
        let mut meshes = std::mem::take(&mut self.meshes);
        let result = self.run_step(particles, solver, prefactor, forces, &mut meshes);
        self.meshes = meshes;
        result
    }

    fn run_step<S: MeshSolver + ?Sized>(&mut self, particles: &ParticleSystem, solver: &mut S,
                                        prefactor: f64, forces: &mut [DVec3],
                                        meshes: &mut [ComplexMesh]) -> Result<()> {
        let subs = self.sub_meshes();
        for &sub in subs {
            self.assign(particles, sub, &mut meshes[self.mesh_index(sub)])?;
        }

        if self.config.derivatives {
            for &sub in subs {
                let mesh = &mut meshes[self.mesh_index(sub)];
                solver.solve_energy(sub, self.slot(sub), mesh);
                self.back_interpolate_energy(sub, mesh, prefactor, forces)?;
            }
            return Ok(());
        }

        let mut field = self.field.take().unwrap_or_else(|| VectorMesh::init(self.config.mesh));
        let mut result = Ok(());
        for &sub in subs {
            solver.solve_field(sub, self.slot(sub), &meshes[self.mesh_index(sub)], &mut field);
            result = self.back_interpolate_field(sub, &field, prefactor, forces);
            if result.is_err() {
                break;
            }
        }
        self.field = Some(field);
        result
    }
}

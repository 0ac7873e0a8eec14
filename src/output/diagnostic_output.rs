use anyhow::Result;
use glam::DVec3;
use serde::Serialize;
use std::fs::{File, OpenOptions};
use std::io::BufWriter;
use std::path::Path;

use crate::interlace::SubMesh;
use crate::mesh_3d::{ComplexMesh, MeshSlot};
use crate::particles::{net_force, ParticleSystem};

/// Charge bookkeeping of one assignment pass.
#[derive(Debug, Clone, PartialEq)]
pub struct PassDiagnostics {
    pub step: usize,
    pub sub_mesh: SubMesh,
    pub particles: usize,
    pub total_charge: f64,
    pub mesh_charge: f64,
    pub conservation_error: f64,
    pub max_cell: f64,
}

impl PassDiagnostics {
    /// Compares the charge in `slot` of a freshly assigned mesh against the
    /// particles that were spread into it.
    pub fn measure(step: usize, sub_mesh: SubMesh, particles: &ParticleSystem,
                   mesh: &ComplexMesh, slot: MeshSlot) -> Self {
        let total_charge = particles.total_charge();
        let mesh_charge = mesh.sum(slot);
        Self { step, sub_mesh, particles: particles.len(), total_charge, mesh_charge,
               conservation_error: (mesh_charge - total_charge).abs(),
               max_cell: mesh.max_abs(slot) }
    }
}

/// Force totals after one full step.
#[derive(Debug, Clone, PartialEq)]
pub struct ForceDiagnostics {
    pub step: usize,
    pub net_force: DVec3,
    pub max_force: f64,
}

impl ForceDiagnostics {
    pub fn measure(step: usize, forces: &[DVec3]) -> Self {
        let max_force = forces.iter().fold(0.0, |acc: f64, f| acc.max(f.length()));
        Self { step, net_force: net_force(forces), max_force }
    }
}

#[derive(Debug, Serialize)]
struct PassRow<'a> {
    pub step: usize,
    pub sub_mesh: &'a str,
    pub particles: usize,
    pub total_charge: f64,
    pub mesh_charge: f64,
    pub conservation_error: f64,
    pub max_cell: f64,
}

#[derive(Debug, Serialize)]
struct ForceRow {
    pub step: usize,
    pub net_force_x: f64,
    pub net_force_y: f64,
    pub net_force_z: f64,
    pub max_force: f64,
}

/// Writes `passes.csv` and `forces.csv` into an output directory.
pub struct AssignmentLogger {
    pass_wtr: csv::Writer<BufWriter<File>>,
    force_wtr: csv::Writer<BufWriter<File>>,
    flush_every: usize,
}

impl AssignmentLogger {
    pub fn new(out_dir: impl AsRef<Path>) -> Result<Self> {
        std::fs::create_dir_all(out_dir.as_ref())?;

        let open = |name: &str| -> Result<csv::Writer<BufWriter<File>>> {
            let file = OpenOptions::new()
                .create(true)
                .truncate(true)
                .write(true)
                .open(out_dir.as_ref().join(name))?;
            Ok(csv::WriterBuilder::new()
                .has_headers(true)
                .from_writer(BufWriter::new(file)))
        };

        Ok(Self { pass_wtr: open("passes.csv")?, force_wtr: open("forces.csv")?,
                  flush_every: 100 })
    }

    pub fn log_pass(&mut self, d: &PassDiagnostics) -> Result<()> {
        self.pass_wtr.serialize(PassRow {
            step: d.step,
            sub_mesh: d.sub_mesh.name(),
            particles: d.particles,
            total_charge: d.total_charge,
            mesh_charge: d.mesh_charge,
            conservation_error: d.conservation_error,
            max_cell: d.max_cell,
        })?;
        if d.step % self.flush_every == 0 {
            self.pass_wtr.flush()?;
        }
        Ok(())
    }

    pub fn log_forces(&mut self, d: &ForceDiagnostics) -> Result<()> {
        self.force_wtr.serialize(ForceRow {
            step: d.step,
            net_force_x: d.net_force.x,
            net_force_y: d.net_force.y,
            net_force_z: d.net_force.z,
            max_force: d.max_force,
        })?;
        if d.step % self.flush_every == 0 {
            self.force_wtr.flush()?;
        }
        Ok(())
    }

    pub fn flush(&mut self) -> Result<()> {
        self.pass_wtr.flush()?;
        self.force_wtr.flush()?;
        Ok(())
    }
}

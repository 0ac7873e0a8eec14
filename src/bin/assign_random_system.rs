use anyhow::{Context, Result};
use glam::DVec3;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::f64::consts::TAU;
use std::fs::File;
use std::io::BufReader;
use std::path::PathBuf;

use p3m_charge_assign::constants::CONSERVATION_TOL;
use p3m_charge_assign::output::{AssignmentLogger, ForceDiagnostics, PassDiagnostics, WriteVti};
use p3m_charge_assign::particles::net_force;
use p3m_charge_assign::{AssignConfig, ChargeAssigner, ComplexMesh, MeshSlot, MeshSolver,
                        ParticleSystem, SubMesh, VectorMesh};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
struct DemoConfig {
    #[serde(flatten)]
    assign: AssignConfig,
    num_particles: usize,
    steps: usize,
    seed: u64,
    max_displacement: f64,
    prefactor: f64,
    vti_every: usize,
}

impl Default for DemoConfig {
    fn default() -> Self {
        Self {
            assign: AssignConfig { interlaced: true, ..AssignConfig::default() },
            num_particles: 10_000,
            steps: 20,
            seed: 42,
            max_displacement: 0.05,
            prefactor: 1.0,
            vti_every: 5,
        }
    }
}

/// Stands in for the k-space solver: a uniform external field in
/// field-gather mode, one cosine potential mode along x otherwise.
struct ProbeSolver {
    field: DVec3,
}

impl MeshSolver for ProbeSolver {
    fn solve_field(&mut self, _sub: SubMesh, slot: MeshSlot, _charge: &ComplexMesh,
                   field: &mut VectorMesh) {
        field.fill_slot(slot, self.field);
    }

    fn solve_energy(&mut self, _sub: SubMesh, slot: MeshSlot, mesh: &mut ComplexMesh) {
        let m = mesh.mesh();
        for i in 0..m {
            let phi = (TAU * i as f64 / m as f64).cos();
            for j in 0..m {
                for k in 0..m {
                    mesh.set(i, j, k, slot, phi);
                }
            }
        }
    }
}

fn load_config() -> Result<DemoConfig> {
    let Some(path) = std::env::args().nth(1) else {
        return Ok(DemoConfig::default());
    };
    let file = File::open(&path).with_context(|| format!("opening {path}"))?;
    let demo: DemoConfig = serde_json::from_reader(BufReader::new(file))
        .with_context(|| format!("parsing {path}"))?;
    Ok(demo)
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let demo = load_config()?;
    demo.assign.validate()?;
    anyhow::ensure!(demo.max_displacement >= 0.0, "max_displacement must not be negative");

    let root = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    let out_dir = root.join("output");
    let config_path = demo.assign.write_to_dir(&out_dir)?;
    log::info!("wrote {}", config_path.display());

    let mut rng = StdRng::seed_from_u64(demo.seed);
    let mut particles = ParticleSystem::init(demo.assign.box_length)?;
    particles.load_random_neutral(demo.num_particles, &mut rng);
    log::info!("loaded {} particles, total charge {:e}", particles.len(), particles.total_charge());

    let mut assigner = ChargeAssigner::new(demo.assign.clone())?;
    let mut solver = ProbeSolver { field: DVec3::new(0.0, 0.0, 1.0) };
    let mut logger = AssignmentLogger::new(out_dir.join("logs"))?;
    let write_vti = WriteVti;
    let vti_dir = out_dir.join("meshes");

    let mut charge_meshes: Vec<ComplexMesh> =
        (0..assigner.mesh_count()).map(|_| assigner.new_mesh()).collect();
    let mut forces = vec![DVec3::ZERO; particles.len()];
    let tol = CONSERVATION_TOL * particles.len().max(1) as f64;

    for step in 0..demo.steps {
        // assignment diagnostics on a copy of the charge, the step's own meshes
        // may be overwritten by the solver
        for &sub in assigner.sub_meshes() {
            let idx = assigner.mesh_index(sub);
            assigner.assign(&particles, sub, &mut charge_meshes[idx])?;
        }
        for &sub in assigner.sub_meshes() {
            let mesh = &charge_meshes[assigner.mesh_index(sub)];
            let d = PassDiagnostics::measure(step, sub, &particles, mesh, assigner.slot(sub));
            if d.conservation_error > tol {
                log::warn!("step {step}: {} mesh lost charge conservation ({:e})",
                           sub.name(), d.conservation_error);
            }
            logger.log_pass(&d)?;
        }

        forces.fill(DVec3::ZERO);
        assigner.step(&particles, &mut solver, demo.prefactor, &mut forces)?;
        logger.log_forces(&ForceDiagnostics::measure(step, &forces))?;

        if demo.vti_every > 0 && step % demo.vti_every == 0 {
            log::info!("step {step}: net force {}", net_force(&forces));
            let primary = &charge_meshes[assigner.mesh_index(SubMesh::Primary)];
            write_vti.write_mesh_to_vti(primary, assigner.slot(SubMesh::Primary),
                                        assigner.geometry(), "charge", step, &vti_dir)?;
        }

        let d = demo.max_displacement;
        let delta: Vec<DVec3> = (0..particles.len())
            .map(|_| if d > 0.0 {
                DVec3::new(rng.gen_range(-d..d), rng.gen_range(-d..d), rng.gen_range(-d..d))
            } else {
                DVec3::ZERO
            })
            .collect();
        particles.displace(&delta)?;
    }

    logger.flush()?;
    log::info!("done, outputs in {}", out_dir.display());
    Ok(())
}

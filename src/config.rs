use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::{Deserialize, Serialize};

use crate::constants::{MAX_INTERPOL, MAX_ORDER, MIN_ORDER};
use crate::error::{AssignError, Result};
use crate::interlace::InterlaceLayout;
use crate::mesh_3d::MeshGeometry;

/// Run-wide assignment settings. Fixed for the lifetime of a
/// [`ChargeAssigner`](crate::interlace::ChargeAssigner).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AssignConfig {
    pub order: usize,
    pub mesh: usize,
    pub box_length: f64,
    /// Second mesh shifted by half a cell, results averaged.
    pub interlaced: bool,
    pub layout: InterlaceLayout,
    /// Analytic-derivative forces instead of a gathered field.
    pub derivatives: bool,
    pub max_interpol: usize,
    pub parallel: bool,
}

impl Default for AssignConfig {
    fn default() -> Self {
        Self {
            order: 3,
            mesh: 32,
            box_length: 10.0,
            interlaced: false,
            layout: InterlaceLayout::Separate,
            derivatives: false,
            max_interpol: MAX_INTERPOL,
            parallel: false,
        }
    }
}

impl AssignConfig {
    /// Checks every field and returns the mesh geometry they describe.
    pub fn validate(&self) -> Result<MeshGeometry> {
        if !(MIN_ORDER..=MAX_ORDER).contains(&self.order) {
            return Err(AssignError::UnsupportedOrder(self.order));
        }
        let geometry = MeshGeometry::init(self.mesh, self.box_length)?;
        if self.mesh < self.order {
            return Err(AssignError::invalid_mesh(
                self.mesh, format!("needs at least {} cells for order {} stencils",
                                   self.order, self.order)));
        }
        if self.max_interpol == 0 {
            return Err(AssignError::InvalidTableResolution);
        }
        Ok(geometry)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let file = File::open(path)
            .with_context(|| format!("opening config {}", path.display()))?;
        let config: Self = serde_json::from_reader(BufReader::new(file))
            .with_context(|| format!("parsing config {}", path.display()))?;
        config.validate()?;
        Ok(config)
    }

    /// Writes `config.json` into `out_dir`, creating it if needed.
    pub fn write_to_dir(&self, out_dir: impl AsRef<Path>) -> anyhow::Result<PathBuf> {
        std::fs::create_dir_all(out_dir.as_ref())?;
        let path = out_dir.as_ref().join("config.json");
        let file = File::create(&path)?;
        serde_json::to_writer_pretty(BufWriter::new(file), self)?;
        Ok(path)
    }
}

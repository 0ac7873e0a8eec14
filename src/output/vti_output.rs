use std::path::{Path, PathBuf};
use vtkio::model::{Attribute, Attributes, ByteOrder, DataSet, Extent,
                   ImageDataPiece, Piece, Version, Vtk};

use crate::mesh_3d::{ComplexMesh, MeshGeometry, MeshSlot};

pub struct WriteVti;

impl WriteVti {
    /// Writes one slot of `mesh` as `<name>_<step>.vti` under `out_dir`.
    /// Mesh point `(i, j, k)` sits at `(i, j, k) * h`.
    pub fn write_mesh_to_vti(&self, mesh: &ComplexMesh, slot: MeshSlot,
                             geometry: &MeshGeometry, name: &str, step: usize,
                             out_dir: impl AsRef<Path>) -> anyhow::Result<PathBuf> {
        anyhow::ensure!(mesh.mesh() == geometry.mesh(),
                        "{name}: mesh has {} cells per axis, geometry {}",
                        mesh.mesh(), geometry.mesh());
        std::fs::create_dir_all(out_dir.as_ref())?;
        let path = out_dir.as_ref().join(format!("{name}_{step:09}.vti"));
        log::debug!("writing {}", path.display());

        // VTK point data runs x fastest, the mesh stores z fastest
        let m = mesh.mesh();
        let mut values = Vec::with_capacity(mesh.n_cells());
        for k in 0..m {
            for j in 0..m {
                for i in 0..m {
                    values.push(mesh.get(i, j, k, slot));
                }
            }
        }

        let mut attrs = Attributes::new();
        attrs.point.push(Attribute::scalars(name, 1).with_data(values));

        // inclusive ranges, 0..=m-1 holds m points
        let last = m as i32 - 1;
        let extent = Extent::Ranges([0..=last, 0..=last, 0..=last]);
        let piece = ImageDataPiece {
            extent: extent.clone(),
            data: attrs,
        };

        let h = geometry.spacing() as f32;
        let vtk = Vtk {
            version: Version::new((2, 3)),
            byte_order: ByteOrder::LittleEndian,
            title: format!("{name} mesh, step {step}"),
            file_path: None,
            data: DataSet::ImageData {
                extent,
                origin: [0.0; 3],
                spacing: [h; 3],
                meta: None,
                pieces: vec![Piece::Inline(Box::new(piece))],
            },
        };

        vtk.export(&path)?;
        Ok(path)
    }
}

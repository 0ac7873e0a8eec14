pub mod complex_mesh;
pub mod geometry;
pub mod wrap;

pub use complex_mesh::{ComplexMesh, MeshSlot, VectorMesh};
pub use geometry::MeshGeometry;
pub use wrap::wrap_mesh_index;

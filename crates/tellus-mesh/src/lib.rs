//! Mesh data model for the subdivision engine: flat triangle buffers,
//! the `Triangle` value type, vertex deduplication keys, and the packed
//! vertex format handed back to the host renderer.

mod buffers;
mod error;
mod surface_vertex;
mod triangle;
mod vertex_key;

pub use buffers::MeshBuffers;
pub use error::MeshError;
pub use surface_vertex::SurfaceVertex;
pub use triangle::Triangle;
pub use vertex_key::{VertexKey, VertexTable};

//! GPU-side scene data for the demo viewer.
//!
//! - Uniform and vertex layouts shared with the WGSL in `renderer::pipelines`.
//! - The per-frame point instance buffer.
//! - Uploaded meshes with their materials and textures.

pub mod mesh;
pub mod point_cloud;
pub mod types;

pub use self::mesh::{MeshGpu, PartGpu};
pub use self::point_cloud::PointCloudGpu;
pub use self::types::{LineVertex, MaterialUniform, MeshUniform, PointsUniform};

//! Episode data for the demo viewer.
//!
//! - Point-cloud frame sequences (`[x, y, z, r, g, b]` per point) with
//!   validation and colour normalisation.
//! - A synthetic sequence used before any data is loaded.
//! - The 6-DoF annotation pose and its rounded read-out.
//! - Wavefront OBJ/MTL parsing for the mesh view.

pub mod error;
pub mod frames;
pub mod mesh;
pub mod mock;
pub mod pose;

pub use crate::error::{DataError, Result};
pub use crate::frames::{ColoredPoint, FrameSequence, POINT_STRIDE};
pub use crate::mesh::{parse_mtl, parse_obj, Material, MaterialLibrary, MeshVertex, ObjModel};
pub use crate::mock::mock_sequence;
pub use crate::pose::{Pose, PoseReadout};

//! Backend requests, run off the render thread.
//!
//! The render thread posts [`Request`]s and drains [`Reply`]s once per
//! frame. Each request runs as its own task, so overlapping loads race and
//! the last reply to arrive wins.

mod client;
pub mod wire;

pub use self::client::Loader;

use episode::{FrameSequence, MaterialLibrary, ObjModel};
use std::collections::HashMap;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("HTTP error: {0}")]
    HttpStatus(u16),

    #[error("Server error: {0}")]
    Server(String),

    #[error("Unexpected JSON response when expecting file")]
    UnexpectedJson,

    #[error("{0}")]
    Transport(#[from] reqwest::Error),

    #[error("malformed response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error(transparent)]
    Data(#[from] episode::DataError),

    #[error("texture: {0}")]
    Image(#[from] image::ImageError),

    #[error("loader thread has stopped")]
    Disconnected,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Request {
    /// `/load_zarr`: a zarr directory or H5 file.
    LoadEpisodes { path: String, traj_id: usize },
    /// `/show_episode`: one episode of the last multi-episode load.
    ShowEpisode { episode_id: usize },
    /// `/load_mesh` for the OBJ, then its materials and textures.
    LoadMesh { path: String },
    /// `/save_gizmo_pose`.
    SavePose {
        /// `[x, y, z, qw, qx, qy, qz]`
        pose: [f32; 7],
        /// Frame index, or -1 for a mesh.
        frame: i64,
        scale: Option<f32>,
    },
}

/// What a zarr/H5 load produced.
#[derive(Debug)]
pub enum EpisodeSource {
    /// A single episode, ready to play.
    Frames(FrameSequence),
    /// A multi-episode file; pick one with [`Request::ShowEpisode`].
    Episodes { count: usize },
}

/// A decoded mesh with whatever companion files could be found.
#[derive(Debug)]
pub struct MeshAssets {
    pub model: ObjModel,
    pub materials: MaterialLibrary,
    /// Decoded textures keyed by their `map_Kd` path, resolved against the MTL.
    pub textures: HashMap<String, image::RgbaImage>,
}

#[derive(Debug)]
pub enum Reply {
    Episodes {
        path: String,
        result: Result<EpisodeSource, LoadError>,
    },
    Episode {
        episode_id: usize,
        result: Result<FrameSequence, LoadError>,
    },
    Mesh {
        path: String,
        result: Result<MeshAssets, LoadError>,
    },
    PoseSaved(Result<(), LoadError>),
}

//! Robot-episode viewer: animated point clouds and OBJ meshes with a 6-DoF
//! annotation gizmo, fed by an HTTP data backend.

pub mod annotation;
pub mod app;
pub mod camera;
pub mod config;
pub mod data;
pub mod gizmo;
pub mod net;
pub mod playback;
pub mod renderer;
pub mod scene;
pub mod session;
pub mod status;
pub mod ui;

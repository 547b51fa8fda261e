use clap::{Parser, ValueEnum};

/// What the viewer shows and which backend endpoints it talks to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum ViewerMode {
    /// Animated point-cloud episodes from zarr/H5 sources.
    Points,
    /// A single OBJ mesh with optional MTL materials and textures.
    Mesh,
}

impl std::fmt::Display for ViewerMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ViewerMode::Points => "points",
            ViewerMode::Mesh => "mesh",
        };

        f.write_str(s)
    }
}

/// `demo_viewer` - inspect recorded robot episodes and annotate 6-DoF poses.
#[derive(Parser, Debug, Clone)]
#[command(version, about, long_about = None)]
pub struct Config {
    /// Base URL of the data backend serving `/load_zarr`, `/load_mesh`, etc.
    #[arg(long, env = "DEMO_VIEWER_SERVER", default_value = "http://127.0.0.1:8000")]
    pub server: String,

    /// Point-cloud episodes or a single mesh.
    #[arg(long, env = "DEMO_VIEWER_MODE", value_enum, default_value_t = ViewerMode::Points)]
    pub mode: ViewerMode,

    /// Path (as seen by the backend) to load right after startup.
    #[arg(long, env = "DEMO_VIEWER_PATH")]
    pub path: Option<String>,

    /// Frames in the placeholder sequence shown before anything is loaded
    /// (0 starts with an empty scene).
    #[arg(long, default_value_t = 150)]
    pub mock_frames: usize,

    /// Points per placeholder frame.
    #[arg(long, default_value_t = 5000)]
    pub mock_points: usize,
}

impl Config {
    /// Size of the placeholder sequence, if one should be shown.
    pub fn placeholder_frames(&self) -> Option<(usize, usize)> {
        match self.mode {
            ViewerMode::Points if self.mock_frames > 0 => Some((self.mock_frames, self.mock_points)),
            _ => None,
        }
    }
}

pub mod lines;
pub mod mesh;
pub mod points;

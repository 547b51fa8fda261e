//! Wavefront OBJ/MTL sources and the path conventions used to find a
//! mesh's companion files on the backend.

mod mtl;
mod obj;

pub use self::mtl::{parse_mtl, Material, MaterialLibrary};
pub use self::obj::parse_obj;

/// Material file always looked up next to an OBJ.
pub const DEFAULT_MTL_NAME: &str = "material.mtl";

/// Interleaved vertex of a triangulated mesh part.
/// Must match the vertex layout of the mesh pipeline.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct MeshVertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub uv: [f32; 2],
}

/// A run of triangles sharing one material.
#[derive(Debug, Clone)]
pub struct ObjPart {
    pub material: Option<String>,
    /// Three vertices per triangle, not indexed.
    pub vertices: Vec<MeshVertex>,
}

#[derive(Debug, Clone)]
pub struct ObjObject {
    pub name: String,
    pub parts: Vec<ObjPart>,
}

#[derive(Debug, Clone, Default)]
pub struct ObjModel {
    pub objects: Vec<ObjObject>,
    /// `mtllib` file names in declaration order.
    pub material_libs: Vec<String>,
}

impl ObjModel {
    pub fn parts(&self) -> impl Iterator<Item = &ObjPart> {
        self.objects.iter().flat_map(|o| o.parts.iter())
    }

    pub fn triangle_count(&self) -> usize {
        self.parts().map(|p| p.vertices.len() / 3).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }
}

/// Directory part of a backend path (everything before the last `/`).
pub fn parent_dir(path: &str) -> &str {
    path.rfind('/').map_or("", |i| &path[..i])
}

/// Resolve `name` against the directory holding `path`. Absolute names are
/// returned unchanged.
pub fn sibling_path(path: &str, name: &str) -> String {
    if name.starts_with('/') {
        return name.to_owned();
    }
    match parent_dir(path) {
        "" if !path.starts_with('/') => name.to_owned(),
        dir => format!("{dir}/{name}"),
    }
}

/// Material files to try for an OBJ: its `mtllib` entries, then the
/// conventional `material.mtl` beside it.
pub fn material_candidates(obj_path: &str, model: &ObjModel) -> Vec<String> {
    let mut out: Vec<String> = model
        .material_libs
        .iter()
        .map(|lib| sibling_path(obj_path, lib))
        .collect();
    let fallback = sibling_path(obj_path, DEFAULT_MTL_NAME);
    if !out.contains(&fallback) {
        out.push(fallback);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sibling_resolution() {
        assert_eq!(sibling_path("/data/cup/model.obj", "material.mtl"), "/data/cup/material.mtl");
        assert_eq!(sibling_path("model.obj", "material.mtl"), "material.mtl");
        assert_eq!(sibling_path("/model.obj", "tex.png"), "/tex.png");
        assert_eq!(sibling_path("/a/b.obj", "/abs/tex.png"), "/abs/tex.png");
    }

    #[test]
    fn default_material_comes_last() {
        let model = ObjModel::default();
        assert_eq!(
            material_candidates("/d/m.obj", &model),
            vec!["/d/material.mtl".to_owned()]
        );

        let named = ObjModel {
            material_libs: vec!["a.mtl".into(), "b.mtl".into()],
            ..ObjModel::default()
        };
        assert_eq!(
            material_candidates("/d/m.obj", &named),
            vec![
                "/d/a.mtl".to_owned(),
                "/d/b.mtl".to_owned(),
                "/d/material.mtl".to_owned()
            ]
        );
    }

    #[test]
    fn default_material_is_not_tried_twice() {
        let model = ObjModel {
            material_libs: vec!["material.mtl".into(), "../mat/x.mtl".into()],
            ..ObjModel::default()
        };
        assert_eq!(
            material_candidates("/d/m.obj", &model),
            vec!["/d/material.mtl".to_owned(), "/d/../mat/x.mtl".to_owned()]
        );
    }
}

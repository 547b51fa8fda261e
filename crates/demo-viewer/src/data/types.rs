//! Plain-old-data layouts uploaded to the GPU.

use episode::Material;
use glam::Mat4;

/// Per-frame uniforms of the point pipeline.
/// Must match `PointsUniform` in `POINTS_WGSL`.
#[repr(C)]
#[derive(Clone, Copy, Debug, bytemuck::Pod, bytemuck::Zeroable)]
pub struct PointsUniform {
    pub view: Mat4,             // 64 B
    pub proj: Mat4,             // +64 -> 128
    /// Sprite edge length in world units.
    pub point_size: f32,        // +4
    pub _pad: [f32; 3],         // +12 -> 144
}

const _: [(); 144] = [(); core::mem::size_of::<PointsUniform>()];

impl PointsUniform {
    pub fn new(view: Mat4, proj: Mat4, point_size: f32) -> Self {
        Self {
            view,
            proj,
            point_size,
            _pad: [0.0; 3],
        }
    }
}

/// Per-frame uniforms of the mesh pipeline: camera, model transform and a
/// single ambient plus directional light.
#[repr(C)]
#[derive(Clone, Copy, Debug, bytemuck::Pod, bytemuck::Zeroable)]
pub struct MeshUniform {
    pub view_proj: Mat4,        // 64 B
    pub model: Mat4,            // +64 -> 128
    /// Direction the light travels, world space.
    pub light_dir: [f32; 3],    // +12
    pub ambient: f32,           // +4 -> 144
}

const _: [(); 144] = [(); core::mem::size_of::<MeshUniform>()];

pub const AMBIENT_INTENSITY: f32 = 0.6;
pub const LIGHT_DIR: [f32; 3] = [-1.0, -1.0, -1.0];

impl MeshUniform {
    pub fn new(view_proj: Mat4, scale: f32) -> Self {
        Self {
            view_proj,
            model: Mat4::from_scale(glam::Vec3::splat(scale)),
            light_dir: LIGHT_DIR,
            ambient: AMBIENT_INTENSITY,
        }
    }
}

/// Per-part material block of the mesh pipeline.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct MaterialUniform {
    /// Diffuse rgb and opacity.
    pub diffuse: [f32; 4],
    /// Non-zero when the bound texture should be sampled.
    pub textured: u32,
    pub _pad: [u32; 3],
}

const _: [(); 32] = [(); core::mem::size_of::<MaterialUniform>()];

impl MaterialUniform {
    /// Parts without a material render light grey and untextured.
    pub const UNTEXTURED_GREY: Self = Self {
        diffuse: [0.8, 0.8, 0.8, 1.0],
        textured: 0,
        _pad: [0; 3],
    };

    pub fn from_material(material: &Material, has_texture: bool) -> Self {
        let [r, g, b] = material.diffuse;
        Self {
            diffuse: [r, g, b, material.opacity],
            textured: has_texture as u32,
            _pad: [0; 3],
        }
    }
}

/// Vertex of the line pipeline (axes helper and gizmo).
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct LineVertex {
    pub position: [f32; 3],
    pub color: [f32; 3],
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn material_uniform_carries_opacity_and_texture_flag() {
        let material = Material {
            name: "skin".into(),
            ambient: [0.0; 3],
            diffuse: [0.2, 0.4, 0.6],
            specular: [0.0; 3],
            shininess: 0.0,
            opacity: 0.5,
            diffuse_map: Some("skin.png".into()),
        };
        let u = MaterialUniform::from_material(&material, true);
        assert_eq!(u.diffuse, [0.2, 0.4, 0.6, 0.5]);
        assert_eq!(u.textured, 1);

        let u = MaterialUniform::from_material(&material, false);
        assert_eq!(u.textured, 0);
    }

    #[test]
    fn mesh_uniform_scales_uniformly() {
        let u = MeshUniform::new(Mat4::IDENTITY, 2.0);
        let p = u.model.transform_point3(glam::Vec3::new(1.0, -1.0, 0.5));
        assert_eq!(p, glam::Vec3::new(2.0, -2.0, 1.0));
    }
}

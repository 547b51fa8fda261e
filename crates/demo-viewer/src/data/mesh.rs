use crate::data::types::MaterialUniform;
use crate::net::MeshAssets;
use crate::renderer::pipelines::mesh::MeshPipeline;
use crate::scene::{Release, Released};
use episode::mesh::ObjPart;
use episode::MaterialLibrary;
use std::collections::HashMap;
use wgpu::util::DeviceExt;

/// One material run of the uploaded mesh.
#[derive(Debug)]
pub struct PartGpu {
    pub vtx: wgpu::Buffer,
    pub vertex_count: u32,
    pub material_ubo: wgpu::Buffer,
    pub bind: wgpu::BindGroup,
}

/// A mesh resident on the GPU. Freed through [`Release`].
#[derive(Debug)]
pub struct MeshGpu {
    pub parts: Vec<PartGpu>,
    textures: HashMap<String, wgpu::Texture>,
}

/// Material block for `part`, and the texture key it samples (if that
/// texture was loaded).
pub fn part_material<'a>(
    part: &ObjPart,
    materials: &'a MaterialLibrary,
    has_texture: impl Fn(&str) -> bool,
) -> (MaterialUniform, Option<&'a str>) {
    let Some(material) = part.material.as_deref().and_then(|name| materials.get(name)) else {
        return (MaterialUniform::UNTEXTURED_GREY, None);
    };
    let map = material.diffuse_map.as_deref().filter(|m| has_texture(m));
    (MaterialUniform::from_material(material, map.is_some()), map)
}

fn upload_texture(device: &wgpu::Device, queue: &wgpu::Queue, key: &str, img: &image::RgbaImage) -> wgpu::Texture {
    device.create_texture_with_data(
        queue,
        &wgpu::TextureDescriptor {
            label: Some(key),
            size: wgpu::Extent3d {
                width: img.width().max(1),
                height: img.height().max(1),
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::Rgba8UnormSrgb,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        },
        wgpu::util::TextureDataOrder::LayerMajor,
        img.as_raw(),
    )
}

impl MeshGpu {
    pub fn upload(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        pipeline: &MeshPipeline,
        assets: &MeshAssets,
    ) -> Self {
        let textures: HashMap<String, wgpu::Texture> = assets
            .textures
            .iter()
            .filter(|(_, img)| img.width() > 0 && img.height() > 0)
            .map(|(key, img)| (key.clone(), upload_texture(device, queue, key, img)))
            .collect();

        let parts = assets
            .model
            .parts()
            .filter(|p| !p.vertices.is_empty())
            .map(|part| {
                let (uniform, map) =
                    part_material(part, &assets.materials, |m| textures.contains_key(m));

                let vtx = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                    label: Some("Mesh Part VB"),
                    contents: bytemuck::cast_slice(&part.vertices),
                    usage: wgpu::BufferUsages::VERTEX,
                });
                let material_ubo = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                    label: Some("Mesh Material UBO"),
                    contents: bytemuck::bytes_of(&uniform),
                    usage: wgpu::BufferUsages::UNIFORM,
                });

                let view = map
                    .and_then(|m| textures.get(m))
                    .map(|t| t.create_view(&wgpu::TextureViewDescriptor::default()));
                let bind = pipeline.material_bind_group(device, &material_ubo, view.as_ref());

                PartGpu {
                    vtx,
                    vertex_count: part.vertices.len() as u32,
                    material_ubo,
                    bind,
                }
            })
            .collect::<Vec<_>>();

        log::info!(
            "Uploaded mesh: {} parts, {} textures",
            parts.len(),
            textures.len()
        );
        Self { parts, textures }
    }
}

impl Release for MeshGpu {
    fn release(self) -> Released {
        for part in &self.parts {
            part.vtx.destroy();
            part.material_ubo.destroy();
        }
        for texture in self.textures.values() {
            texture.destroy();
        }
        Released {
            geometries: self.parts.len(),
            materials: self.parts.len(),
            textures: self.textures.len(),
        }
    }
}

// Coloured line lists: the axes helper (depth-tested) and the gizmo handles
// (drawn over the scene).

use crate::data::LineVertex;
use crate::gizmo::Segment;
use glam::Mat4;
use wgpu::util::DeviceExt;

pub const AXES_LENGTH: f32 = 0.5;

/// Red X, green Y and blue Z from the origin.
pub fn axes_vertices(length: f32) -> [LineVertex; 6] {
    let mut out = [LineVertex {
        position: [0.0; 3],
        color: [0.0; 3],
    }; 6];
    for axis in 0..3 {
        let mut tip = [0.0; 3];
        tip[axis] = length;
        let mut color = [0.0; 3];
        color[axis] = 1.0;
        out[axis * 2] = LineVertex {
            position: [0.0; 3],
            color,
        };
        out[axis * 2 + 1] = LineVertex {
            position: tip,
            color,
        };
    }
    out
}

pub fn segment_vertices(segments: &[Segment]) -> Vec<LineVertex> {
    segments
        .iter()
        .flat_map(|s| {
            [
                LineVertex {
                    position: s.a.to_array(),
                    color: s.color,
                },
                LineVertex {
                    position: s.b.to_array(),
                    color: s.color,
                },
            ]
        })
        .collect()
}

pub struct LinesPipeline {
    depth_tested: wgpu::RenderPipeline,
    overlay: wgpu::RenderPipeline,
    bind_group: wgpu::BindGroup,
    uniform_buffer: wgpu::Buffer,
    axes_vb: wgpu::Buffer,
    overlay_vb: wgpu::Buffer,
    overlay_capacity: usize,
    overlay_len: u32,
}

fn create_overlay_buffer(device: &wgpu::Device, capacity: usize) -> wgpu::Buffer {
    device.create_buffer(&wgpu::BufferDescriptor {
        label: Some("Gizmo Lines VB"),
        size: (capacity * std::mem::size_of::<LineVertex>()) as u64,
        usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
        mapped_at_creation: false,
    })
}

impl LinesPipeline {
    pub fn new(
        device: &wgpu::Device,
        color_fmt: wgpu::TextureFormat,
        depth_fmt: wgpu::TextureFormat,
    ) -> Self {
        let uniform_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Lines Uniform Buffer"),
            size: std::mem::size_of::<Mat4>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Lines BGL"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            }],
        });

        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Lines Bind Group"),
            layout: &bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: uniform_buffer.as_entire_binding(),
            }],
        });

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Lines WGSL"),
            source: wgpu::ShaderSource::Wgsl(LINES_WGSL.into()),
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Lines Pipeline Layout"),
            bind_group_layouts: &[&bind_group_layout],
            push_constant_ranges: &[],
        });

        let make = |label: &str, depth_write: bool, compare: wgpu::CompareFunction| {
            device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
                label: Some(label),
                layout: Some(&pipeline_layout),
                vertex: wgpu::VertexState {
                    module: &shader,
                    entry_point: "vs_main",
                    buffers: &[wgpu::VertexBufferLayout {
                        array_stride: std::mem::size_of::<LineVertex>() as u64,
                        step_mode: wgpu::VertexStepMode::Vertex,
                        attributes: &wgpu::vertex_attr_array![0 => Float32x3, 1 => Float32x3],
                    }],
                    compilation_options: wgpu::PipelineCompilationOptions::default(),
                },
                fragment: Some(wgpu::FragmentState {
                    module: &shader,
                    entry_point: "fs_main",
                    targets: &[Some(wgpu::ColorTargetState {
                        format: color_fmt,
                        blend: None,
                        write_mask: wgpu::ColorWrites::ALL,
                    })],
                    compilation_options: wgpu::PipelineCompilationOptions::default(),
                }),
                primitive: wgpu::PrimitiveState {
                    topology: wgpu::PrimitiveTopology::LineList,
                    ..Default::default()
                },
                depth_stencil: Some(wgpu::DepthStencilState {
                    format: depth_fmt,
                    depth_write_enabled: depth_write,
                    depth_compare: compare,
                    stencil: wgpu::StencilState::default(),
                    bias: wgpu::DepthBiasState::default(),
                }),
                multisample: wgpu::MultisampleState::default(),
                multiview: None,
            })
        };

        let depth_tested = make("Axes Pipeline", true, wgpu::CompareFunction::LessEqual);
        let overlay = make("Gizmo Pipeline", false, wgpu::CompareFunction::Always);

        let axes_vb = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Axes VB"),
            contents: bytemuck::cast_slice(&axes_vertices(AXES_LENGTH)),
            usage: wgpu::BufferUsages::VERTEX,
        });

        let overlay_capacity = 512;
        Self {
            depth_tested,
            overlay,
            bind_group,
            uniform_buffer,
            axes_vb,
            overlay_vb: create_overlay_buffer(device, overlay_capacity),
            overlay_capacity,
            overlay_len: 0,
        }
    }

    /// Upload the camera and this frame's gizmo segments.
    pub fn prepare(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        view_proj: Mat4,
        segments: &[Segment],
    ) {
        queue.write_buffer(&self.uniform_buffer, 0, bytemuck::bytes_of(&view_proj));

        let vertices = segment_vertices(segments);
        if vertices.len() > self.overlay_capacity {
            self.overlay_capacity = vertices.len().next_power_of_two();
            self.overlay_vb.destroy();
            self.overlay_vb = create_overlay_buffer(device, self.overlay_capacity);
        }
        if !vertices.is_empty() {
            queue.write_buffer(&self.overlay_vb, 0, bytemuck::cast_slice(&vertices));
        }
        self.overlay_len = vertices.len() as u32;
    }

    pub fn draw_axes<'a>(&'a self, rpass: &mut wgpu::RenderPass<'a>) {
        rpass.set_pipeline(&self.depth_tested);
        rpass.set_bind_group(0, &self.bind_group, &[]);
        rpass.set_vertex_buffer(0, self.axes_vb.slice(..));
        rpass.draw(0..6, 0..1);
    }

    pub fn draw_overlay<'a>(&'a self, rpass: &mut wgpu::RenderPass<'a>) {
        if self.overlay_len == 0 {
            return;
        }
        rpass.set_pipeline(&self.overlay);
        rpass.set_bind_group(0, &self.bind_group, &[]);
        rpass.set_vertex_buffer(0, self.overlay_vb.slice(..));
        rpass.draw(0..self.overlay_len, 0..1);
    }
}

pub const LINES_WGSL: &str = r#"
@group(0) @binding(0) var<uniform> view_proj: mat4x4<f32>;

struct VSOut {
    @builtin(position) clip: vec4<f32>,
    @location(0) color: vec3<f32>,
}

@vertex
fn vs_main(@location(0) position: vec3<f32>, @location(1) color: vec3<f32>) -> VSOut {
    var out: VSOut;
    out.clip = view_proj * vec4<f32>(position, 1.0);
    out.color = color;
    return out;
}

@fragment
fn fs_main(in: VSOut) -> @location(0) vec4<f32> {
    return vec4<f32>(in.color, 1.0);
}
"#;

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;

    #[test]
    fn axes_are_rgb_along_xyz() {
        let v = axes_vertices(0.5);
        assert_eq!(v[1].position, [0.5, 0.0, 0.0]);
        assert_eq!(v[1].color, [1.0, 0.0, 0.0]);
        assert_eq!(v[3].position, [0.0, 0.5, 0.0]);
        assert_eq!(v[5].color, [0.0, 0.0, 1.0]);
        assert!(v.iter().step_by(2).all(|p| p.position == [0.0; 3]));
    }

    #[test]
    fn segments_become_vertex_pairs() {
        let segs = [Segment {
            a: Vec3::ZERO,
            b: Vec3::X,
            color: [1.0, 1.0, 0.0],
        }];
        let v = segment_vertices(&segs);
        assert_eq!(v.len(), 2);
        assert_eq!(v[1].position, [1.0, 0.0, 0.0]);
        assert_eq!(v[0].color, [1.0, 1.0, 0.0]);
    }
}

//! Owns the GPU context, the depth target and the scene pipelines.

pub mod context;
pub mod pipelines;
pub mod targets;

use self::{
    context::GfxContext,
    pipelines::{lines::LinesPipeline, mesh::MeshPipeline, points::PointsPipeline},
    targets::{Targets, DEPTH_FORMAT},
};
use crate::{
    camera::Camera,
    data::{MeshGpu, MeshUniform, PointCloudGpu, PointsUniform},
    gizmo::Segment,
};
use std::sync::Arc;
use winit::window::Window;

/// What the scene pass draws besides the axes helper.
pub enum SceneContent<'a> {
    Points { point_size: f32 },
    Mesh { mesh: Option<&'a MeshGpu>, scale: f32 },
}

pub struct Renderer {
    pub gfx: GfxContext,
    pub targets: Targets,
    pub points: PointsPipeline,
    pub mesh: MeshPipeline,
    pub lines: LinesPipeline,
    /// Instances of the frame currently shown.
    pub cloud: PointCloudGpu,
    pub egui_renderer: egui_wgpu::Renderer,
}

impl Renderer {
    pub async fn new(window: Arc<Window>) -> anyhow::Result<Self> {
        let gfx = GfxContext::new(window).await?;
        let color_fmt = gfx.config.format;

        let targets = Targets::new(&gfx.device, gfx.size);
        let points = PointsPipeline::new(&gfx.device, color_fmt, DEPTH_FORMAT);
        let mesh = MeshPipeline::new(&gfx.device, &gfx.queue, color_fmt, DEPTH_FORMAT);
        let lines = LinesPipeline::new(&gfx.device, color_fmt, DEPTH_FORMAT);
        let cloud = PointCloudGpu::new(&gfx.device);

        let egui_renderer = egui_wgpu::Renderer::new(&gfx.device, color_fmt, None, 1);

        Ok(Self {
            gfx,
            targets,
            points,
            mesh,
            lines,
            cloud,
            egui_renderer,
        })
    }

    pub fn resize(&mut self, new_size: winit::dpi::PhysicalSize<u32>) {
        if new_size.width > 0 && new_size.height > 0 {
            self.gfx.resize(new_size);
            self.targets.resize(&self.gfx.device, new_size);
        }
    }

    pub fn upload_frame(&mut self, points: &[episode::ColoredPoint]) {
        self.cloud
            .write_frame(&self.gfx.device, &self.gfx.queue, points);
    }

    /// Scene pass: clears, then draws the axes, the content and the gizmo on top.
    pub fn render(
        &mut self,
        swap_view: &wgpu::TextureView,
        camera: &Camera,
        content: SceneContent<'_>,
        gizmo: &[Segment],
    ) {
        let view_proj = camera.view_proj();
        match &content {
            SceneContent::Points { point_size } => self.points.prepare(
                &self.gfx.queue,
                &PointsUniform::new(camera.view(), camera.proj(), *point_size),
            ),
            SceneContent::Mesh { scale, .. } => self
                .mesh
                .prepare(&self.gfx.queue, &MeshUniform::new(view_proj, *scale)),
        }
        self.lines
            .prepare(&self.gfx.device, &self.gfx.queue, view_proj, gizmo);

        let mut encoder = self
            .gfx
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Scene Encoder"),
            });

        {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Scene Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: swap_view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.targets.depth,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                timestamp_writes: None,
                occlusion_query_set: None,
            });

            self.lines.draw_axes(&mut pass);
            match content {
                SceneContent::Points { .. } => self.points.draw(&mut pass, &self.cloud),
                SceneContent::Mesh { mesh: Some(mesh), .. } => self.mesh.draw(&mut pass, mesh),
                SceneContent::Mesh { mesh: None, .. } => {}
            }
            self.lines.draw_overlay(&mut pass);
        }

        self.gfx.queue.submit(std::iter::once(encoder.finish()));
    }
}

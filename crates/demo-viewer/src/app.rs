use crate::{
    config::{Config, ViewerMode},
    data::MeshGpu,
    net::{Loader, Request},
    renderer::{Renderer, SceneContent},
    scene::Slot,
    session::Session,
};
use anyhow::Result;
use glam::Vec2;
use std::{sync::Arc, time::Instant};
use winit::{event::WindowEvent, window::Window};

pub struct App {
    pub renderer: Renderer,
    pub session: Session,
    pub egui_ctx: egui::Context,
    pub egui_state: egui_winit::State,
    loader: Loader,
    mesh: Slot<MeshGpu>,
    last_frame: Instant,
}

impl App {
    pub async fn new(window: Arc<Window>, config: &Config) -> Result<Self> {
        let renderer = Renderer::new(window.clone()).await?;
        let size = renderer.gfx.size;

        // Points mode shows a placeholder sequence until real data arrives.
        let frames = config
            .placeholder_frames()
            .map(|(frames, points)| {
                episode::mock_sequence(frames, points, &mut rand::thread_rng())
            })
            .transpose()?;
        let session = Session::new(
            config.mode,
            frames,
            Vec2::new(size.width as f32, size.height as f32),
        );

        let loader = Loader::spawn(&config.server)?;
        log::info!("Backend at {} ({} mode)", config.server, config.mode);

        let egui_ctx = egui::Context::default();
        let egui_state = egui_winit::State::new(
            egui_ctx.clone(),
            egui_ctx.viewport_id(),
            &*window,
            None,
            None,
        );

        let mut app = Self {
            renderer,
            session,
            egui_ctx,
            egui_state,
            loader,
            mesh: Slot::default(),
            last_frame: Instant::now(),
        };

        if let Some(path) = &config.path {
            app.session.ui.path = path.clone();
            let request = app.session.load_request();
            app.send_all(request);
        }

        Ok(app)
    }

    pub fn resize(&mut self, new_size: winit::dpi::PhysicalSize<u32>) {
        if new_size.width > 0 && new_size.height > 0 {
            self.renderer.resize(new_size);
            self.session.resize(new_size.width, new_size.height);
        }
    }

    pub fn handle_event(&mut self, window: &Window, event: &WindowEvent) -> bool {
        let response = self.egui_state.on_window_event(window, event);
        if response.consumed {
            return true;
        }

        if let WindowEvent::Resized(physical_size) = event {
            self.resize(*physical_size);
        }

        let request = self.session.handle_input(event);
        self.send_all(request);

        false
    }

    fn send_all(&mut self, requests: impl IntoIterator<Item = Request>) {
        for request in requests {
            // The old mesh goes away as soon as a new one is asked for.
            if matches!(request, Request::LoadMesh { .. }) {
                self.mesh.clear();
            }
            if let Err(e) = self.loader.send(request) {
                log::error!("{}", e);
                self.session.status = crate::status::Status::load_failed(e);
            }
        }
    }

    fn drain_replies(&mut self) {
        while let Some(reply) = self.loader.try_recv() {
            if let Some(assets) = self.session.apply_reply(reply) {
                let gpu = MeshGpu::upload(
                    &self.renderer.gfx.device,
                    &self.renderer.gfx.queue,
                    &self.renderer.mesh,
                    &assets,
                );
                self.mesh.replace(gpu);
            }
        }
    }

    pub fn render(&mut self, window: &Window) -> Result<(), wgpu::SurfaceError> {
        let now = Instant::now();
        let dt = now.duration_since(self.last_frame).as_secs_f32();
        self.last_frame = now;

        self.drain_replies();

        // UI first so this frame already reflects what was clicked.
        let egui_input = self.egui_state.take_egui_input(window);
        self.egui_ctx.begin_frame(egui_input);
        let actions = self.session.draw_ui(&self.egui_ctx);
        let egui_output = self.egui_ctx.end_frame();
        self.egui_state
            .handle_platform_output(window, egui_output.platform_output);

        let requests = self.session.apply_actions(actions);
        self.send_all(requests);

        self.session.advance(dt);
        if let Some(points) = self.session.take_frame_upload() {
            self.renderer.upload_frame(points);
        }

        let frame = self.renderer.gfx.surface.get_current_texture()?;
        let swap_view = frame
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let content = match self.session.mode {
            ViewerMode::Points => SceneContent::Points {
                point_size: self.session.ui.point_size,
            },
            ViewerMode::Mesh => SceneContent::Mesh {
                mesh: self.mesh.get(),
                scale: self.session.ui.mesh_scale,
            },
        };
        let gizmo = self.session.gizmo_segments();
        self.renderer
            .render(&swap_view, &self.session.camera, content, &gizmo);

        let shapes = self
            .egui_ctx
            .tessellate(egui_output.shapes, self.egui_ctx.pixels_per_point());
        let screen_descriptor = egui_wgpu::ScreenDescriptor {
            size_in_pixels: [
                self.renderer.gfx.config.width,
                self.renderer.gfx.config.height,
            ],
            pixels_per_point: self.egui_ctx.pixels_per_point(),
        };

        let mut encoder = self
            .renderer
            .gfx
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("UI Encoder"),
            });

        for (id, delta) in &egui_output.textures_delta.set {
            self.renderer.egui_renderer.update_texture(
                &self.renderer.gfx.device,
                &self.renderer.gfx.queue,
                *id,
                delta,
            );
        }

        self.renderer.egui_renderer.update_buffers(
            &self.renderer.gfx.device,
            &self.renderer.gfx.queue,
            &mut encoder,
            &shapes,
            &screen_descriptor,
        );

        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("EGUI Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &swap_view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Load,
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
            });

            self.renderer
                .egui_renderer
                .render(&mut render_pass, &shapes, &screen_descriptor);
        }

        for id in &egui_output.textures_delta.free {
            self.renderer.egui_renderer.free_texture(id);
        }

        self.renderer
            .gfx
            .queue
            .submit(std::iter::once(encoder.finish()));
        frame.present();

        Ok(())
    }
}

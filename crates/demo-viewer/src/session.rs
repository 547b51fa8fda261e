//! Viewer state that needs neither the window nor the GPU: camera, playback,
//! annotation, the status line and the panel values. Input and backend
//! replies go in, backend requests and frames to upload come out.

use crate::{
    annotation::{Annotation, Shortcut},
    camera::{Camera, CameraController, UpAxis},
    config::ViewerMode,
    gizmo::{Segment, Viewport},
    net::{EpisodeSource, MeshAssets, Reply, Request},
    playback::Playback,
    status::Status,
    ui::{self, PanelView, UiActions, UiState},
};
use episode::{ColoredPoint, FrameSequence};
use glam::{Vec2, Vec3};
use winit::event::{ElementState, MouseButton, WindowEvent};

pub const INITIAL_EYE: Vec3 = Vec3::new(0.3, 0.3, 0.4);

pub struct Session {
    pub mode: ViewerMode,
    pub camera: Camera,
    pub controller: CameraController,
    pub annotation: Annotation,
    pub playback: Playback,
    pub status: Status,
    pub ui: UiState,
    frames: Option<FrameSequence>,
    episode_count: Option<usize>,
    /// The frame at `playback.current()` still has to reach the GPU.
    frame_dirty: bool,
    cursor: Vec2,
    viewport_size: Vec2,
}

impl Session {
    pub fn new(mode: ViewerMode, frames: Option<FrameSequence>, viewport_size: Vec2) -> Self {
        let up = match mode {
            ViewerMode::Points => UpAxis::Z,
            ViewerMode::Mesh => UpAxis::Y,
        };
        let aspect = viewport_size.x / viewport_size.y.max(1.0);
        let total = frames.as_ref().map_or(0, FrameSequence::len);

        Self {
            mode,
            camera: Camera::looking_at(INITIAL_EYE, Vec3::ZERO, up, aspect),
            controller: CameraController::new(),
            annotation: Annotation::new(),
            playback: Playback::new(total),
            status: Status::default(),
            ui: UiState::default(),
            frame_dirty: frames.is_some(),
            frames,
            episode_count: None,
            cursor: Vec2::ZERO,
            viewport_size,
        }
    }

    pub fn frames(&self) -> Option<&FrameSequence> {
        self.frames.as_ref()
    }

    pub fn episode_count(&self) -> Option<usize> {
        self.episode_count
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            return;
        }
        self.viewport_size = Vec2::new(width as f32, height as f32);
        self.camera.aspect = self.viewport_size.x / self.viewport_size.y;
    }

    fn viewport(&self) -> Viewport {
        Viewport::new(&self.camera, self.viewport_size)
    }

    /// Window input that egui did not consume.
    pub fn handle_input(&mut self, event: &WindowEvent) -> Option<Request> {
        match event {
            WindowEvent::KeyboardInput { event: key, .. }
                if key.state == ElementState::Pressed && !key.repeat =>
            {
                return Shortcut::from_key(key.physical_key).and_then(|s| self.shortcut(s));
            }
            WindowEvent::CursorMoved { position, .. } => {
                self.cursor = Vec2::new(position.x as f32, position.y as f32);
                if self.annotation.enabled() {
                    let vp = self.viewport();
                    self.annotation
                        .pointer_moved(&vp, self.cursor, &mut self.controller);
                }
                self.controller.handle_event(event, &mut self.camera);
            }
            WindowEvent::MouseInput {
                state,
                button: MouseButton::Left,
                ..
            } => {
                let consumed = match state {
                    ElementState::Pressed if self.annotation.enabled() => {
                        let vp = self.viewport();
                        self.annotation
                            .pointer_pressed(&vp, self.cursor, &mut self.controller)
                    }
                    ElementState::Pressed => false,
                    ElementState::Released => self.annotation.pointer_released(&mut self.controller),
                };
                if !consumed {
                    self.controller.handle_event(event, &mut self.camera);
                }
            }
            _ => self.controller.handle_event(event, &mut self.camera),
        }
        None
    }

    /// T/R switch the gizmo mode, C saves; all only while annotating.
    pub fn shortcut(&mut self, shortcut: Shortcut) -> Option<Request> {
        self.annotation
            .handle_shortcut(shortcut)
            .then(|| self.save_request())
    }

    /// Request for the path in the input box, or a red status when it is blank.
    pub fn load_request(&mut self) -> Option<Request> {
        let path = self.ui.path.trim();
        if path.is_empty() {
            self.status = Status::error(ui::empty_path_message(self.mode));
            return None;
        }
        let path = path.to_owned();
        log::info!("Loading '{}'", path);
        self.status = Status::pending();
        Some(match self.mode {
            ViewerMode::Points => Request::LoadEpisodes { path, traj_id: 0 },
            ViewerMode::Mesh => Request::LoadMesh { path },
        })
    }

    /// Current gizmo pose, tagged with the frame index (points) or -1 and
    /// the scale (mesh).
    pub fn save_request(&self) -> Request {
        let pose = self.annotation.readout().wire();
        let (frame, scale) = match self.mode {
            ViewerMode::Points => (self.playback.current() as i64, None),
            ViewerMode::Mesh => (-1, Some(self.ui.mesh_scale)),
        };
        Request::SavePose { pose, frame, scale }
    }

    pub fn draw_ui(&mut self, ctx: &egui::Context) -> UiActions {
        let view = PanelView {
            mode: self.mode,
            status: &self.status,
            playback: &self.playback,
            episode_count: self.episode_count,
            annotating: self.annotation.enabled(),
            gizmo_mode: self.annotation.gizmo.mode(),
            readout: self.annotation.readout(),
        };
        ui::draw_panels(ctx, &mut self.ui, &view)
    }

    pub fn apply_actions(&mut self, actions: UiActions) -> Vec<Request> {
        let mut requests = Vec::new();

        if actions.load {
            requests.extend(self.load_request());
        }
        if let Some(playing) = actions.playing {
            self.playback.playing = playing;
        }
        if let Some(speed) = actions.speed {
            self.playback.set_speed(speed);
        }
        if let Some(frame) = actions.seek {
            if self.playback.seek(frame).is_some() {
                self.frame_dirty = true;
            }
        }
        if let Some(episode_id) = actions.show_episode {
            self.status = Status::pending();
            requests.push(Request::ShowEpisode { episode_id });
        }
        if let Some(on) = actions.annotating {
            self.annotation.set_enabled(on, &mut self.controller);
        }
        if let Some(mode) = actions.gizmo_mode {
            self.annotation.gizmo.set_mode(mode);
        }
        if actions.save_pose && self.annotation.enabled() {
            requests.push(self.save_request());
        }

        requests
    }

    /// Applies a finished request. A loaded mesh is handed back for upload.
    pub fn apply_reply(&mut self, reply: Reply) -> Option<MeshAssets> {
        match reply {
            Reply::Episodes { path, result } => match result {
                Ok(EpisodeSource::Frames(seq)) => {
                    self.episode_count = None;
                    self.install_frames(seq);
                }
                Ok(EpisodeSource::Episodes { count }) => {
                    log::info!("'{}' holds {} episodes", path, count);
                    self.episode_count = Some(count);
                    self.ui.selected_episode = 0;
                    self.status = Status::success(format!("Found {count} episodes; pick one to show"));
                }
                Err(e) => self.fail(&path, e),
            },
            Reply::Episode { episode_id, result } => match result {
                Ok(seq) => self.install_frames(seq),
                Err(e) => self.fail(&format!("episode {episode_id}"), e),
            },
            Reply::Mesh { path, result } => match result {
                Ok(assets) => {
                    self.status = Status::success("Loaded");
                    return Some(assets);
                }
                Err(e) => self.fail(&path, e),
            },
            Reply::PoseSaved(Ok(())) => self.status = Status::success("Pose saved"),
            Reply::PoseSaved(Err(e)) => {
                log::error!("Saving pose failed: {}", e);
                self.status = Status::error(format!("Saving pose failed: {e}"));
            }
        }
        None
    }

    fn fail(&mut self, what: &str, error: crate::net::LoadError) {
        log::error!("Loading {} failed: {}", what, error);
        self.status = Status::load_failed(error);
    }

    fn install_frames(&mut self, seq: FrameSequence) {
        self.status = Status::frames_loaded(seq.len(), seq.points_per_frame());
        self.playback.reset(seq.len());
        self.frames = Some(seq);
        self.frame_dirty = true;
    }

    /// Advances playback and the damped orbit by `dt_s` seconds.
    pub fn advance(&mut self, dt_s: f32) {
        if self.playback.tick(dt_s).is_some() {
            self.frame_dirty = true;
        }
        self.controller.update(&mut self.camera);
    }

    /// Points of the current frame if they changed since the last call.
    pub fn take_frame_upload(&mut self) -> Option<&[ColoredPoint]> {
        if !self.frame_dirty {
            return None;
        }
        self.frame_dirty = false;
        self.frames.as_ref()?.points(self.playback.current())
    }

    pub fn gizmo_segments(&self) -> Vec<Segment> {
        if self.annotation.enabled() {
            self.annotation.gizmo.segments(self.camera.eye())
        } else {
            Vec::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gizmo::GizmoMode;
    use crate::net::LoadError;
    use episode::mock_sequence;
    use rand::{rngs::StdRng, SeedableRng};

    fn points_session() -> Session {
        let seq = mock_sequence(4, 8, &mut StdRng::seed_from_u64(7)).unwrap();
        Session::new(ViewerMode::Points, Some(seq), Vec2::new(800.0, 600.0))
    }

    fn mesh_session() -> Session {
        Session::new(ViewerMode::Mesh, None, Vec2::new(800.0, 600.0))
    }

    fn sequence(frames: usize, points: usize) -> FrameSequence {
        FrameSequence::from_frames(vec![vec![0.5; points * 6]; frames]).unwrap()
    }

    #[test]
    fn camera_up_follows_mode() {
        assert_eq!(points_session().camera.up, UpAxis::Z);
        assert_eq!(mesh_session().camera.up, UpAxis::Y);
        assert!((points_session().camera.eye() - INITIAL_EYE).length() < 1e-5);
    }

    #[test]
    fn blank_path_is_rejected_locally() {
        let mut s = points_session();
        s.ui.path = "   ".into();
        assert!(s.load_request().is_none());
        assert_eq!(s.status.text, "Please input valid zarr/H5 file path");
        assert_eq!(s.status.color(), egui::Color32::RED);

        let mut m = mesh_session();
        assert!(m.load_request().is_none());
        assert_eq!(m.status.text, "Please input valid .obj file path");
    }

    #[test]
    fn load_request_per_mode() {
        let mut s = points_session();
        s.ui.path = " /data/ep.zarr ".into();
        assert_eq!(
            s.load_request(),
            Some(Request::LoadEpisodes {
                path: "/data/ep.zarr".into(),
                traj_id: 0
            })
        );
        assert_eq!(s.status, Status::pending());

        let mut m = mesh_session();
        m.ui.path = "/assets/cup/model.obj".into();
        assert_eq!(
            m.load_request(),
            Some(Request::LoadMesh {
                path: "/assets/cup/model.obj".into()
            })
        );
    }

    #[test]
    fn frames_reply_replaces_sequence_and_rewinds() {
        let mut s = points_session();
        s.playback.playing = true;
        s.apply_actions(UiActions {
            seek: Some(2),
            ..Default::default()
        });
        assert_eq!(s.playback.current(), 2);

        let reply = Reply::Episodes {
            path: "/data/ep.zarr".into(),
            result: Ok(EpisodeSource::Frames(sequence(3, 2))),
        };
        assert!(s.apply_reply(reply).is_none());
        assert_eq!(s.playback.current(), 0);
        assert_eq!(s.playback.total(), 3);
        assert!(!s.playback.playing);
        assert_eq!(
            s.status.text,
            "Successfully Loaded Point Cloud Data: 3 Frames; 2 Points Per Frame"
        );

        assert_eq!(s.take_frame_upload().map(<[_]>::len), Some(2));
        assert!(s.take_frame_upload().is_none());
    }

    #[test]
    fn failed_load_keeps_current_sequence() {
        let mut s = points_session();
        s.take_frame_upload();
        s.apply_reply(Reply::Episodes {
            path: "/nope".into(),
            result: Err(LoadError::Server("path is invalid".into())),
        });
        assert_eq!(s.status.text, "Loading failed: Server error: path is invalid");
        assert_eq!(s.frames().map(FrameSequence::len), Some(4));
        assert!(s.take_frame_upload().is_none());
    }

    #[test]
    fn episode_count_enables_selector() {
        let mut s = points_session();
        s.apply_reply(Reply::Episodes {
            path: "/data/all.h5".into(),
            result: Ok(EpisodeSource::Episodes { count: 5 }),
        });
        assert_eq!(s.episode_count(), Some(5));

        let requests = s.apply_actions(UiActions {
            show_episode: Some(3),
            ..Default::default()
        });
        assert_eq!(requests, vec![Request::ShowEpisode { episode_id: 3 }]);
        assert_eq!(s.status, Status::pending());

        s.apply_reply(Reply::Episode {
            episode_id: 3,
            result: Ok(sequence(6, 1)),
        });
        assert_eq!(s.playback.total(), 6);
    }

    #[test]
    fn save_request_tags_frame_or_mesh() {
        let mut s = points_session();
        s.apply_actions(UiActions {
            seek: Some(3),
            ..Default::default()
        });
        match s.save_request() {
            Request::SavePose { pose, frame, scale } => {
                assert_eq!(frame, 3);
                assert_eq!(scale, None);
                assert_eq!(pose, [0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0]);
            }
            other => panic!("unexpected {other:?}"),
        }

        let mut m = mesh_session();
        m.ui.mesh_scale = 2.5;
        assert!(matches!(
            m.save_request(),
            Request::SavePose {
                frame: -1,
                scale: Some(sc),
                ..
            } if sc == 2.5
        ));
    }

    #[test]
    fn shortcuts_need_annotation_mode() {
        let mut s = mesh_session();
        assert!(s.shortcut(Shortcut::SavePose).is_none());
        assert!(s.shortcut(Shortcut::Rotate).is_none());
        assert_eq!(s.annotation.gizmo.mode(), GizmoMode::Translate);

        s.apply_actions(UiActions {
            annotating: Some(true),
            ..Default::default()
        });
        assert!(s.shortcut(Shortcut::Rotate).is_none());
        assert_eq!(s.annotation.gizmo.mode(), GizmoMode::Rotate);
        assert!(matches!(
            s.shortcut(Shortcut::SavePose),
            Some(Request::SavePose { frame: -1, .. })
        ));
    }

    #[test]
    fn save_button_ignored_while_not_annotating() {
        let mut s = points_session();
        let requests = s.apply_actions(UiActions {
            save_pose: true,
            ..Default::default()
        });
        assert!(requests.is_empty());
    }

    #[test]
    fn gizmo_drawn_only_while_annotating() {
        let mut s = points_session();
        assert!(s.gizmo_segments().is_empty());
        s.apply_actions(UiActions {
            annotating: Some(true),
            ..Default::default()
        });
        assert!(!s.gizmo_segments().is_empty());
    }

    #[test]
    fn playback_advances_and_marks_upload() {
        let mut s = points_session();
        s.take_frame_upload();
        s.apply_actions(UiActions {
            playing: Some(true),
            ..Default::default()
        });
        s.advance(0.01);
        assert!(s.take_frame_upload().is_none());
        s.advance(0.03);
        assert_eq!(s.playback.current(), 1);
        assert!(s.take_frame_upload().is_some());
    }

    #[test]
    fn mesh_reply_is_handed_back() {
        let mut m = mesh_session();
        let assets = MeshAssets {
            model: Default::default(),
            materials: Default::default(),
            textures: Default::default(),
        };
        let out = m.apply_reply(Reply::Mesh {
            path: "/a/b.obj".into(),
            result: Ok(assets),
        });
        assert!(out.is_some());
        assert_eq!(m.status, Status::success("Loaded"));
    }

    #[test]
    fn pose_saved_status() {
        let mut s = points_session();
        s.apply_reply(Reply::PoseSaved(Err(LoadError::HttpStatus(500))));
        assert_eq!(s.status.text, "Saving pose failed: HTTP error: 500");
        s.apply_reply(Reply::PoseSaved(Ok(())));
        assert_eq!(s.status.text, "Pose saved");
    }
}

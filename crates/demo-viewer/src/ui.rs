//! egui panels: the path loader window and the parameter panel.

use crate::{
    config::ViewerMode,
    gizmo::GizmoMode,
    playback::{Playback, MAX_SPEED, MIN_SPEED},
    status::Status,
};
use episode::PoseReadout;

pub const DEFAULT_POINT_SIZE: f32 = 0.01;
pub const POINT_SIZE_RANGE: std::ops::RangeInclusive<f32> = 0.01..=0.1;
pub const MESH_SCALE_RANGE: std::ops::RangeInclusive<f32> = 0.1..=5.0;

/// Values edited directly by the widgets.
#[derive(Debug, Clone)]
pub struct UiState {
    pub path: String,
    pub point_size: f32,
    pub mesh_scale: f32,
    pub selected_episode: usize,
}

impl Default for UiState {
    fn default() -> Self {
        Self {
            path: String::new(),
            point_size: DEFAULT_POINT_SIZE,
            mesh_scale: 1.0,
            selected_episode: 0,
        }
    }
}

/// Read-only state the panels display.
pub struct PanelView<'a> {
    pub mode: ViewerMode,
    pub status: &'a Status,
    pub playback: &'a Playback,
    /// Set after a multi-episode file was loaded.
    pub episode_count: Option<usize>,
    pub annotating: bool,
    pub gizmo_mode: GizmoMode,
    pub readout: PoseReadout,
}

/// What the user asked for this frame.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct UiActions {
    pub load: bool,
    pub playing: Option<bool>,
    pub speed: Option<f32>,
    pub seek: Option<usize>,
    pub show_episode: Option<usize>,
    pub annotating: Option<bool>,
    pub gizmo_mode: Option<GizmoMode>,
    pub save_pose: bool,
}

pub fn path_label(mode: ViewerMode) -> &'static str {
    match mode {
        ViewerMode::Points => "zarr/H5 file path:",
        ViewerMode::Mesh => "Mesh file (.obj) path:",
    }
}

/// Status shown when Load is pressed with a blank path.
pub fn empty_path_message(mode: ViewerMode) -> &'static str {
    match mode {
        ViewerMode::Points => "Please input valid zarr/H5 file path",
        ViewerMode::Mesh => "Please input valid .obj file path",
    }
}

/// Rows of the pose read-out: Euler angles for points, quaternion for meshes.
pub fn pose_rows(mode: ViewerMode, r: &PoseReadout) -> Vec<(&'static str, f32)> {
    let mut rows = vec![("x", r.x), ("y", r.y), ("z", r.z)];
    match mode {
        ViewerMode::Points => rows.extend([("rx", r.rx), ("ry", r.ry), ("rz", r.rz)]),
        ViewerMode::Mesh => rows.extend([("qx", r.qx), ("qy", r.qy), ("qz", r.qz), ("qw", r.qw)]),
    }
    rows
}

pub fn draw_panels(ctx: &egui::Context, state: &mut UiState, view: &PanelView<'_>) -> UiActions {
    let mut actions = UiActions::default();
    draw_loader(ctx, state, view, &mut actions);
    draw_controls(ctx, state, view, &mut actions);
    actions
}

fn draw_loader(ctx: &egui::Context, state: &mut UiState, view: &PanelView<'_>, actions: &mut UiActions) {
    egui::Window::new("Load")
        .anchor(egui::Align2::LEFT_TOP, [10.0, 10.0])
        .resizable(false)
        .collapsible(false)
        .title_bar(false)
        .show(ctx, |ui| {
            ui.label(path_label(view.mode));
            ui.horizontal(|ui| {
                let edit = ui.add(
                    egui::TextEdit::singleline(&mut state.path)
                        .desired_width(320.0)
                        .hint_text("/path/on/server"),
                );
                let submitted =
                    edit.lost_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter));
                if ui.button("Load").clicked() || submitted {
                    actions.load = true;
                }
            });
            if !view.status.text.is_empty() {
                ui.colored_label(view.status.color(), &view.status.text);
            }
        });
}

fn draw_controls(ctx: &egui::Context, state: &mut UiState, view: &PanelView<'_>, actions: &mut UiActions) {
    egui::Window::new("Controls")
        .anchor(egui::Align2::RIGHT_TOP, [-10.0, 10.0])
        .resizable(false)
        .show(ctx, |ui| {
            if view.mode == ViewerMode::Points {
                draw_playback(ui, state, view, actions);
                ui.separator();
            } else {
                ui.add(egui::Slider::new(&mut state.mesh_scale, MESH_SCALE_RANGE).text("Scale"));
                ui.separator();
            }
            draw_annotation(ui, view, actions);
        });
}

fn draw_playback(ui: &mut egui::Ui, state: &mut UiState, view: &PanelView<'_>, actions: &mut UiActions) {
    let pb = view.playback;

    let mut playing = pb.playing;
    if ui.checkbox(&mut playing, "Play/Pause").changed() {
        actions.playing = Some(playing);
    }

    let mut speed = pb.speed();
    if ui
        .add(egui::Slider::new(&mut speed, MIN_SPEED..=MAX_SPEED).text("Play Speed"))
        .changed()
    {
        actions.speed = Some(speed);
    }

    let last = pb.total().saturating_sub(1);
    let mut frame = pb.current();
    if ui
        .add_enabled(pb.total() > 1, egui::Slider::new(&mut frame, 0..=last).text("Current Frame"))
        .changed()
    {
        actions.seek = Some(frame);
    }

    ui.add(egui::Slider::new(&mut state.point_size, POINT_SIZE_RANGE).text("Point Size"));
    ui.label(format!("Total Frame: {}", pb.total()));

    if let Some(count) = view.episode_count {
        ui.horizontal(|ui| {
            egui::ComboBox::from_label("Episode")
                .selected_text(state.selected_episode.to_string())
                .show_ui(ui, |ui| {
                    for id in 0..count {
                        ui.selectable_value(&mut state.selected_episode, id, id.to_string());
                    }
                });
            if ui.button("Show").clicked() {
                actions.show_episode = Some(state.selected_episode);
            }
        });
    }
}

fn draw_annotation(ui: &mut egui::Ui, view: &PanelView<'_>, actions: &mut UiActions) {
    let mut annotating = view.annotating;
    if ui.checkbox(&mut annotating, "Annotation Mode").changed() {
        actions.annotating = Some(annotating);
    }

    ui.add_enabled_ui(view.annotating, |ui| {
        ui.horizontal(|ui| {
            let mut mode = view.gizmo_mode;
            let t = ui.radio_value(&mut mode, GizmoMode::Translate, "Translate (T)");
            let r = ui.radio_value(&mut mode, GizmoMode::Rotate, "Rotate (R)");
            if t.changed() || r.changed() {
                actions.gizmo_mode = Some(mode);
            }
        });

        egui::CollapsingHeader::new("Gizmo 6D Pose")
            .default_open(true)
            .show(ui, |ui| {
                egui::Grid::new("pose").num_columns(2).show(ui, |ui| {
                    for (name, value) in pose_rows(view.mode, &view.readout) {
                        ui.label(name);
                        ui.monospace(format!("{value:.3}"));
                        ui.end_row();
                    }
                });
            });

        if ui.button("Save Pose (C)").clicked() {
            actions.save_pose = true;
        }
    });
}

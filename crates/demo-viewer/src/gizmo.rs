//! Draggable translate/rotate handle bound to the annotation pose.
//!
//! The gizmo knows nothing about windows or GPUs: it is driven with cursor
//! positions plus a [`Viewport`] and reports what happened as
//! [`GizmoEvent`]s. Handles live in the target's local frame.

use crate::camera::Camera;
use episode::Pose;
use glam::{Mat4, Quat, Vec2, Vec3};

/// Cursor distance (px) within which a handle is picked.
pub const PICK_RADIUS_PX: f32 = 10.0;
/// Handle length per unit of camera distance, so the gizmo keeps a steady
/// on-screen size.
const SCREEN_SCALE: f32 = 0.4;
const RING_SEGMENTS: usize = 48;

const HOVER_COLOR: [f32; 3] = [1.0, 1.0, 0.0];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GizmoMode {
    Translate,
    Rotate,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    X,
    Y,
    Z,
}

impl Axis {
    pub const ALL: [Axis; 3] = [Axis::X, Axis::Y, Axis::Z];

    pub fn unit(self) -> Vec3 {
        match self {
            Axis::X => Vec3::X,
            Axis::Y => Vec3::Y,
            Axis::Z => Vec3::Z,
        }
    }

    pub fn color(self) -> [f32; 3] {
        match self {
            Axis::X => [1.0, 0.2, 0.2],
            Axis::Y => [0.2, 1.0, 0.2],
            Axis::Z => [0.25, 0.45, 1.0],
        }
    }

    /// The two other axes, in right-handed order.
    fn others(self) -> (Axis, Axis) {
        match self {
            Axis::X => (Axis::Y, Axis::Z),
            Axis::Y => (Axis::Z, Axis::X),
            Axis::Z => (Axis::X, Axis::Y),
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Ray {
    pub origin: Vec3,
    pub dir: Vec3,
}

impl Ray {
    /// Parameter `s` of the point on the line `p + s*u` closest to this ray.
    pub fn closest_on_line(&self, p: Vec3, u: Vec3) -> Option<f32> {
        let w0 = p - self.origin;
        let a = u.dot(u);
        let b = u.dot(self.dir);
        let c = self.dir.dot(self.dir);
        let d = u.dot(w0);
        let e = self.dir.dot(w0);
        let denom = a * c - b * b;
        if denom.abs() < 1e-8 {
            return None;
        }
        Some((b * e - c * d) / denom)
    }

    /// Intersection with the plane through `p` with normal `n`.
    pub fn hit_plane(&self, p: Vec3, n: Vec3) -> Option<Vec3> {
        let denom = self.dir.dot(n);
        if denom.abs() < 1e-6 {
            return None;
        }
        let t = (p - self.origin).dot(n) / denom;
        (t >= 0.0).then(|| self.origin + self.dir * t)
    }
}

/// Camera snapshot used to map between cursor pixels and world space.
#[derive(Debug, Clone, Copy)]
pub struct Viewport {
    pub view_proj: Mat4,
    inv_view_proj: Mat4,
    pub eye: Vec3,
    /// Size in physical pixels.
    pub size: Vec2,
}

impl Viewport {
    pub fn new(camera: &Camera, size: Vec2) -> Self {
        let view_proj = camera.view_proj();
        Self {
            view_proj,
            inv_view_proj: view_proj.inverse(),
            eye: camera.eye(),
            size,
        }
    }

    /// World point to pixel coordinates (origin top-left). `None` behind
    /// the camera.
    pub fn project(&self, p: Vec3) -> Option<Vec2> {
        let clip = self.view_proj * p.extend(1.0);
        if clip.w <= 1e-6 {
            return None;
        }
        let ndc = clip.truncate() / clip.w;
        Some(Vec2::new(
            (ndc.x + 1.0) * 0.5 * self.size.x,
            (1.0 - ndc.y) * 0.5 * self.size.y,
        ))
    }

    /// Ray from the eye through a pixel.
    pub fn ray(&self, cursor: Vec2) -> Ray {
        let ndc = Vec2::new(
            cursor.x / self.size.x * 2.0 - 1.0,
            1.0 - cursor.y / self.size.y * 2.0,
        );
        let near = self.inv_view_proj.project_point3(ndc.extend(0.0));
        let far = self.inv_view_proj.project_point3(ndc.extend(1.0));
        Ray {
            origin: near,
            dir: (far - near).normalize_or_zero(),
        }
    }
}

fn distance_to_segment(p: Vec2, a: Vec2, b: Vec2) -> f32 {
    let ab = b - a;
    let len2 = ab.length_squared();
    if len2 < 1e-12 {
        return p.distance(a);
    }
    let t = ((p - a).dot(ab) / len2).clamp(0.0, 1.0);
    p.distance(a + ab * t)
}

/// A coloured line segment of the gizmo, ready to draw.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Segment {
    pub a: Vec3,
    pub b: Vec3,
    pub color: [f32; 3],
}

#[derive(Debug, Clone, PartialEq)]
pub enum GizmoEvent {
    /// The target transform changed.
    Changed(Pose),
    /// A drag started (`true`) or ended (`false`).
    DraggingChanged(bool),
}

#[derive(Debug, Clone, Copy)]
enum DragKind {
    /// Axis parameter under the cursor at press time.
    Translate { start_param: f32 },
    /// Ring-plane offset from the centre at press time.
    Rotate { start_offset: Vec3 },
}

#[derive(Debug, Clone, Copy)]
struct Drag {
    axis: Axis,
    world_axis: Vec3,
    start: Pose,
    kind: DragKind,
}

#[derive(Debug, Clone)]
pub struct Gizmo {
    enabled: bool,
    mode: GizmoMode,
    pose: Pose,
    /// Relative on-screen size of the handles.
    pub size: f32,
    hovered: Option<Axis>,
    drag: Option<Drag>,
}

impl Default for Gizmo {
    fn default() -> Self {
        Self::new()
    }
}

impl Gizmo {
    /// Hidden, disabled, in translate mode at the origin.
    pub fn new() -> Self {
        Self {
            enabled: false,
            mode: GizmoMode::Translate,
            pose: Pose::default(),
            size: 0.5,
            hovered: None,
            drag: None,
        }
    }

    pub fn enabled(&self) -> bool {
        self.enabled
    }

    pub fn mode(&self) -> GizmoMode {
        self.mode
    }

    pub fn pose(&self) -> Pose {
        self.pose
    }

    pub fn hovered(&self) -> Option<Axis> {
        self.hovered
    }

    pub fn is_dragging(&self) -> bool {
        self.drag.is_some()
    }

    /// Shows and enables the gizmo, or hides and disables it. Turning it off
    /// mid-drag ends the drag.
    pub fn set_enabled(&mut self, enabled: bool) -> Vec<GizmoEvent> {
        self.enabled = enabled;
        self.hovered = None;
        if !enabled && self.drag.take().is_some() {
            return vec![GizmoEvent::DraggingChanged(false)];
        }
        Vec::new()
    }

    /// Switches translate/rotate. Ignored while disabled or dragging.
    pub fn set_mode(&mut self, mode: GizmoMode) -> bool {
        if !self.enabled || self.drag.is_some() {
            return false;
        }
        self.mode = mode;
        self.hovered = None;
        true
    }

    /// Moves the target programmatically.
    pub fn set_pose(&mut self, pose: Pose) -> Vec<GizmoEvent> {
        if pose == self.pose {
            return Vec::new();
        }
        self.pose = pose;
        vec![GizmoEvent::Changed(pose)]
    }

    pub fn handle_length(&self, eye: Vec3) -> f32 {
        self.size * eye.distance(self.pose.position) * SCREEN_SCALE
    }

    /// World direction of a local axis.
    pub fn axis_dir(&self, axis: Axis) -> Vec3 {
        self.pose.orientation * axis.unit()
    }

    fn ring_points(&self, axis: Axis, radius: f32) -> impl Iterator<Item = Vec3> + '_ {
        let (a, b) = axis.others();
        let (u, v) = (self.axis_dir(a), self.axis_dir(b));
        let center = self.pose.position;
        (0..=RING_SEGMENTS).map(move |i| {
            let t = i as f32 / RING_SEGMENTS as f32 * std::f32::consts::TAU;
            center + (u * t.cos() + v * t.sin()) * radius
        })
    }

    /// Handle under the cursor, if any.
    pub fn pick(&self, vp: &Viewport, cursor: Vec2) -> Option<Axis> {
        if !self.enabled {
            return None;
        }
        let len = self.handle_length(vp.eye);
        let center = self.pose.position;

        let mut best: Option<(Axis, f32)> = None;
        for axis in Axis::ALL {
            let dist = match self.mode {
                GizmoMode::Translate => {
                    let (Some(a), Some(b)) = (
                        vp.project(center),
                        vp.project(center + self.axis_dir(axis) * len),
                    ) else {
                        continue;
                    };
                    distance_to_segment(cursor, a, b)
                }
                GizmoMode::Rotate => {
                    let pts: Vec<Vec2> = self
                        .ring_points(axis, len)
                        .filter_map(|p| vp.project(p))
                        .collect();
                    pts.windows(2)
                        .map(|w| distance_to_segment(cursor, w[0], w[1]))
                        .fold(f32::INFINITY, f32::min)
                }
            };

            if dist <= PICK_RADIUS_PX && best.map_or(true, |(_, d)| dist < d) {
                best = Some((axis, dist));
            }
        }
        best.map(|(axis, _)| axis)
    }

    /// Starts a drag if the cursor is on a handle.
    pub fn pointer_pressed(&mut self, vp: &Viewport, cursor: Vec2) -> Vec<GizmoEvent> {
        if self.drag.is_some() {
            return Vec::new();
        }
        let Some(axis) = self.pick(vp, cursor) else {
            return Vec::new();
        };

        let ray = vp.ray(cursor);
        let world_axis = self.axis_dir(axis);
        let center = self.pose.position;
        let kind = match self.mode {
            GizmoMode::Translate => match ray.closest_on_line(center, world_axis) {
                Some(start_param) => DragKind::Translate { start_param },
                None => return Vec::new(),
            },
            GizmoMode::Rotate => match ray.hit_plane(center, world_axis) {
                Some(hit) => DragKind::Rotate {
                    start_offset: hit - center,
                },
                None => return Vec::new(),
            },
        };

        self.drag = Some(Drag {
            axis,
            world_axis,
            start: self.pose,
            kind,
        });
        self.hovered = Some(axis);
        vec![GizmoEvent::DraggingChanged(true)]
    }

    /// Updates hover state or the dragged transform.
    pub fn pointer_moved(&mut self, vp: &Viewport, cursor: Vec2) -> Vec<GizmoEvent> {
        let Some(drag) = self.drag else {
            self.hovered = self.pick(vp, cursor);
            return Vec::new();
        };

        let ray = vp.ray(cursor);
        let start = drag.start;
        let next = match drag.kind {
            DragKind::Translate { start_param } => {
                match ray.closest_on_line(start.position, drag.world_axis) {
                    Some(s) => Pose::new(
                        start.position + drag.world_axis * (s - start_param),
                        start.orientation,
                    ),
                    None => return Vec::new(),
                }
            }
            DragKind::Rotate { start_offset } => {
                let Some(hit) = ray.hit_plane(start.position, drag.world_axis) else {
                    return Vec::new();
                };
                let v1 = hit - start.position;
                let angle = drag
                    .world_axis
                    .dot(start_offset.cross(v1))
                    .atan2(start_offset.dot(v1));
                let turn = Quat::from_axis_angle(drag.world_axis, angle);
                Pose::new(start.position, (turn * start.orientation).normalize())
            }
        };

        self.set_pose(next)
    }

    /// Ends a drag.
    pub fn pointer_released(&mut self) -> Vec<GizmoEvent> {
        match self.drag.take() {
            Some(_) => vec![GizmoEvent::DraggingChanged(false)],
            None => Vec::new(),
        }
    }

    /// Line segments for the current mode; empty while disabled.
    pub fn segments(&self, eye: Vec3) -> Vec<Segment> {
        if !self.enabled {
            return Vec::new();
        }
        let len = self.handle_length(eye);
        let center = self.pose.position;
        let active = self.drag.map(|d| d.axis).or(self.hovered);

        let mut out = Vec::new();
        for axis in Axis::ALL {
            let color = if active == Some(axis) {
                HOVER_COLOR
            } else {
                axis.color()
            };

            match self.mode {
                GizmoMode::Translate => {
                    let dir = self.axis_dir(axis);
                    let tip = center + dir * len;
                    out.push(Segment { a: center, b: tip, color });

                    // Small tick across the tip so the handle reads as an arrow.
                    let (o, _) = axis.others();
                    let side = self.axis_dir(o) * len * 0.06;
                    let back = tip - dir * len * 0.12;
                    out.push(Segment { a: tip, b: back + side, color });
                    out.push(Segment { a: tip, b: back - side, color });
                }
                GizmoMode::Rotate => {
                    let pts: Vec<Vec3> = self.ring_points(axis, len).collect();
                    out.extend(pts.windows(2).map(|w| Segment {
                        a: w[0],
                        b: w[1],
                        color,
                    }));
                }
            }
        }
        out
    }
}

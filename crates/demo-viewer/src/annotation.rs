//! Annotation mode: ties the gizmo to the orbit controls and the pose
//! read-out shown in the panel.
//!
//! Orbiting is disabled exactly while the gizmo is being dragged; that
//! holds across mode toggles, including switching annotation off mid-drag.

use crate::{
    camera::CameraController,
    gizmo::{Gizmo, GizmoEvent, GizmoMode, Viewport},
};
use episode::PoseReadout;
use glam::Vec2;
use winit::keyboard::{KeyCode, PhysicalKey};

/// Keyboard shortcuts honoured while annotating.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shortcut {
    Translate,
    Rotate,
    SavePose,
}

impl Shortcut {
    pub fn from_key(key: PhysicalKey) -> Option<Self> {
        match key {
            PhysicalKey::Code(KeyCode::KeyT) => Some(Shortcut::Translate),
            PhysicalKey::Code(KeyCode::KeyR) => Some(Shortcut::Rotate),
            PhysicalKey::Code(KeyCode::KeyC) => Some(Shortcut::SavePose),
            _ => None,
        }
    }
}

#[derive(Debug, Default)]
pub struct Annotation {
    pub gizmo: Gizmo,
    readout: PoseReadout,
}

impl Annotation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn enabled(&self) -> bool {
        self.gizmo.enabled()
    }

    pub fn readout(&self) -> PoseReadout {
        self.readout
    }

    pub fn set_enabled(&mut self, enabled: bool, orbit: &mut CameraController) {
        let events = self.gizmo.set_enabled(enabled);
        self.apply(events, orbit);
    }

    /// Applies a shortcut. Returns `true` when the key asks for the pose to
    /// be saved. Every shortcut is ignored while annotation is off.
    pub fn handle_shortcut(&mut self, shortcut: Shortcut) -> bool {
        if !self.enabled() {
            return false;
        }
        match shortcut {
            Shortcut::Translate => {
                self.gizmo.set_mode(GizmoMode::Translate);
                false
            }
            Shortcut::Rotate => {
                self.gizmo.set_mode(GizmoMode::Rotate);
                false
            }
            Shortcut::SavePose => true,
        }
    }

    /// Returns `true` when the press landed on a handle and the camera must
    /// not see it.
    pub fn pointer_pressed(
        &mut self,
        vp: &Viewport,
        cursor: Vec2,
        orbit: &mut CameraController,
    ) -> bool {
        let events = self.gizmo.pointer_pressed(vp, cursor);
        self.apply(events, orbit);
        self.gizmo.is_dragging()
    }

    pub fn pointer_moved(&mut self, vp: &Viewport, cursor: Vec2, orbit: &mut CameraController) {
        let events = self.gizmo.pointer_moved(vp, cursor);
        self.apply(events, orbit);
    }

    /// Returns `true` when a drag ended.
    pub fn pointer_released(&mut self, orbit: &mut CameraController) -> bool {
        let events = self.gizmo.pointer_released();
        let ended = !events.is_empty();
        self.apply(events, orbit);
        ended
    }

    fn apply(&mut self, events: Vec<GizmoEvent>, orbit: &mut CameraController) {
        for event in events {
            match event {
                GizmoEvent::Changed(pose) => self.readout = pose.readout(),
                GizmoEvent::DraggingChanged(dragging) => {
                    orbit.enabled = !dragging;
                    if dragging {
                        orbit.release_buttons();
                    }
                    log::debug!("Gizmo dragging: {dragging}");
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::camera::{Camera, UpAxis};
    use glam::Vec3;

    fn viewport() -> Viewport {
        let mut cam = Camera::looking_at(Vec3::new(0.0, 0.0, 5.0), Vec3::ZERO, UpAxis::Y, 1.0);
        cam.fov_y_rad = 60f32.to_radians();
        Viewport::new(&cam, Vec2::new(800.0, 800.0))
    }

    const ON_X_HANDLE: Vec2 = Vec2::new(470.0, 400.0);

    #[test]
    fn toggling_enables_gizmo_without_locking_orbit() {
        let mut ann = Annotation::new();
        let mut orbit = CameraController::new();

        ann.set_enabled(true, &mut orbit);
        assert!(ann.gizmo.enabled());
        assert!(orbit.enabled);

        ann.set_enabled(false, &mut orbit);
        assert!(!ann.gizmo.enabled());
        assert!(orbit.enabled);
    }

    #[test]
    fn drag_locks_orbit_until_release() {
        let mut ann = Annotation::new();
        let mut orbit = CameraController::new();
        let vp = viewport();
        ann.set_enabled(true, &mut orbit);

        assert!(ann.pointer_pressed(&vp, ON_X_HANDLE, &mut orbit));
        assert!(!orbit.enabled);

        ann.pointer_moved(&vp, Vec2::new(540.0, 400.0), &mut orbit);
        assert!(ann.readout().x > 0.4);

        assert!(ann.pointer_released(&mut orbit));
        assert!(orbit.enabled);
    }

    #[test]
    fn switching_off_mid_drag_unlocks_orbit() {
        let mut ann = Annotation::new();
        let mut orbit = CameraController::new();
        let vp = viewport();
        ann.set_enabled(true, &mut orbit);
        ann.pointer_pressed(&vp, ON_X_HANDLE, &mut orbit);
        assert!(!orbit.enabled);

        ann.set_enabled(false, &mut orbit);
        assert!(orbit.enabled);
        assert!(!ann.gizmo.is_dragging());
        assert!(!ann.pointer_released(&mut orbit));
    }

    #[test]
    fn presses_off_handle_reach_the_camera() {
        let mut ann = Annotation::new();
        let mut orbit = CameraController::new();
        let vp = viewport();

        assert!(!ann.pointer_pressed(&vp, ON_X_HANDLE, &mut orbit));
        ann.set_enabled(true, &mut orbit);
        assert!(!ann.pointer_pressed(&vp, Vec2::new(10.0, 10.0), &mut orbit));
        assert!(orbit.enabled);
    }

    #[test]
    fn shortcuts_only_work_while_annotating() {
        let mut ann = Annotation::new();
        let mut orbit = CameraController::new();

        assert!(!ann.handle_shortcut(Shortcut::SavePose));
        ann.handle_shortcut(Shortcut::Rotate);
        assert_eq!(ann.gizmo.mode(), GizmoMode::Translate);

        ann.set_enabled(true, &mut orbit);
        ann.handle_shortcut(Shortcut::Rotate);
        assert_eq!(ann.gizmo.mode(), GizmoMode::Rotate);
        ann.handle_shortcut(Shortcut::Translate);
        assert_eq!(ann.gizmo.mode(), GizmoMode::Translate);
        assert!(ann.handle_shortcut(Shortcut::SavePose));
    }

    #[test]
    fn key_mapping() {
        assert_eq!(
            Shortcut::from_key(PhysicalKey::Code(KeyCode::KeyR)),
            Some(Shortcut::Rotate)
        );
        assert_eq!(Shortcut::from_key(PhysicalKey::Code(KeyCode::KeyQ)), None);
    }
}

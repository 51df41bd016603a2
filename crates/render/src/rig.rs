use crate::camera::PerspectiveCamera;
use crate::orbit::OrbitControls;
use glam::Vec3;
use lanescape_common::CameraSlot;
use lanescape_input::Action;

/// Starting position for each slot, in [`CameraSlot::ALL`] order.
pub const CAMERA_POSITIONS: [Vec3; 3] = [
    Vec3::new(-5.0, 5.0, 2.0),
    Vec3::new(2.0, 2.0, 5.0),
    Vec3::new(0.0, 7.0, 0.0),
];

/// The three cameras plus the one set of orbit controls they share.
///
/// Only the active camera is steered. The others keep whatever pose they had
/// when control moved away, so a camera that was never selected still looks
/// down −Z from its starting position.
#[derive(Debug, Clone)]
pub struct CameraRig {
    cameras: [PerspectiveCamera; 3],
    controls: OrbitControls,
    active: CameraSlot,
}

impl Default for CameraRig {
    fn default() -> Self {
        Self::new()
    }
}

impl CameraRig {
    pub fn new() -> Self {
        let mut rig = Self {
            cameras: CAMERA_POSITIONS.map(PerspectiveCamera::at),
            controls: OrbitControls::new(),
            active: CameraSlot::Center,
        };
        rig.update();
        rig
    }

    pub fn active(&self) -> CameraSlot {
        self.active
    }

    pub fn camera(&self, slot: CameraSlot) -> &PerspectiveCamera {
        &self.cameras[slot.index()]
    }

    pub fn cameras(&self) -> impl Iterator<Item = (CameraSlot, &PerspectiveCamera)> {
        CameraSlot::ALL.into_iter().zip(self.cameras.iter())
    }

    pub fn controls(&self) -> &OrbitControls {
        &self.controls
    }

    /// Hand the orbit controls to `slot`. Returns `false` if it already had them.
    pub fn select(&mut self, slot: CameraSlot) -> bool {
        if slot == self.active {
            return false;
        }
        self.active = slot;
        self.update();
        tracing::info!("control locked onto {slot} camera");
        true
    }

    /// Apply one input action. `viewport_height` scales drag rotation.
    pub fn apply(&mut self, action: Action, viewport_height: f32) {
        match action {
            Action::SelectCamera(slot) => {
                self.select(slot);
            }
            Action::Orbit { dx, dy } => self.controls.rotate(dx, dy, viewport_height),
            Action::Zoom(amount) => self.controls.zoom(amount),
            Action::Release => {}
        }
    }

    /// Step the active camera's controls once.
    pub fn update(&mut self) -> bool {
        let camera = &mut self.cameras[self.active.index()];
        self.controls.update(camera)
    }

    /// Force every camera's aspect ratio, e.g. to match square viewports.
    pub fn set_aspect(&mut self, aspect: f32) {
        for camera in &mut self.cameras {
            camera.aspect = aspect;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_on_center_looking_at_origin() {
        let rig = CameraRig::new();
        assert_eq!(rig.active(), CameraSlot::Center);
        let center = rig.camera(CameraSlot::Center);
        let to_origin = (-center.position).normalize();
        assert!((center.forward() - to_origin).length() < 1e-4);
    }

    #[test]
    fn unselected_cameras_face_down_the_road() {
        let rig = CameraRig::new();
        for slot in [CameraSlot::Left, CameraSlot::Right] {
            let cam = rig.camera(slot);
            assert_eq!(cam.position, CAMERA_POSITIONS[slot.index()]);
            assert!((cam.forward() - Vec3::NEG_Z).length() < 1e-6);
        }
    }

    #[test]
    fn select_switches_once() {
        let mut rig = CameraRig::new();
        assert!(rig.select(CameraSlot::Left));
        assert!(!rig.select(CameraSlot::Left));
        assert_eq!(rig.active(), CameraSlot::Left);
        let left = rig.camera(CameraSlot::Left);
        assert!((left.forward() - (-left.position).normalize()).length() < 1e-4);
    }

    #[test]
    fn orbit_moves_only_the_active_camera() {
        let mut rig = CameraRig::new();
        rig.apply(Action::SelectCamera(CameraSlot::Right), 400.0);
        let center_before = *rig.camera(CameraSlot::Center);
        let right_before = rig.camera(CameraSlot::Right).position;

        rig.apply(Action::Orbit { dx: 120.0, dy: -60.0 }, 400.0);
        for _ in 0..30 {
            rig.update();
        }
        assert_eq!(*rig.camera(CameraSlot::Center), center_before);
        assert_ne!(rig.camera(CameraSlot::Right).position, right_before);
    }

    #[test]
    fn aspect_applies_to_all() {
        let mut rig = CameraRig::new();
        rig.set_aspect(1.0);
        assert!(rig.cameras().all(|(_, c)| c.aspect == 1.0));
    }
}

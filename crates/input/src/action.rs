use lanescape_common::CameraSlot;

/// A high-level camera action produced from pointer input.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Action {
    /// Attach the orbit controls to the camera in this slot.
    SelectCamera(CameraSlot),
    /// Rotate the active camera by a pointer drag, in pixels.
    Orbit { dx: f32, dy: f32 },
    /// Dolly the active camera. Positive values move away from the target.
    Zoom(f32),
    /// The drag ended.
    Release,
}

impl Action {
    /// Whether the action changes the active camera's pose.
    pub fn moves_camera(&self) -> bool {
        matches!(self, Action::Orbit { .. } | Action::Zoom(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn select_carries_slot() {
        let a = Action::SelectCamera(CameraSlot::Right);
        assert!(matches!(a, Action::SelectCamera(CameraSlot::Right)));
        assert!(!a.moves_camera());
    }

    #[test]
    fn orbit_and_zoom_move_camera() {
        assert!(Action::Orbit { dx: 1.0, dy: 0.0 }.moves_camera());
        assert!(Action::Zoom(-1.0).moves_camera());
        assert!(!Action::Release.moves_camera());
    }
}

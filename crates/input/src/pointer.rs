use crate::action::Action;
use glam::Vec2;
use lanescape_common::CameraSlot;

/// Camera slot under a pointer at `x` in a window `width` pixels wide.
///
/// The window splits into equal thirds: left, center, right. A window with
/// no width picks the center camera.
pub fn slot_at(x: f32, width: f32) -> CameraSlot {
    if width.is_nan() || width <= 0.0 {
        return CameraSlot::Center;
    }
    if x < width / 3.0 {
        CameraSlot::Left
    } else if x < 2.0 * width / 3.0 {
        CameraSlot::Center
    } else {
        CameraSlot::Right
    }
}

/// Turns raw pointer events into [`Action`]s.
///
/// Tracks the cursor and whether the primary button is held. Motion only
/// produces an orbit while a drag is in progress.
#[derive(Debug, Clone, Default)]
pub struct PointerTracker {
    cursor: Option<Vec2>,
    dragging: bool,
}

impl PointerTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cursor(&self) -> Option<Vec2> {
        self.cursor
    }

    pub fn is_dragging(&self) -> bool {
        self.dragging
    }

    /// Primary button pressed. Selects the camera under the cursor and starts a drag.
    ///
    /// Returns `None` if the cursor position is not yet known.
    pub fn press(&mut self, window_width: f32) -> Option<Action> {
        let cursor = self.cursor?;
        self.dragging = true;
        let slot = slot_at(cursor.x, window_width);
        tracing::debug!(x = cursor.x, %slot, "pointer down");
        Some(Action::SelectCamera(slot))
    }

    /// Primary button released.
    pub fn release(&mut self) -> Option<Action> {
        if !self.dragging {
            return None;
        }
        self.dragging = false;
        Some(Action::Release)
    }

    /// Cursor moved to `position` (window pixels).
    pub fn moved(&mut self, position: Vec2) -> Option<Action> {
        let previous = self.cursor.replace(position);
        if !self.dragging {
            return None;
        }
        let delta = position - previous?;
        if delta == Vec2::ZERO {
            return None;
        }
        Some(Action::Orbit { dx: delta.x, dy: delta.y })
    }

    /// Cursor left the window. Any drag in progress ends.
    pub fn left(&mut self) -> Option<Action> {
        self.cursor = None;
        self.release()
    }

    /// Wheel scrolled by `lines`; positive is away from the user.
    pub fn wheel(&self, lines: f32) -> Option<Action> {
        if lines == 0.0 || !lines.is_finite() {
            return None;
        }
        // Scrolling away zooms in, which is a negative dolly
        Some(Action::Zoom(-lines))
    }

    /// Wheel movement reported in pixels, as trackpads do. Only the
    /// direction counts; horizontal-only and idle momentum events carry a
    /// zero vertical delta and do not zoom.
    pub fn wheel_pixels(&self, dy: f64) -> Option<Action> {
        if dy == 0.0 || !dy.is_finite() {
            return None;
        }
        self.wheel(dy.signum() as f32)
    }
}

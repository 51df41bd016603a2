use lanescape_common::CameraSlot;

/// Gap between the viewports and around the outer edges, in pixels.
pub const MARGIN: f32 = 20.0;

/// A square sub-rectangle of the surface showing one camera.
///
/// Coordinates are in physical pixels from the top-left corner.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub slot: CameraSlot,
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Viewport {
    pub fn aspect(&self) -> f32 {
        self.width / self.height
    }

    /// Integer scissor rectangle `(x, y, width, height)` clipped to the surface.
    ///
    /// `None` when nothing of the viewport is left on screen.
    pub fn scissor(&self, surface_width: u32, surface_height: u32) -> Option<(u32, u32, u32, u32)> {
        let x0 = self.x.floor().max(0.0) as u32;
        let y0 = self.y.floor().max(0.0) as u32;
        let x1 = ((self.x + self.width).ceil().max(0.0) as u32).min(surface_width);
        let y1 = ((self.y + self.height).ceil().max(0.0) as u32).min(surface_height);
        if x1 <= x0 || y1 <= y0 {
            return None;
        }
        Some((x0, y0, x1 - x0, y1 - y0))
    }

    pub fn contains(&self, x: f32, y: f32) -> bool {
        x >= self.x && x < self.x + self.width && y >= self.y && y < self.y + self.height
    }
}

/// Three equal squares side by side, vertically centred.
///
/// Square size is `(width − 4·MARGIN) / 3`, shrunk to the surface height when
/// the window is wide and short. A surface too narrow for any square yields
/// no viewports.
pub fn layout(width: u32, height: u32) -> Vec<Viewport> {
    let (w, h) = (width as f32, height as f32);
    let size = ((w - 4.0 * MARGIN) / 3.0).min(h);
    if size <= 0.0 {
        return Vec::new();
    }
    let y = (h - size) / 2.0;
    CameraSlot::ALL
        .iter()
        .enumerate()
        .map(|(i, &slot)| Viewport {
            slot,
            x: MARGIN * (i as f32 + 1.0) + size * i as f32,
            y,
            width: size,
            height: size,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wide_window_layout() {
        let views = layout(1280, 720);
        assert_eq!(views.len(), 3);
        let size = (1280.0 - 80.0) / 3.0;
        for (i, v) in views.iter().enumerate() {
            assert_eq!(v.slot, CameraSlot::ALL[i]);
            assert_eq!(v.width, size);
            assert_eq!(v.height, size);
            assert_eq!(v.aspect(), 1.0);
            assert_eq!(v.y, (720.0 - size) / 2.0);
        }
        assert_eq!(views[0].x, 20.0);
        assert_eq!(views[1].x, 40.0 + size);
        assert_eq!(views[2].x, 60.0 + 2.0 * size);
    }

    #[test]
    fn viewports_do_not_overlap_and_stay_inside() {
        for (w, h) in [(1280, 720), (1920, 400), (300, 900), (81, 50)] {
            let views = layout(w, h);
            for pair in views.windows(2) {
                assert!(pair[0].x + pair[0].width <= pair[1].x);
            }
            for v in &views {
                assert!(v.x >= 0.0 && v.y >= 0.0);
                assert!(v.x + v.width <= w as f32);
                assert!(v.y + v.height <= h as f32);
            }
        }
    }

    #[test]
    fn short_window_shrinks_to_height() {
        let views = layout(1920, 400);
        assert_eq!(views[0].height, 400.0);
        assert_eq!(views[0].y, 0.0);
    }

    #[test]
    fn degenerate_surface_has_no_viewports() {
        assert!(layout(80, 600).is_empty());
        assert!(layout(0, 0).is_empty());
        assert!(layout(600, 0).is_empty());
    }

    #[test]
    fn scissor_clips_to_surface() {
        let v = Viewport { slot: CameraSlot::Left, x: -5.5, y: 10.2, width: 100.0, height: 100.0 };
        assert_eq!(v.scissor(50, 80), Some((0, 10, 50, 70)));
        let off = Viewport { slot: CameraSlot::Left, x: 200.0, y: 0.0, width: 10.0, height: 10.0 };
        assert_eq!(off.scissor(100, 100), None);
    }

    #[test]
    fn contains_is_half_open() {
        let v = layout(1280, 720)[1];
        assert!(v.contains(v.x, v.y));
        assert!(!v.contains(v.x + v.width, v.y));
    }
}

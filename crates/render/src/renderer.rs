use crate::camera::PerspectiveCamera;
use crate::rig::CameraRig;
use crate::viewport::{self, Viewport};
use lanescape_common::{CameraSlot, Category};
use lanescape_world::World;
use std::fmt::Write;

/// One camera's pass for a frame: where on the surface it draws and from where.
#[derive(Debug, Clone, Copy)]
pub struct RenderView {
    pub slot: CameraSlot,
    pub viewport: Viewport,
    /// Copy of the slot's camera with its aspect forced to the viewport's.
    pub camera: PerspectiveCamera,
    /// Whether this camera currently owns the orbit controls.
    pub active: bool,
}

/// Lay out the three viewports for a `width × height` surface and pair each
/// with its camera. Empty when the surface is too small to show anything.
pub fn frame_views(rig: &CameraRig, width: u32, height: u32) -> Vec<RenderView> {
    viewport::layout(width, height)
        .into_iter()
        .map(|viewport| {
            let mut camera = *rig.camera(viewport.slot);
            camera.aspect = viewport.aspect();
            RenderView {
                slot: viewport.slot,
                viewport,
                camera,
                active: viewport.slot == rig.active(),
            }
        })
        .collect()
}

/// Renderer-agnostic interface. All renderers implement this trait.
///
/// A renderer reads the world and the frame's views and produces output. It
/// never mutates the world.
pub trait Renderer {
    /// The output type produced by this renderer.
    type Output;

    /// Render one frame of `world` through every view.
    fn render(&self, world: &World, views: &[RenderView]) -> Self::Output;
}

/// Plain-text renderer for the CLI, logs and tests.
#[derive(Debug, Default)]
pub struct DebugTextRenderer;

impl DebugTextRenderer {
    pub fn new() -> Self {
        Self
    }
}

impl Renderer for DebugTextRenderer {
    type Output = String;

    fn render(&self, world: &World, views: &[RenderView]) -> String {
        let mut out = String::new();
        let _ = writeln!(
            out,
            "=== Road (frame={}, t={:.2}s, travelled={:.1}) ===",
            world.frames(),
            world.elapsed(),
            world.travelled()
        );
        let _ = writeln!(out, "Instances: {}", world.instance_count());

        for category in Category::ALL {
            let material = world.material(category);
            match world.train(category) {
                Some(train) => {
                    let (near, far) = train
                        .z_range()
                        .map(|(lo, hi)| (hi, lo))
                        .unwrap_or((0.0, 0.0));
                    let _ = writeln!(
                        out,
                        "  {category:<14} n={:<4} z=[{far:.2}, {near:.2}] wrap={:.2} color={}",
                        train.len(),
                        train.wrap_length(),
                        material.color
                    );
                }
                None => {
                    let p = world.rider().transform().position;
                    let _ = writeln!(
                        out,
                        "  {category:<14} pos=({:.3}, {:.3}, {:.3}) lean={:.4} color={}",
                        p.x,
                        p.y,
                        p.z,
                        world.rider().lean(),
                        material.color
                    );
                }
            }
        }

        for view in views {
            let v = &view.viewport;
            let e = view.camera.position;
            let _ = writeln!(
                out,
                "Viewport {}{}: x={:.1} y={:.1} size={:.1} eye=({:.2}, {:.2}, {:.2})",
                view.slot,
                if view.active { " *" } else { "" },
                v.x,
                v.y,
                v.width,
                e.x,
                e.y,
                e.z
            );
        }

        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lanescape_world::SceneConfig;

    #[test]
    fn views_follow_layout_and_rig() {
        let rig = CameraRig::new();
        let views = frame_views(&rig, 1280, 720);
        assert_eq!(views.len(), 3);
        assert!(views.iter().all(|v| v.camera.aspect == 1.0));
        let active: Vec<_> = views.iter().filter(|v| v.active).map(|v| v.slot).collect();
        assert_eq!(active, vec![CameraSlot::Center]);
    }

    #[test]
    fn tiny_surface_has_no_views() {
        assert!(frame_views(&CameraRig::new(), 60, 60).is_empty());
    }

    #[test]
    fn debug_renderer_lists_categories_and_views() {
        let world = World::build(SceneConfig::default()).unwrap();
        let rig = CameraRig::new();
        let views = frame_views(&rig, 1280, 720);
        let output = DebugTextRenderer::new().render(&world, &views);

        assert!(output.contains("frame=0"));
        assert!(output.contains(&format!("Instances: {}", world.instance_count())));
        for category in Category::ALL {
            assert!(output.contains(category.name()), "missing {category}");
        }
        assert!(output.contains("Viewport Center *"));
        assert!(output.contains("Viewport Left:"));
    }
}

//! Renderer-agnostic view logic: cameras, shared orbit controls, the
//! three-viewport layout and the renderer interface.
//!
//! # Invariants
//! - Renderers never mutate the world.
//! - Only the active camera is stepped by the orbit controls.
//! - Viewports are square, vertically centred and never overlap.

mod camera;
mod orbit;
mod renderer;
mod rig;
mod viewport;

pub use camera::PerspectiveCamera;
pub use orbit::OrbitControls;
pub use renderer::{DebugTextRenderer, RenderView, Renderer, frame_views};
pub use rig::{CAMERA_POSITIONS, CameraRig};
pub use viewport::{MARGIN, Viewport, layout};

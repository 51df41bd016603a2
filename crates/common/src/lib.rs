//! Shared vocabulary for the lanescape crates.

mod color;
mod types;

pub use color::{Color, ColorError};
pub use types::{CameraSlot, Category, Transform};

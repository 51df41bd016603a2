//! Road scene state: the tile trains that scroll towards the viewer, the
//! swaying rider and the YAML scene config they are built from.
//!
//! # Invariants
//! - The instance set is fixed at build time; updates only move instances.
//! - After any update, every scrolling instance lies in
//!   `(recycle_z - wrap_length, recycle_z]` for its train.

pub mod config;
pub mod rider;
pub mod scene;
pub mod world;

pub use config::{AtmosphereConfig, ConfigError, MAX_TERRAIN_SEGMENTS, SceneConfig};
pub use rider::Rider;
pub use scene::scene_meshes;
pub use world::{FrameStats, Material, TileTrain, World};

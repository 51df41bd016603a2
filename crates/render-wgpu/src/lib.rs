//! wgpu render backend for the road scene.
//!
//! Uploads every distinct mesh once, batches world instances by mesh and
//! draws the three camera viewports inside one render pass.
//!
//! # Invariants
//! - Renderer never mutates world state.
//! - Categories that share a mesh share its GPU buffers and its batch.

mod gpu;
mod shaders;

pub use gpu::WgpuRenderer;

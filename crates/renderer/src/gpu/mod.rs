//! wgpu implementation of `RenderBackend`.
//!
//! - `context` owns the wgpu instance, device and swapchain for the window.
//! - `backing` is the offscreen texture sized to the backing-store
//!   resolution; the cloud program draws into it.
//! - `pipeline` builds the cloud pipeline from adapted GLSL plus the blit
//!   pipeline that stretches the backing store over the swapchain.
//! - `uniforms` mirrors the std140 block the shader prelude declares.
//! - `state` glues everything together as `GpuBackend`.

mod backing;
mod context;
mod pipeline;
mod state;
mod uniforms;

pub use state::{GpuBackend, GpuProgram, GpuShader};

//! Renderer crate for cloudpaper.
//!
//! Draws an animated cloud layer with one full-screen shader pass. The flow:
//!
//! ```text
//!   cloudpaper CLI
//!          │ RendererConfig
//!          ▼
//!   Renderer::run ──▶ CloudBackground::setup ──▶ load_program (fetch, compile, link)
//!          │
//!          └─▶ winit event loop ──▶ DisplayTicker ──▶ CloudBackground::step
//!                                                         │
//!                                      resize ◀───────────┤
//!                                      FrameUniforms ◀────┘──▶ RenderBackend
//! ```
//!
//! `CloudBackground` is generic over `RenderBackend` and `Clock`, so everything
//! except the wgpu backend and the window host runs under unit tests with a
//! recording backend and a manual clock.

mod backend;
mod compile;
mod driver;
mod gpu;
mod loader;
mod runtime;
mod surface;
mod types;
mod uniforms;
mod window;

#[cfg(test)]
mod stub;

pub use backend::{
    AttributeBinding, BlendMode, LayerStyle, PointerEvents, ProgramLayout, RenderBackend,
    ShaderStage, Uniform, UniformValue, VertexLayout, POSITION_ATTRIBUTE,
};
pub use compile::{adapt_glsl, check_glsl};
pub use driver::{
    CloudBackground, DriverState, FrameGate, FrameOutcome, RefreshScheduler, SetupError,
};
pub use gpu::{GpuBackend, GpuProgram, GpuShader};
pub use loader::{load_program, ProgramHandle, FULLSCREEN_TRIANGLE, FULLSCREEN_VERTEX_COUNT};
pub use runtime::{Clock, ManualClock, SystemClock};
pub use surface::{backing_store_size, effective_dpr, SurfaceManager, ViewportMetrics};
pub use types::RendererConfig;
pub use uniforms::{sun_direction, wind_vector, FrameUniforms};
pub use window::Renderer;

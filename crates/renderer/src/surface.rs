use tracing::debug;

use crate::backend::{LayerStyle, RenderBackend};

/// Logical viewport size plus the scale factor the display reports.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewportMetrics {
    pub width: f64,
    pub height: f64,
    pub device_pixel_ratio: f64,
}

impl ViewportMetrics {
    pub fn new(width: f64, height: f64, device_pixel_ratio: f64) -> Self {
        Self {
            width,
            height,
            device_pixel_ratio,
        }
    }
}

/// Scale from logical viewport pixels to backing-store pixels.
///
/// A device pixel ratio that is not a positive finite number counts as 1.
pub fn effective_dpr(device_pixel_ratio: f64, target_dpr: f32, render_scale: f32) -> f64 {
    let device = if device_pixel_ratio.is_finite() && device_pixel_ratio > 0.0 {
        device_pixel_ratio
    } else {
        1.0
    };
    device.min(f64::from(target_dpr)) * f64::from(render_scale)
}

pub fn backing_store_size(
    viewport: ViewportMetrics,
    target_dpr: f32,
    render_scale: f32,
) -> (u32, u32) {
    let dpr = effective_dpr(viewport.device_pixel_ratio, target_dpr, render_scale);
    let width = (viewport.width * dpr).floor().max(0.0) as u32;
    let height = (viewport.height * dpr).floor().max(0.0) as u32;
    (width, height)
}

/// Keeps the backing store in step with the viewport.
#[derive(Debug, Clone)]
pub struct SurfaceManager {
    target_dpr: f32,
    render_scale: f32,
}

impl SurfaceManager {
    pub fn new(target_dpr: f32, render_scale: f32) -> Self {
        Self {
            target_dpr,
            render_scale,
        }
    }

    pub fn apply_style<B: RenderBackend>(&self, backend: &mut B) {
        backend.apply_layer_style(&LayerStyle::background());
    }

    /// Recomputes the backing-store size; returns `true` when the surface was
    /// reallocated.
    pub fn resize<B: RenderBackend>(&mut self, backend: &mut B, viewport: ViewportMetrics) -> bool {
        let (width, height) = backing_store_size(viewport, self.target_dpr, self.render_scale);
        if backend.backing_store_size() == (width, height) {
            return false;
        }

        debug!(
            width,
            height,
            viewport_width = viewport.width,
            viewport_height = viewport.height,
            dpr = viewport.device_pixel_ratio,
            "resizing backing store"
        );
        backend.set_backing_store_size(width, height);
        backend.set_display_size(viewport.width, viewport.height);
        backend.set_viewport(0, 0, width, height);
        true
    }
}

use cloudconfig::CloudConfig;

use crate::backend::{RenderBackend, Uniform, UniformValue};

/// Wind drift for one frame: the configured direction normalised to unit
/// length and scaled by `speed`. A zero-length direction falls back to the
/// x axis so the magnitude always equals `speed`.
pub fn wind_vector(direction: [f32; 2], speed: f32) -> [f32; 2] {
    let length = direction[0].hypot(direction[1]);
    if length == 0.0 || !length.is_finite() {
        return [speed, 0.0];
    }
    [direction[0] / length * speed, direction[1] / length * speed]
}

/// Unit vector pointing towards the sun at `t` seconds.
///
/// The sun bobs in elevation and slowly walks in azimuth; the result is
/// negated because the shaders expect the direction towards the light.
pub fn sun_direction(t: f64) -> [f32; 3] {
    let float_time = t * 0.02;
    let elevation = 0.8 - 0.15 * (float_time * 0.2).cos();
    let azimuth = float_time * 0.05;
    let x = elevation.cos() * azimuth.cos();
    let y = elevation.sin();
    let z = elevation.cos() * azimuth.sin();
    [-x as f32, -y as f32, -z as f32]
}

/// Every shader input for one frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameUniforms {
    pub time: f32,
    pub resolution: [f32; 2],
    pub wind: [f32; 2],
    pub sun_dir: [f32; 3],
    pub sun_color: [f32; 3],
    pub coverage: f32,
    pub density: f32,
    pub thickness: f32,
    pub scale: f32,
    pub light_absorption: f32,
}

impl FrameUniforms {
    pub fn compute(config: &CloudConfig, t: f64, resolution: (u32, u32)) -> Self {
        Self {
            time: t as f32,
            resolution: [resolution.0 as f32, resolution.1 as f32],
            wind: wind_vector(config.wind_dir, config.wind_speed),
            sun_dir: sun_direction(t),
            sun_color: config.sun_color,
            coverage: config.coverage,
            density: config.density,
            thickness: config.thickness,
            scale: config.scale,
            light_absorption: config.light_absorption,
        }
    }

    pub fn value(&self, uniform: Uniform) -> UniformValue {
        match uniform {
            Uniform::Time => UniformValue::Float(self.time),
            Uniform::Resolution => UniformValue::Vec2(self.resolution),
            Uniform::Wind => UniformValue::Vec2(self.wind),
            Uniform::SunDir => UniformValue::Vec3(self.sun_dir),
            Uniform::SunColor => UniformValue::Vec3(self.sun_color),
            Uniform::Coverage => UniformValue::Float(self.coverage),
            Uniform::Density => UniformValue::Float(self.density),
            Uniform::Thickness => UniformValue::Float(self.thickness),
            Uniform::Scale => UniformValue::Float(self.scale),
            Uniform::LightAbsorption => UniformValue::Float(self.light_absorption),
        }
    }

    pub fn upload<B: RenderBackend>(&self, backend: &mut B) {
        for uniform in Uniform::ALL {
            backend.set_uniform(uniform, self.value(uniform));
        }
    }
}

use bytemuck::{Pod, Zeroable};
use tracing::warn;

use crate::backend::{Uniform, UniformValue};

/// CPU mirror of the `CloudpaperParams` std140 block declared by the shader
/// prelude in `compile`.
///
/// Every vec3 is followed by a scalar so the std140 rules add no padding and
/// `repr(C)` matches the GPU layout byte for byte.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable)]
pub(crate) struct CloudUniforms {
    pub resolution: [f32; 2],
    pub wind: [f32; 2],
    pub sun_dir: [f32; 3],
    pub time: f32,
    pub sun_color: [f32; 3],
    pub coverage: f32,
    pub density: f32,
    pub thickness: f32,
    pub scale: f32,
    pub light_absorption: f32,
}

impl CloudUniforms {
    pub const SIZE: u64 = std::mem::size_of::<Self>() as u64;

    /// Stores one named value. Values of the wrong shape are dropped.
    pub fn set(&mut self, uniform: Uniform, value: UniformValue) -> bool {
        match (uniform, value) {
            (Uniform::Time, UniformValue::Float(v)) => self.time = v,
            (Uniform::Coverage, UniformValue::Float(v)) => self.coverage = v,
            (Uniform::Density, UniformValue::Float(v)) => self.density = v,
            (Uniform::Thickness, UniformValue::Float(v)) => self.thickness = v,
            (Uniform::Scale, UniformValue::Float(v)) => self.scale = v,
            (Uniform::LightAbsorption, UniformValue::Float(v)) => self.light_absorption = v,
            (Uniform::Resolution, UniformValue::Vec2(v)) => self.resolution = v,
            (Uniform::Wind, UniformValue::Vec2(v)) => self.wind = v,
            (Uniform::SunDir, UniformValue::Vec3(v)) => self.sun_dir = v,
            (Uniform::SunColor, UniformValue::Vec3(v)) => self.sun_color = v,
            (uniform, value) => {
                warn!(name = uniform.name(), ?value, "uniform value has the wrong type");
                return false;
            }
        }
        true
    }
}

//! Drawing-context contract consumed by the cloud driver.
//!
//! `RenderBackend` is deliberately shaped after the handful of calls the
//! driver makes: size the backing store, compile and link two shader stages,
//! upload one static vertex buffer, then per frame clear, set named uniforms
//! and draw. The wgpu implementation lives in `gpu`; unit tests drive the
//! same code through a recording stub.

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShaderStage {
    Vertex,
    Fragment,
}

impl fmt::Display for ShaderStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShaderStage::Vertex => f.write_str("vertex"),
            ShaderStage::Fragment => f.write_str("fragment"),
        }
    }
}

/// Shader inputs written by the uniform scheduler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Uniform {
    Time,
    Resolution,
    Wind,
    SunDir,
    SunColor,
    Coverage,
    Density,
    Thickness,
    Scale,
    LightAbsorption,
}

impl Uniform {
    pub const ALL: [Uniform; 10] = [
        Uniform::Time,
        Uniform::Resolution,
        Uniform::Wind,
        Uniform::SunDir,
        Uniform::SunColor,
        Uniform::Coverage,
        Uniform::Density,
        Uniform::Thickness,
        Uniform::Scale,
        Uniform::LightAbsorption,
    ];

    /// Name the shader sources declare this input under.
    pub fn name(self) -> &'static str {
        match self {
            Uniform::Time => "u_time",
            Uniform::Resolution => "u_resolution",
            Uniform::Wind => "u_wind",
            Uniform::SunDir => "u_sunDir",
            Uniform::SunColor => "u_sunColor",
            Uniform::Coverage => "u_coverage",
            Uniform::Density => "u_density",
            Uniform::Thickness => "u_thickness",
            Uniform::Scale => "u_scale",
            Uniform::LightAbsorption => "u_lightAbsorption",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|uniform| uniform.name() == name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum UniformValue {
    Float(f32),
    Vec2([f32; 2]),
    Vec3([f32; 3]),
}

/// Fixed attribute slot bound before linking.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AttributeBinding {
    pub location: u32,
    pub name: &'static str,
}

/// The full-screen triangle's position attribute.
pub const POSITION_ATTRIBUTE: AttributeBinding = AttributeBinding {
    location: 0,
    name: "a_pos",
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlendMode {
    /// Overwrite the destination.
    Replace,
    /// `src * src_alpha + dst * (1 - src_alpha)` on colour and alpha.
    Alpha,
}

/// Float vertex attribute layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VertexLayout {
    pub components: u32,
    pub stride: u32,
    pub offset: u32,
}

impl VertexLayout {
    /// Tightly packed `vec2` positions.
    pub const fn packed_vec2() -> Self {
        Self {
            components: 2,
            stride: 2 * std::mem::size_of::<f32>() as u32,
            offset: 0,
        }
    }
}

/// Fixed-function state baked into a linked program.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProgramLayout {
    pub position: AttributeBinding,
    pub vertex: VertexLayout,
    pub blend: BlendMode,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerEvents {
    Auto,
    None,
}

/// Placement of the decorative layer relative to the rest of the desktop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LayerStyle {
    /// Pin the layer to the origin and stretch it over the whole viewport.
    pub fixed_fullscreen: bool,
    pub pointer_events: PointerEvents,
    /// Stacking order; `1` sits directly above the base layer.
    pub z_index: i32,
    pub transparent: bool,
}

impl LayerStyle {
    pub const fn background() -> Self {
        Self {
            fixed_fullscreen: true,
            pointer_events: PointerEvents::None,
            z_index: 1,
            transparent: true,
        }
    }
}

pub trait RenderBackend {
    type Shader;
    type Program;

    fn apply_layer_style(&mut self, style: &LayerStyle);

    /// Current backing-store resolution in pixels.
    fn backing_store_size(&self) -> (u32, u32);

    fn set_backing_store_size(&mut self, width: u32, height: u32);

    /// On-screen size of the layer in logical pixels.
    fn set_display_size(&mut self, width: f64, height: f64);

    fn set_viewport(&mut self, x: u32, y: u32, width: u32, height: u32);

    /// Compiles one stage. The error carries the compiler diagnostic.
    fn compile_shader(&mut self, stage: ShaderStage, source: &str) -> Result<Self::Shader, String>;

    fn delete_shader(&mut self, shader: Self::Shader);

    /// Links both stages. The error carries the linker diagnostic.
    fn link_program(
        &mut self,
        vertex: &Self::Shader,
        fragment: &Self::Shader,
        layout: &ProgramLayout,
    ) -> Result<Self::Program, String>;

    /// Uploads static vertex data bound to the position attribute.
    fn upload_vertices(&mut self, vertices: &[f32]);

    fn use_program(&mut self, program: &Self::Program);

    fn clear(&mut self, color: [f32; 4]);

    fn set_uniform(&mut self, uniform: Uniform, value: UniformValue);

    /// Draws `count` vertices starting at `first` as a triangle list.
    fn draw_triangles(&mut self, first: u32, count: u32);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uniform_names_round_trip() {
        for uniform in Uniform::ALL {
            assert_eq!(Uniform::from_name(uniform.name()), Some(uniform));
        }
        assert_eq!(Uniform::from_name("u_sundir"), None);
    }

    #[test]
    fn packed_vec2_has_eight_byte_stride() {
        let layout = VertexLayout::packed_vec2();
        assert_eq!(layout.components, 2);
        assert_eq!(layout.stride, 8);
        assert_eq!(layout.offset, 0);
    }
}

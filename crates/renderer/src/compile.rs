//! Turns WebGL-style cloud shaders into GLSL that naga and wgpu accept.
//!
//! The cloud sources are written against the classic WebGL dialect: loose
//! `uniform` declarations, `attribute`/`varying` qualifiers, `precision`
//! statements and writes to `gl_FragColor`. Before compiling we:
//!
//! 1. Drop `#version` and `precision` lines and every loose declaration of a
//!    known cloud uniform.
//! 2. Prepend [`HEADER`], which declares the std140 block backing those
//!    uniforms and maps each `u_*` name onto a block member via `#define`.
//! 3. Assign explicit locations: `a_pos` sits at 0, further attributes follow
//!    from 1, varyings are numbered in declaration order.
//! 4. In the fragment stage, route `gl_FragColor` to a declared output and
//!    remap `gl_FragCoord` to a bottom-left origin by wrapping `main`.
//!
//! [`check_glsl`] runs the naga GLSL frontend and validator over an adapted
//! source so compile errors surface as readable diagnostics instead of a
//! device-lost panic.

use wgpu::naga;

use crate::backend::{ShaderStage, Uniform, POSITION_ATTRIBUTE};

/// Uniform block shared by both stages.
///
/// Member order and types must match `gpu::uniforms::CloudUniforms`.
const HEADER: &str = r"#version 450

layout(std140, set = 0, binding = 0) uniform CloudpaperParams {
    vec2 cloudpaper_resolution;
    vec2 cloudpaper_wind;
    vec3 cloudpaper_sun_dir;
    float cloudpaper_time;
    vec3 cloudpaper_sun_color;
    float cloudpaper_coverage;
    float cloudpaper_density;
    float cloudpaper_thickness;
    float cloudpaper_scale;
    float cloudpaper_light_absorption;
} cloudpaper_params;

#define u_resolution cloudpaper_params.cloudpaper_resolution
#define u_wind cloudpaper_params.cloudpaper_wind
#define u_sunDir cloudpaper_params.cloudpaper_sun_dir
#define u_time cloudpaper_params.cloudpaper_time
#define u_sunColor cloudpaper_params.cloudpaper_sun_color
#define u_coverage cloudpaper_params.cloudpaper_coverage
#define u_density cloudpaper_params.cloudpaper_density
#define u_thickness cloudpaper_params.cloudpaper_thickness
#define u_scale cloudpaper_params.cloudpaper_scale
#define u_lightAbsorption cloudpaper_params.cloudpaper_light_absorption
";

const FRAGMENT_OUTPUTS: &str = r"
layout(location = 0) out vec4 cloudpaper_frag_color;
vec4 cloudpaper_frag_coord;
";

const FRAGMENT_FOOTER: &str = r"
void main() {
    cloudpaper_frag_coord = vec4(
        gl_FragCoord.x,
        cloudpaper_params.cloudpaper_resolution.y - gl_FragCoord.y,
        gl_FragCoord.z,
        gl_FragCoord.w
    );
    cloudpaper_frag_color = vec4(0.0);
    cloudpaper_main();
}
";

/// Rewrites one WebGL-style stage into Vulkan-flavoured GLSL 450.
pub fn adapt_glsl(stage: ShaderStage, source: &str) -> String {
    let mut body = String::with_capacity(source.len());
    let mut next_attribute = POSITION_ATTRIBUTE.location + 1;
    let mut next_varying = 0u32;

    for line in source.lines() {
        let trimmed = line.trim_start();
        if trimmed.starts_with("#version") || trimmed.starts_with("precision ") {
            continue;
        }
        if trimmed.starts_with("uniform ") && declares_cloud_uniform(trimmed) {
            continue;
        }

        if let Some(rest) = trimmed.strip_prefix("attribute ") {
            let location = if declared_name(rest) == Some(POSITION_ATTRIBUTE.name) {
                POSITION_ATTRIBUTE.location
            } else {
                let location = next_attribute;
                next_attribute += 1;
                location
            };
            body.push_str(&format!("layout(location = {location}) in {rest}\n"));
            continue;
        }

        if let Some(rest) = trimmed.strip_prefix("varying ") {
            let direction = match stage {
                ShaderStage::Vertex => "out",
                ShaderStage::Fragment => "in",
            };
            body.push_str(&format!(
                "layout(location = {next_varying}) {direction} {rest}\n"
            ));
            next_varying += 1;
            continue;
        }

        match stage {
            ShaderStage::Vertex => body.push_str(line),
            ShaderStage::Fragment => {
                let line = replace_identifier(line, "gl_FragColor", "cloudpaper_frag_color");
                let line = replace_identifier(&line, "gl_FragCoord", "cloudpaper_frag_coord");
                body.push_str(&replace_identifier(&line, "main", "cloudpaper_main"));
            }
        }
        body.push('\n');
    }

    match stage {
        ShaderStage::Vertex => format!("{HEADER}\n{body}"),
        ShaderStage::Fragment => format!("{HEADER}{FRAGMENT_OUTPUTS}\n{body}{FRAGMENT_FOOTER}"),
    }
}

/// Parses and validates an adapted stage with naga.
///
/// On failure the error carries the rendered diagnostic, including the
/// offending source line.
pub fn check_glsl(stage: ShaderStage, adapted: &str) -> Result<(), String> {
    let naga_stage = match stage {
        ShaderStage::Vertex => naga::ShaderStage::Vertex,
        ShaderStage::Fragment => naga::ShaderStage::Fragment,
    };
    let options = naga::front::glsl::Options::from(naga_stage);
    let module = naga::front::glsl::Frontend::default()
        .parse(&options, adapted)
        .map_err(|err| err.emit_to_string(adapted))?;

    naga::valid::Validator::new(
        naga::valid::ValidationFlags::all(),
        naga::valid::Capabilities::all(),
    )
    .validate(&module)
    .map_err(|err| err.emit_to_string(adapted))?;
    Ok(())
}

fn declares_cloud_uniform(declaration: &str) -> bool {
    declaration
        .split(|c: char| c.is_whitespace() || c == ';' || c == ',')
        .any(|token| Uniform::from_name(token).is_some())
}

/// Name introduced by a `type name;` declaration tail.
fn declared_name(declaration: &str) -> Option<&str> {
    declaration
        .trim_end()
        .trim_end_matches(';')
        .split_whitespace()
        .last()
}

fn is_identifier_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

/// Replaces whole-identifier occurrences of `from` with `to`.
fn replace_identifier(line: &str, from: &str, to: &str) -> String {
    let mut out = String::with_capacity(line.len());
    let mut rest = line;
    while let Some(index) = rest.find(from) {
        let before = rest[..index].chars().next_back();
        let after = rest[index + from.len()..].chars().next();
        out.push_str(&rest[..index]);
        let standalone = !before.is_some_and(is_identifier_char)
            && !after.is_some_and(is_identifier_char);
        if standalone {
            out.push_str(to);
        } else {
            out.push_str(from);
        }
        rest = &rest[index + from.len()..];
    }
    out.push_str(rest);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    const VERTEX: &str = r"
attribute vec2 a_pos;
varying vec2 v_uv;
void main() {
    v_uv = a_pos * 0.5 + 0.5;
    gl_Position = vec4(a_pos, 0.0, 1.0);
}
";

    const FRAGMENT: &str = r"
precision highp float;
uniform float u_time;
uniform vec2 u_resolution;
uniform vec3 u_sunDir;
uniform float u_coverage;
varying vec2 v_uv;
void main() {
    vec2 p = gl_FragCoord.xy / u_resolution;
    float c = u_coverage * (0.5 + 0.5 * sin(u_time + p.x));
    gl_FragColor = vec4(vec3(c) + u_sunDir * 0.0, c * v_uv.y);
}
";

    #[test]
    fn strips_loose_cloud_uniforms_and_precision() {
        let adapted = adapt_glsl(ShaderStage::Fragment, FRAGMENT);
        assert!(!adapted.contains("uniform float u_time"));
        assert!(!adapted.contains("uniform vec2 u_resolution"));
        assert!(!adapted.contains("precision highp float"));
        assert!(adapted.starts_with("#version 450"));
        assert!(adapted.contains("#define u_lightAbsorption"));
    }

    #[test]
    fn keeps_unknown_uniforms() {
        let adapted = adapt_glsl(ShaderStage::Fragment, "uniform float u_other;\n");
        assert!(adapted.contains("uniform float u_other;"));
    }

    #[test]
    fn assigns_attribute_and_varying_locations() {
        let source = "attribute vec3 a_extra;\nattribute vec2 a_pos;\n\
                      varying vec2 v_uv;\nvarying float v_fade;\n";
        let adapted = adapt_glsl(ShaderStage::Vertex, source);
        assert!(adapted.contains("layout(location = 1) in vec3 a_extra;"));
        assert!(adapted.contains("layout(location = 0) in vec2 a_pos;"));
        assert!(adapted.contains("layout(location = 0) out vec2 v_uv;"));
        assert!(adapted.contains("layout(location = 1) out float v_fade;"));

        let adapted = adapt_glsl(ShaderStage::Fragment, "varying vec2 v_uv;\n");
        assert!(adapted.contains("layout(location = 0) in vec2 v_uv;"));
    }

    #[test]
    fn routes_frag_color_and_wraps_main() {
        let adapted = adapt_glsl(ShaderStage::Fragment, FRAGMENT);
        assert!(adapted.contains("cloudpaper_frag_color = vec4(vec3(c)"));
        assert!(adapted.contains("void cloudpaper_main()"));
        assert!(adapted.contains("vec2 p = cloudpaper_frag_coord.xy"));
        assert!(adapted.contains("cloudpaper_main();"));
    }

    #[test]
    fn identifier_replacement_respects_boundaries() {
        assert_eq!(
            replace_identifier("main(); domain; main_x", "main", "m"),
            "m(); domain; main_x"
        );
        assert_eq!(replace_identifier("gl_FragColor=a;", "gl_FragColor", "o"), "o=a;");
    }

    #[test]
    fn adapted_stages_pass_naga() {
        check_glsl(ShaderStage::Vertex, &adapt_glsl(ShaderStage::Vertex, VERTEX))
            .expect("vertex stage should validate");
        check_glsl(ShaderStage::Fragment, &adapt_glsl(ShaderStage::Fragment, FRAGMENT))
            .expect("fragment stage should validate");
    }

    #[test]
    fn bundled_cloud_shaders_validate() {
        let vertex = include_str!("../../../shaders/clouds.vert.glsl");
        let fragment = include_str!("../../../shaders/clouds.frag.glsl");
        check_glsl(ShaderStage::Vertex, &adapt_glsl(ShaderStage::Vertex, vertex))
            .expect("cloud vertex stage should validate");
        check_glsl(ShaderStage::Fragment, &adapt_glsl(ShaderStage::Fragment, fragment))
            .expect("cloud fragment stage should validate");
    }

    #[test]
    fn syntax_errors_produce_diagnostics() {
        let broken = adapt_glsl(
            ShaderStage::Fragment,
            "void main() { gl_FragColor = vec4(1.0) }\n",
        );
        let log = check_glsl(ShaderStage::Fragment, &broken).unwrap_err();
        assert!(!log.is_empty());
    }
}

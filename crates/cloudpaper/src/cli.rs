use std::path::PathBuf;

use clap::Parser;
use cloudconfig::CloudConfig;

#[derive(Parser, Debug)]
#[command(
    name = "cloudpaper",
    author,
    version,
    about = "Animated cloud layer rendered behind your windows"
)]
pub struct Cli {
    /// Cloud parameter file (TOML, or JSON when the extension is `.json`).
    #[arg(long, value_name = "FILE", env = "CLOUDPAPER_CONFIG")]
    pub config: Option<PathBuf>,

    /// Directory or http(s) base URL holding `shaders/clouds.{vert,frag}.glsl`.
    #[arg(long, value_name = "DIR|URL", env = "CLOUDPAPER_ASSETS", default_value = ".")]
    pub assets: String,

    /// Name of the layer window.
    #[arg(long, value_name = "ID")]
    pub canvas_id: Option<String>,

    /// Cap on the display scale factor used for the backing store.
    #[arg(long, value_name = "RATIO", value_parser = parse_positive)]
    pub target_dpr: Option<f32>,

    /// Multiplier applied after the scale-factor cap (e.g. `0.66`).
    #[arg(long, value_name = "SCALE", value_parser = parse_positive)]
    pub render_scale: Option<f32>,

    /// Frame-rate cap (0=uncapped).
    #[arg(long, value_name = "FPS", value_parser = parse_non_negative)]
    pub fps: Option<f32>,

    /// Fraction of the sky covered by clouds.
    #[arg(long, value_name = "VALUE", value_parser = parse_finite)]
    pub coverage: Option<f32>,

    /// Cloud opacity density.
    #[arg(long, value_name = "VALUE", value_parser = parse_finite)]
    pub density: Option<f32>,

    /// Drift speed along the wind direction.
    #[arg(long, value_name = "SPEED", value_parser = parse_non_negative)]
    pub wind_speed: Option<f32>,

    /// Print the effective configuration as TOML and exit.
    #[arg(long)]
    pub print_config: bool,
}

impl Cli {
    /// Writes every flag that was given over `config`.
    pub fn apply_overrides(&self, config: &mut CloudConfig) {
        if let Some(canvas_id) = &self.canvas_id {
            config.canvas_id = canvas_id.clone();
        }
        if let Some(target_dpr) = self.target_dpr {
            config.target_dpr = target_dpr;
        }
        if let Some(render_scale) = self.render_scale {
            config.render_scale = render_scale;
        }
        if let Some(fps) = self.fps {
            config.target_fps = fps;
        }
        if let Some(coverage) = self.coverage {
            config.coverage = coverage;
        }
        if let Some(density) = self.density {
            config.density = density;
        }
        if let Some(wind_speed) = self.wind_speed {
            config.wind_speed = wind_speed;
        }
    }
}

pub fn parse() -> Cli {
    Cli::parse()
}

pub fn parse_finite(value: &str) -> Result<f32, String> {
    let parsed: f32 = value
        .trim()
        .parse()
        .map_err(|_| format!("'{value}' is not a number"))?;
    if !parsed.is_finite() {
        return Err(format!("'{value}' must be finite"));
    }
    Ok(parsed)
}

pub fn parse_positive(value: &str) -> Result<f32, String> {
    let parsed = parse_finite(value)?;
    if parsed <= 0.0 {
        return Err(format!("'{value}' must be greater than zero"));
    }
    Ok(parsed)
}

pub fn parse_non_negative(value: &str) -> Result<f32, String> {
    let parsed = parse_finite(value)?;
    if parsed < 0.0 {
        return Err(format!("'{value}' must not be negative"));
    }
    Ok(parsed)
}

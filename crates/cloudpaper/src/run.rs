use anyhow::{Context, Result};
use cloudconfig::CloudConfig;
use renderer::{Renderer, RendererConfig};
use shaderfetch::AssetRoot;
use tracing_subscriber::EnvFilter;

use crate::cli::Cli;
use crate::paths::AppPaths;

pub fn run(cli: Cli) -> Result<()> {
    let config = resolve_config(&cli)?;
    if cli.print_config {
        let rendered = config
            .to_toml_string()
            .context("failed to render configuration")?;
        print!("{rendered}");
        return Ok(());
    }

    let assets = AssetRoot::from_input(&cli.assets);
    tracing::info!(
        canvas = %config.canvas_id,
        assets = %cli.assets,
        target_fps = config.target_fps,
        render_scale = config.render_scale,
        "starting cloud layer"
    );
    Renderer::new(RendererConfig::new(config, assets)).run()
}

/// Loads the configuration file (explicit, or the default one when present)
/// and applies command-line overrides on top.
pub fn resolve_config(cli: &Cli) -> Result<CloudConfig> {
    let mut config = match cli.config.as_deref() {
        Some(path) => CloudConfig::load(path)
            .with_context(|| format!("failed to load config {}", path.display()))?,
        None => load_default_config()?,
    };
    cli.apply_overrides(&mut config);
    config.validate().context("invalid cloud configuration")?;
    Ok(config)
}

fn load_default_config() -> Result<CloudConfig> {
    let paths = match AppPaths::discover() {
        Ok(paths) => paths,
        Err(err) => {
            tracing::debug!(error = %err, "no config directory; using defaults");
            return Ok(CloudConfig::default());
        }
    };
    let path = paths.config_file();
    if !path.is_file() {
        tracing::debug!(path = %path.display(), "no config file; using defaults");
        return Ok(CloudConfig::default());
    }
    tracing::debug!(path = %path.display(), "loading config file");
    CloudConfig::load(&path).with_context(|| format!("failed to load config {}", path.display()))
}

pub fn initialise_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

#[cfg(test)]
mod tests {
    use std::fs;

    use clap::Parser;
    use tempfile::TempDir;

    use super::*;

    #[test]
    fn explicit_config_file_is_merged_with_flags() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("sky.toml");
        fs::write(&path, "coverage = 0.3\ntarget_fps = 24\n").unwrap();

        let cli = Cli::try_parse_from([
            "cloudpaper",
            "--config",
            path.to_str().unwrap(),
            "--fps",
            "60",
        ])
        .unwrap();
        let config = resolve_config(&cli).unwrap();
        assert_eq!(config.coverage, 0.3);
        assert_eq!(config.target_fps, 60.0);
    }

    #[test]
    fn missing_explicit_config_is_an_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("absent.toml");
        let cli = Cli::try_parse_from(["cloudpaper", "--config", path.to_str().unwrap()]).unwrap();
        let err = resolve_config(&cli).unwrap_err();
        assert!(format!("{err:#}").contains("absent.toml"));
    }

    #[test]
    fn invalid_values_fail_validation() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("bad.json");
        fs::write(&path, r#"{"canvasId": ""}"#).unwrap();
        let cli = Cli::try_parse_from(["cloudpaper", "--config", path.to_str().unwrap()]).unwrap();
        assert!(resolve_config(&cli).is_err());
    }
}

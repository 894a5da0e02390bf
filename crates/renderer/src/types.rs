use cloudconfig::CloudConfig;
use shaderfetch::{AssetRoot, ShaderLocations};

/// Everything `Renderer::run` needs to put the cloud layer on screen.
#[derive(Debug, Clone)]
pub struct RendererConfig {
    /// Cloud parameters; fixed for the lifetime of the layer.
    pub cloud: CloudConfig,
    /// Directory or base URL the shader sources are fetched from.
    pub assets: AssetRoot,
    /// Shader paths relative to `assets`.
    pub locations: ShaderLocations,
}

impl Default for RendererConfig {
    /// Default cloud parameters with shaders served from the working
    /// directory.
    fn default() -> Self {
        Self {
            cloud: CloudConfig::default(),
            assets: AssetRoot::from_input("."),
            locations: ShaderLocations::default(),
        }
    }
}

impl RendererConfig {
    pub fn new(cloud: CloudConfig, assets: AssetRoot) -> Self {
        Self {
            cloud,
            assets,
            locations: ShaderLocations::default(),
        }
    }

    /// Window title and application instance name.
    pub fn layer_name(&self) -> &str {
        &self.cloud.canvas_id
    }
}

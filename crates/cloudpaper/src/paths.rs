use std::env;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Result};
use directories_next::ProjectDirs;

pub const ENV_CONFIG_DIR: &str = "CLOUDPAPER_CONFIG_DIR";

const QUALIFIER: &str = "org";
const ORGANISATION: &str = "cloudpaper";
const APPLICATION: &str = "cloudpaper";

const CONFIG_FILE: &str = "clouds.toml";

#[derive(Debug, Clone)]
pub struct AppPaths {
    config_dir: PathBuf,
}

impl AppPaths {
    pub fn discover() -> Result<Self> {
        if let Some(dir) = env::var_os(ENV_CONFIG_DIR).filter(|value| !value.is_empty()) {
            return Ok(Self::from_config_dir(PathBuf::from(dir)));
        }
        let project_dirs = ProjectDirs::from(QUALIFIER, ORGANISATION, APPLICATION)
            .ok_or_else(|| anyhow!("failed to determine user directories"))?;
        Ok(Self::from_config_dir(project_dirs.config_dir().to_path_buf()))
    }

    pub fn from_config_dir(config_dir: PathBuf) -> Self {
        Self { config_dir }
    }

    pub fn config_dir(&self) -> &Path {
        &self.config_dir
    }

    /// Cloud parameter file read when `--config` is not given.
    pub fn config_file(&self) -> PathBuf {
        self.config_dir.join(CONFIG_FILE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_file_lives_in_config_dir() {
        let paths = AppPaths::from_config_dir(PathBuf::from("/tmp/cloudpaper"));
        assert_eq!(paths.config_dir(), Path::new("/tmp/cloudpaper"));
        assert_eq!(paths.config_file(), PathBuf::from("/tmp/cloudpaper/clouds.toml"));
    }
}

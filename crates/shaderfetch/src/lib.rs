mod local;
mod pair;
mod remote;

pub use local::FileFetcher;
pub use pair::{
    fetch_pair, FetchError, FetchedText, ShaderLocations, ShaderSources, SourceFetcher,
    FRAGMENT_SHADER_PATH, VERTEX_SHADER_PATH,
};
pub use remote::HttpFetcher;

use std::path::PathBuf;

use anyhow::Result;

/// Where the shader text resources live.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AssetRoot {
    Directory(PathBuf),
    Remote(String),
}

impl AssetRoot {
    pub fn from_input(input: &str) -> Self {
        if input.starts_with("http://") || input.starts_with("https://") {
            Self::Remote(input.to_string())
        } else {
            Self::Directory(PathBuf::from(input))
        }
    }

    pub fn is_local(&self) -> bool {
        matches!(self, Self::Directory(_))
    }

    /// Builds the fetcher that serves resources relative to this root.
    pub fn fetcher(&self) -> Result<Box<dyn SourceFetcher + Send>> {
        match self {
            Self::Directory(path) => Ok(Box::new(FileFetcher::new(path.clone()))),
            Self::Remote(base) => Ok(Box::new(HttpFetcher::new(base)?)),
        }
    }
}

use std::fs;
use std::io::ErrorKind;
use std::path::PathBuf;

use tracing::debug;

use crate::pair::{FetchError, FetchedText, SourceFetcher};

/// Serves resources from a directory, reporting HTTP-style statuses so a
/// missing file looks the same to callers as a 404 from a web server.
#[derive(Debug, Clone)]
pub struct FileFetcher {
    root: PathBuf,
}

impl FileFetcher {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl SourceFetcher for FileFetcher {
    fn fetch(&self, path: &str) -> Result<FetchedText, FetchError> {
        let full = self.root.join(path.trim_start_matches('/'));
        debug!(path = %full.display(), "reading shader source");
        match fs::read_to_string(&full) {
            Ok(body) => Ok(FetchedText::ok(body)),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(FetchedText::with_status(404)),
            Err(err) if err.kind() == ErrorKind::PermissionDenied => {
                Ok(FetchedText::with_status(403))
            }
            Err(source) => Err(FetchError::Io { path: full, source }),
        }
    }

    fn describe(&self) -> String {
        self.root.display().to_string()
    }
}

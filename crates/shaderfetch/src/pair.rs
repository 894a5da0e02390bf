//! Fetches the vertex/fragment source pair the cloud program is built from.
//!
//! Types:
//!
//! - `SourceFetcher` is the seam between the loader and the transport; the
//!   filesystem and HTTP implementations live in `local` and `remote`.
//! - `FetchedText` mirrors an HTTP-style response: a status code plus body.
//! - `ShaderLocations` names the two resources relative to the asset root.
//! - `FetchError` classifies transport failures, non-success statuses, and
//!   empty bodies.
//!
//! Functions:
//!
//! - `fetch_pair` requests both resources concurrently and only succeeds when
//!   both come back with a success status and non-empty text.
use std::path::PathBuf;
use std::thread;

use thiserror::Error;
use tracing::{debug, error};

pub const VERTEX_SHADER_PATH: &str = "shaders/clouds.vert.glsl";
pub const FRAGMENT_SHADER_PATH: &str = "shaders/clouds.frag.glsl";

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request for {path} failed: {source}")]
    Http {
        path: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid asset location '{0}'")]
    Location(String),

    #[error("failed to load shader files (vertex status {vertex}, fragment status {fragment})")]
    Status { vertex: u16, fragment: u16 },

    #[error("shader resource {path} is empty")]
    Empty { path: String },

    #[error("fetch worker panicked")]
    Worker,
}

/// Status code and body of one fetched text resource.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchedText {
    pub status: u16,
    pub body: String,
}

impl FetchedText {
    pub fn ok(body: impl Into<String>) -> Self {
        Self {
            status: 200,
            body: body.into(),
        }
    }

    pub fn with_status(status: u16) -> Self {
        Self {
            status,
            body: String::new(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Retrieves a text resource by its path relative to some asset root.
pub trait SourceFetcher: Sync {
    fn fetch(&self, path: &str) -> Result<FetchedText, FetchError>;

    /// Human-readable root used in log lines.
    fn describe(&self) -> String;
}

impl<T: SourceFetcher + ?Sized + Send> SourceFetcher for Box<T> {
    fn fetch(&self, path: &str) -> Result<FetchedText, FetchError> {
        (**self).fetch(path)
    }

    fn describe(&self) -> String {
        (**self).describe()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShaderLocations {
    pub vertex: String,
    pub fragment: String,
}

impl Default for ShaderLocations {
    fn default() -> Self {
        Self {
            vertex: VERTEX_SHADER_PATH.to_string(),
            fragment: FRAGMENT_SHADER_PATH.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShaderSources {
    pub vertex: String,
    pub fragment: String,
}

/// Fetches both shader stages and joins the results.
///
/// The vertex request runs on a scoped worker thread while the fragment
/// request runs on the caller's thread; both are awaited before any status is
/// inspected so a failure reports the status of each side.
pub fn fetch_pair<F>(fetcher: &F, locations: &ShaderLocations) -> Result<ShaderSources, FetchError>
where
    F: SourceFetcher + ?Sized,
{
    debug!(
        root = %fetcher.describe(),
        vertex = %locations.vertex,
        fragment = %locations.fragment,
        "fetching shader sources"
    );

    let (vertex, fragment) = thread::scope(|scope| {
        let vertex = scope.spawn(|| fetcher.fetch(&locations.vertex));
        let fragment = fetcher.fetch(&locations.fragment);
        let vertex = vertex.join().map_err(|_| FetchError::Worker);
        (vertex, fragment)
    });
    let vertex = vertex
        .and_then(|fetched| fetched)
        .map_err(|err| transport_failure(&locations.vertex, err))?;
    let fragment = fragment.map_err(|err| transport_failure(&locations.fragment, err))?;

    if !vertex.is_success() || !fragment.is_success() {
        error!(
            vertex = vertex.status,
            fragment = fragment.status,
            "failed to load shader files"
        );
        return Err(FetchError::Status {
            vertex: vertex.status,
            fragment: fragment.status,
        });
    }

    for (path, text) in [(&locations.vertex, &vertex), (&locations.fragment, &fragment)] {
        if text.body.is_empty() {
            error!(path = %path, "shader resource is empty");
            return Err(FetchError::Empty { path: path.clone() });
        }
    }

    Ok(ShaderSources {
        vertex: vertex.body,
        fragment: fragment.body,
    })
}

fn transport_failure(path: &str, err: FetchError) -> FetchError {
    error!(path = %path, error = %err, "failed to fetch shader source");
    err
}

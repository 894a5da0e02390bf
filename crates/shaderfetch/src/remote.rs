use anyhow::{Context, Result};
use reqwest::blocking::Client;
use reqwest::Url;
use tracing::debug;

use crate::pair::{FetchError, FetchedText, SourceFetcher};

/// Fetches resources relative to an `http(s)` base URL.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    http: Client,
    base: Url,
}

impl HttpFetcher {
    pub fn new(base: &str) -> Result<Self> {
        let mut base = Url::parse(base).with_context(|| format!("parsing asset url '{base}'"))?;
        // `Url::join` replaces the last segment unless the base ends with '/'.
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        let http = Client::builder().build()?;
        Ok(Self { http, base })
    }

    pub fn base(&self) -> &Url {
        &self.base
    }

    fn resolve(&self, path: &str) -> Result<Url, FetchError> {
        self.base
            .join(path.trim_start_matches('/'))
            .map_err(|_| FetchError::Location(path.to_string()))
    }
}

impl SourceFetcher for HttpFetcher {
    fn fetch(&self, path: &str) -> Result<FetchedText, FetchError> {
        let url = self.resolve(path)?;
        debug!(%url, "requesting shader source");
        let response = self
            .http
            .get(url.clone())
            .send()
            .map_err(|source| FetchError::Http {
                path: url.to_string(),
                source,
            })?;
        let status = response.status().as_u16();
        if !response.status().is_success() {
            return Ok(FetchedText::with_status(status));
        }
        let body = response.text().map_err(|source| FetchError::Http {
            path: url.to_string(),
            source,
        })?;
        Ok(FetchedText { status, body })
    }

    fn describe(&self) -> String {
        self.base.to_string()
    }
}

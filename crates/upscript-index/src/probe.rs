use std::time::Duration;

use reqwest::StatusCode;
use upscript_core::PackageName;
use url::Url;

use crate::fingerprint_bytes;

pub const DEFAULT_PROBE_TIMEOUT: Duration = Duration::from_secs(15);

#[derive(Debug, thiserror::Error)]
pub enum ProbeError {
    #[error("invalid index url '{index_url}': {reason}")]
    InvalidIndexUrl { index_url: String, reason: String },
    #[error("failed to build http client")]
    Client(#[source] reqwest::Error),
    #[error("request to {url} failed")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("request to {url} returned status {status}")]
    Status { url: String, status: u16 },
}

/// Produces a fingerprint of a package's upstream index page.
pub trait IndexProbe {
    fn fingerprint(&self, package: &PackageName, index_url: &str) -> Result<String, ProbeError>;
}

#[derive(Debug, Clone)]
pub struct HttpIndexProbe {
    timeout: Duration,
}

impl HttpIndexProbe {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}

impl Default for HttpIndexProbe {
    fn default() -> Self {
        Self::new(DEFAULT_PROBE_TIMEOUT)
    }
}

impl IndexProbe for HttpIndexProbe {
    fn fingerprint(&self, package: &PackageName, index_url: &str) -> Result<String, ProbeError> {
        let url = package_index_url(index_url, package)?;
        let client = reqwest::blocking::Client::builder()
            .timeout(self.timeout)
            .build()
            .map_err(ProbeError::Client)?;

        tracing::debug!(package = %package, url = %url, "probing package index");
        let response = client
            .get(url.clone())
            .send()
            .map_err(|source| ProbeError::Request {
                url: url.to_string(),
                source,
            })?;
        if response.status() != StatusCode::OK {
            return Err(ProbeError::Status {
                url: url.to_string(),
                status: response.status().as_u16(),
            });
        }

        let body = response.bytes().map_err(|source| ProbeError::Request {
            url: url.to_string(),
            source,
        })?;
        Ok(fingerprint_bytes(&body))
    }
}

/// Joins the index base with `<package>/`. A base without a trailing slash is
/// treated as a directory, so `.../simple` and `.../simple/` are equivalent.
pub fn package_index_url(index_url: &str, package: &PackageName) -> Result<Url, ProbeError> {
    let invalid = |reason: String| ProbeError::InvalidIndexUrl {
        index_url: index_url.to_string(),
        reason,
    };

    let mut url = Url::parse(index_url).map_err(|err| invalid(err.to_string()))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(invalid(format!("unsupported scheme '{}'", url.scheme())));
    }
    url.set_query(None);
    url.set_fragment(None);
    {
        let mut segments = url
            .path_segments_mut()
            .map_err(|()| invalid("url cannot be a base".to_string()))?;
        segments.pop_if_empty().push(package.as_str()).push("");
    }
    Ok(url)
}

use std::path::PathBuf;
use std::time::Duration;

use anyhow::Result;
use upscript_core::PackageName;
use upscript_index::DEFAULT_PROBE_TIMEOUT;

pub const AUTO_UPDATE_ENV: &str = "UPSCRIPT_AUTO_UPDATE";
pub const SELF_INSTALL_SOURCE_ENV: &str = "UPSCRIPT_SELF_INSTALL_SOURCE";
pub const UPDATE_TIMEOUT_ENV: &str = "UPSCRIPT_UPDATE_TIMEOUT";
pub const PYTHON_ENV: &str = "UPSCRIPT_PYTHON";
pub const SELF_PACKAGE_NAME: &str = "upscript";

/// Process-wide settings, read once at the process boundary and passed down.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuntimeConfig {
    pub auto_update: bool,
    pub self_package: PackageName,
    pub self_install_source: Option<String>,
    pub probe_timeout: Duration,
    pub python: Option<PathBuf>,
}

impl RuntimeConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let auto_update = lookup(AUTO_UPDATE_ENV)
            .map(|value| value.trim() == "1")
            .unwrap_or(true);

        let self_install_source = lookup(SELF_INSTALL_SOURCE_ENV)
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty());

        let probe_timeout = match lookup(UPDATE_TIMEOUT_ENV) {
            Some(raw) => parse_timeout(&raw).unwrap_or_else(|| {
                tracing::warn!(
                    "ignoring {UPDATE_TIMEOUT_ENV}={raw:?}: expected a positive number of seconds"
                );
                DEFAULT_PROBE_TIMEOUT
            }),
            None => DEFAULT_PROBE_TIMEOUT,
        };

        let python = lookup(PYTHON_ENV)
            .filter(|value| !value.trim().is_empty())
            .map(PathBuf::from);

        Ok(Self {
            auto_update,
            self_package: PackageName::parse(SELF_PACKAGE_NAME)?,
            self_install_source,
            probe_timeout,
            python,
        })
    }
}

fn parse_timeout(raw: &str) -> Option<Duration> {
    let seconds = raw.trim().parse::<f64>().ok()?;
    if !seconds.is_finite() || seconds <= 0.0 {
        return None;
    }
    Duration::try_from_secs_f64(seconds).ok()
}

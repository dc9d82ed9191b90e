use std::path::PathBuf;

use upscript_core::{InvalidCallableRef, StateParseError};
use upscript_index::ProbeError;

#[derive(Debug, thiserror::Error)]
pub enum StateError {
    #[error("corrupt state document {}: {reason}", path.display())]
    CorruptState { path: PathBuf, reason: String },
    #[error("unsupported state document {}: schema version {found}", path.display())]
    UnsupportedSchema { path: PathBuf, found: String },
    #[error("failed to access state document {}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl StateError {
    pub(crate) fn from_parse(path: PathBuf, err: StateParseError) -> Self {
        match err {
            StateParseError::Corrupt(reason) => Self::CorruptState { path, reason },
            StateParseError::UnsupportedSchema { found } => Self::UnsupportedSchema { path, found },
        }
    }
}

/// The package manager exited unsuccessfully; output is kept for operators.
#[derive(Debug, thiserror::Error)]
#[error("unable to install {package}: package manager exited with {status}")]
pub struct InstallationFailure {
    pub package: String,
    pub status: String,
    pub stdout: String,
    pub stderr: String,
}

impl InstallationFailure {
    pub fn diagnostics(&self) -> String {
        let mut rendered = String::new();
        for (label, stream) in [("stdout", &self.stdout), ("stderr", &self.stderr)] {
            if stream.trim().is_empty() {
                continue;
            }
            rendered.push_str(&format!("\n{label}:\n"));
            for line in stream.lines() {
                rendered.push('\t');
                rendered.push_str(line);
                rendered.push('\n');
            }
        }
        rendered
    }
}

#[derive(Debug, thiserror::Error)]
pub enum UpdateError {
    #[error("unable to fetch {package} from the package index")]
    Probe {
        package: String,
        #[source]
        source: ProbeError,
    },
    #[error(transparent)]
    Install(#[from] InstallationFailure),
    #[error("failed to inspect installed package {package}")]
    Inspect {
        package: String,
        #[source]
        source: anyhow::Error,
    },
    #[error("package {package} is not installed after a successful install")]
    MissingAfterInstall { package: String },
    #[error(transparent)]
    State(#[from] StateError),
}

impl UpdateError {
    pub fn installation_failure(&self) -> Option<&InstallationFailure> {
        match self {
            Self::Install(failure) => Some(failure),
            _ => None,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    #[error("client package {package} is not installed in the environment")]
    PackageNotInstalled { package: String },
    #[error("failed to read command manifest for {package}")]
    Manifest {
        package: String,
        #[source]
        source: anyhow::Error,
    },
    #[error("failed to write launcher {}", path.display())]
    WriteLauncher {
        path: PathBuf,
        #[source]
        source: anyhow::Error,
    },
    #[error(transparent)]
    State(#[from] StateError),
}

#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    #[error("unable to find entry point '{name}'")]
    EntryPointNotFound { name: String },
    #[error(transparent)]
    InvalidCallableRef(#[from] InvalidCallableRef),
    #[error(transparent)]
    State(#[from] StateError),
    #[error("failed to run entry point '{name}'")]
    Launch {
        name: String,
        #[source]
        source: anyhow::Error,
    },
}

#[derive(Debug, thiserror::Error)]
#[error("failed to create environment at {}", path.display())]
pub struct ProvisionError {
    pub path: PathBuf,
    #[source]
    pub source: anyhow::Error,
}

use std::path::PathBuf;
use std::process::Command;

use anyhow::{anyhow, Context, Result};

use crate::{EnvironmentLayout, ProvisionError};

/// Creates the isolated environment packages get installed into.
pub trait EnvironmentProvisioner {
    fn create(&self, environment: &EnvironmentLayout) -> Result<(), ProvisionError>;
}

/// Creates a virtual environment, with pip, using a host interpreter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VenvProvisioner {
    python: PathBuf,
}

impl VenvProvisioner {
    pub fn new(python: impl Into<PathBuf>) -> Self {
        Self {
            python: python.into(),
        }
    }

    /// Uses `explicit` when given, otherwise the first of `python3`/`python`
    /// on `PATH`.
    pub fn discover(explicit: Option<&std::path::Path>) -> Result<Self> {
        if let Some(python) = explicit {
            return Ok(Self::new(python));
        }
        ["python3", "python"]
            .into_iter()
            .find_map(|candidate| which::which(candidate).ok())
            .map(Self::new)
            .ok_or_else(|| anyhow!("no python interpreter found on PATH (set UPSCRIPT_PYTHON)"))
    }

    pub fn python(&self) -> &std::path::Path {
        &self.python
    }

    pub(crate) fn venv_command(&self, environment: &EnvironmentLayout) -> Command {
        let mut command = Command::new(&self.python);
        command.arg("-m").arg("venv").arg(environment.root());
        command
    }
}

impl EnvironmentProvisioner for VenvProvisioner {
    fn create(&self, environment: &EnvironmentLayout) -> Result<(), ProvisionError> {
        let wrap = |source| ProvisionError {
            path: environment.root().to_path_buf(),
            source,
        };

        tracing::info!(path = %environment.root().display(), "creating environment");
        let output = self
            .venv_command(environment)
            .output()
            .with_context(|| format!("failed to launch {}", self.python.display()))
            .map_err(wrap)?;
        if !output.status.success() {
            return Err(wrap(anyhow!(
                "{} -m venv exited with {}: {}",
                self.python.display(),
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }
        Ok(())
    }
}

use std::process::Command;

use anyhow::Result;
use upscript_core::PackageName;

use crate::manifest::{find_distribution, CommandDeclaration};
use crate::{EnvironmentLayout, InstallationFailure};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InstallRequest<'a> {
    pub package: &'a PackageName,
    /// What the package manager is asked to install: the package name itself,
    /// or an override such as a local path or VCS reference.
    pub source: &'a str,
    pub index_url: &'a str,
}

/// The external tool that resolves and installs packages into an environment.
pub trait PackageManager {
    fn install(
        &self,
        environment: &EnvironmentLayout,
        request: &InstallRequest<'_>,
    ) -> Result<(), InstallationFailure>;

    fn installed_version(
        &self,
        environment: &EnvironmentLayout,
        package: &PackageName,
    ) -> Result<Option<String>>;

    /// `None` when the package is not installed at all.
    fn command_manifest(
        &self,
        environment: &EnvironmentLayout,
        package: &PackageName,
    ) -> Result<Option<Vec<CommandDeclaration>>>;
}

/// Drives `pip` from inside the environment's own interpreter.
#[derive(Debug, Clone, Copy, Default)]
pub struct PipPackageManager;

impl PipPackageManager {
    pub(crate) fn install_command(
        environment: &EnvironmentLayout,
        request: &InstallRequest<'_>,
    ) -> Command {
        let mut command = Command::new(environment.python_path());
        command
            .arg("-I")
            .arg("-m")
            .arg("pip")
            .arg("install")
            .arg("--upgrade")
            .arg("--index-url")
            .arg(request.index_url)
            .arg("--")
            .arg(request.source)
            .env("PYTHONIOENCODING", "utf-8");
        command
    }
}

impl PackageManager for PipPackageManager {
    fn install(
        &self,
        environment: &EnvironmentLayout,
        request: &InstallRequest<'_>,
    ) -> Result<(), InstallationFailure> {
        tracing::info!(
            package = %request.package,
            source = request.source,
            "installing package"
        );
        let output = Self::install_command(environment, request)
            .output()
            .map_err(|err| InstallationFailure {
                package: request.package.to_string(),
                status: format!("launch error ({err})"),
                stdout: String::new(),
                stderr: String::new(),
            })?;
        if output.status.success() {
            return Ok(());
        }

        Err(InstallationFailure {
            package: request.package.to_string(),
            status: output.status.to_string(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }

    fn installed_version(
        &self,
        environment: &EnvironmentLayout,
        package: &PackageName,
    ) -> Result<Option<String>> {
        Ok(find_distribution(environment, package)?.map(|distribution| distribution.version))
    }

    fn command_manifest(
        &self,
        environment: &EnvironmentLayout,
        package: &PackageName,
    ) -> Result<Option<Vec<CommandDeclaration>>> {
        match find_distribution(environment, package)? {
            Some(distribution) => distribution.command_manifest().map(Some),
            None => Ok(None),
        }
    }
}

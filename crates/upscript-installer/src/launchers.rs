use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use anyhow::{Context, Result};
use upscript_core::PackageName;

use crate::fs_utils::{remove_file_if_exists, write_atomic};
use crate::layout::ENVIRONMENT_SUBDIR;
use crate::EnvironmentLayout;

pub const LAUNCHER_SUFFIX: &str = if cfg!(windows) { ".cmd" } else { "" };

/// Everything a launcher needs to re-enter the dispatcher. Launchers carry no
/// per-command data: the command is recovered from the launcher's file name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LauncherTemplate {
    pub program: PathBuf,
    pub environment: PathBuf,
}

impl LauncherTemplate {
    /// Prefers the tool binary installed into the environment by self-update,
    /// falling back to the running executable. An installed binary is used
    /// only when its `--version` output names `self_package`.
    pub fn for_environment(
        environment: &EnvironmentLayout,
        self_package: &PackageName,
    ) -> Result<Self> {
        let installed = environment.executable_path(self_package.as_str());
        if installed.is_file() && reports_tool_version(&installed, self_package) {
            return Ok(Self {
                program: installed,
                environment: environment.root().to_path_buf(),
            });
        }
        Self::for_current_exe(environment)
    }

    pub fn for_current_exe(environment: &EnvironmentLayout) -> Result<Self> {
        let program = std::env::current_exe().context("failed to resolve current executable")?;
        Ok(Self {
            program,
            environment: environment.root().to_path_buf(),
        })
    }
}

/// Whether `program --version` prints `<self_package> <version>`.
pub(crate) fn reports_tool_version(program: &Path, self_package: &PackageName) -> bool {
    let output = match Command::new(program)
        .arg("--version")
        .stdin(Stdio::null())
        .output()
    {
        Ok(output) => output,
        Err(err) => {
            tracing::debug!(program = %program.display(), "version check failed: {err}");
            return false;
        }
    };
    if !output.status.success() {
        tracing::debug!(
            program = %program.display(),
            status = %output.status,
            "ignoring installed binary that does not report a version"
        );
        return false;
    }

    let stdout = String::from_utf8_lossy(&output.stdout);
    let Some(version) = stdout
        .lines()
        .next()
        .and_then(|line| line.trim().strip_prefix(self_package.as_str()))
        .and_then(|rest| rest.strip_prefix(' '))
    else {
        return false;
    };
    version.starts_with(|ch: char| ch.is_ascii_digit())
}

pub fn launcher_path(launcher_dir: &Path, name: &str) -> PathBuf {
    launcher_dir.join(format!("{name}{LAUNCHER_SUFFIX}"))
}

/// The command name a launcher stands for, i.e. its file name minus the
/// platform launcher suffix.
pub fn launcher_name_from_path(path: &Path) -> Option<String> {
    let file_name = path.file_name()?.to_str()?;
    let name = if LAUNCHER_SUFFIX.is_empty() {
        file_name
    } else {
        let split_at = file_name.len().checked_sub(LAUNCHER_SUFFIX.len())?;
        match file_name.get(split_at..) {
            Some(suffix) if suffix.eq_ignore_ascii_case(LAUNCHER_SUFFIX) => &file_name[..split_at],
            _ => file_name,
        }
    };
    (!name.is_empty()).then(|| name.to_string())
}

pub fn is_valid_command_name(name: &str) -> bool {
    !name.is_empty()
        && name != "."
        && name != ".."
        && name != ENVIRONMENT_SUBDIR
        && !name
            .chars()
            .any(|ch| matches!(ch, '/' | '\\' | ':' | '\0') || ch.is_control())
}

pub fn render_launcher(template: &LauncherTemplate) -> String {
    if cfg!(windows) {
        format!(
            "@echo off\r\n\"{}\" launch --environment \"{}\" -- \"%~f0\" %*\r\nexit /b %ERRORLEVEL%\r\n",
            template.program.display(),
            template.environment.display()
        )
    } else {
        format!(
            "#!/bin/sh\nexec {} launch --environment {} -- \"$0\" \"$@\"\n",
            shell_quote(&template.program.display().to_string()),
            shell_quote(&template.environment.display().to_string())
        )
    }
}

pub fn write_launcher(
    launcher_dir: &Path,
    name: &str,
    template: &LauncherTemplate,
) -> Result<PathBuf> {
    let path = launcher_path(launcher_dir, name);
    write_atomic(&path, render_launcher(template).as_bytes())
        .with_context(|| format!("failed writing launcher: {}", path.display()))?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let mut permissions = fs::metadata(&path)
            .with_context(|| format!("failed to inspect launcher: {}", path.display()))?
            .permissions();
        permissions.set_mode(0o755);
        fs::set_permissions(&path, permissions)
            .with_context(|| format!("failed setting launcher permissions: {}", path.display()))?;
    }

    Ok(path)
}

pub fn remove_launcher(launcher_dir: &Path, name: &str) -> io::Result<bool> {
    remove_file_if_exists(&launcher_path(launcher_dir, name))
}

fn shell_quote(value: &str) -> String {
    format!("'{}'", value.replace('\'', "'\\''"))
}

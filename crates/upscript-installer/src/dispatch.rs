use std::collections::BTreeMap;
use std::ffi::OsString;
use std::path::Path;
use std::process::{Command, ExitStatus};

use anyhow::{Context, Result};
use upscript_core::{Callable, EntryPointRecord};

use crate::state_store::load_state;
use crate::sync::synchronize;
use crate::update::{refresh, UpdateContext};
use crate::{DispatchError, EnvironmentLayout, EnvironmentLock, LauncherTemplate};

// Run through `python -c`; the target is passed as arguments, never spliced
// into the source.
const PYTHON_BOOTSTRAP: &str = "\
import importlib, sys
if sys.path and sys.path[0] == '':
    del sys.path[0]
module_name, attribute_path, program = sys.argv[1:4]
sys.argv = [program] + sys.argv[4:]
target = importlib.import_module(module_name)
for attribute in attribute_path.split('.'):
    target = getattr(target, attribute)
sys.exit(target())
";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedCommand {
    pub name: String,
    pub callable: Callable,
    pub owning_package: String,
}

/// Maps command names to their recorded callable references. References are
/// validated when resolved, not when the registry is built.
#[derive(Debug, Clone, Default)]
pub struct CallableRegistry {
    entries: BTreeMap<String, EntryPointRecord>,
}

impl CallableRegistry {
    pub fn from_roster(roster: &[EntryPointRecord]) -> Self {
        let entries = roster
            .iter()
            .map(|record| (record.name.clone(), record.clone()))
            .collect();
        Self { entries }
    }

    pub fn resolve(&self, requested_name: &str) -> Result<ResolvedCommand, DispatchError> {
        let record =
            self.entries
                .get(requested_name)
                .ok_or_else(|| DispatchError::EntryPointNotFound {
                    name: requested_name.to_string(),
                })?;
        let callable = Callable::parse(&record.callable_ref)?;
        Ok(ResolvedCommand {
            name: record.name.clone(),
            callable,
            owning_package: record.owning_package.clone(),
        })
    }
}

/// Executes a resolved command inside the environment and reports its exit code.
pub trait CallableRunner {
    fn run(
        &self,
        environment: &EnvironmentLayout,
        command: &ResolvedCommand,
        args: &[OsString],
    ) -> Result<i32>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct PythonCallableRunner;

impl PythonCallableRunner {
    pub(crate) fn command(
        environment: &EnvironmentLayout,
        command: &ResolvedCommand,
        args: &[OsString],
    ) -> Command {
        let mut process = Command::new(environment.python_path());
        process
            .arg("-c")
            .arg(PYTHON_BOOTSTRAP)
            .arg(&command.callable.module)
            .arg(command.callable.attribute_path())
            .arg(&command.name)
            .args(args);
        process
    }
}

impl CallableRunner for PythonCallableRunner {
    fn run(
        &self,
        environment: &EnvironmentLayout,
        command: &ResolvedCommand,
        args: &[OsString],
    ) -> Result<i32> {
        let python = environment.python_path();
        let status = Self::command(environment, command, args)
            .status()
            .with_context(|| format!("failed to launch {}", python.display()))?;
        Ok(exit_code(status))
    }
}

fn exit_code(status: ExitStatus) -> i32 {
    if let Some(code) = status.code() {
        return code;
    }
    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        if let Some(signal) = status.signal() {
            return 128 + signal;
        }
    }
    1
}

#[derive(Debug, Clone, Copy)]
pub struct LaunchRequest<'a> {
    pub environment: &'a EnvironmentLayout,
    pub launcher_dir: &'a Path,
    /// Derived once from the launcher's file name at the process boundary.
    pub requested_name: &'a str,
    pub args: &'a [OsString],
}

/// What every generated launcher runs: optional auto-update, then dispatch to
/// the command named after the launcher.
pub fn run_launcher(
    request: &LaunchRequest<'_>,
    context: &UpdateContext<'_>,
    template: &LauncherTemplate,
    runner: &dyn CallableRunner,
) -> Result<i32, DispatchError> {
    if context.config.auto_update {
        if let Err(err) = check_updates(request, context, template) {
            tracing::warn!("update failed: {err:#}");
        }
    }

    let state = load_state(request.environment)?;
    let command =
        CallableRegistry::from_roster(&state.entry_points).resolve(request.requested_name)?;
    tracing::debug!(
        command = command.name.as_str(),
        callable = %command.callable,
        package = command.owning_package.as_str(),
        "dispatching"
    );

    runner
        .run(request.environment, &command, request.args)
        .map_err(|source| DispatchError::Launch {
            name: command.name.clone(),
            source,
        })
}

fn check_updates(
    request: &LaunchRequest<'_>,
    context: &UpdateContext<'_>,
    template: &LauncherTemplate,
) -> Result<()> {
    let _lock = EnvironmentLock::acquire(request.environment)?;
    let outcome = refresh(request.environment, context)?;
    if !outcome.any_updated() {
        return Ok(());
    }

    // A self-update may have placed a newer tool binary in the environment.
    let template = if outcome.self_updated {
        LauncherTemplate::for_environment(request.environment, &context.config.self_package)?
    } else {
        template.clone()
    };
    synchronize(
        request.launcher_dir,
        request.environment,
        context.package_manager,
        &template,
    )?;
    Ok(())
}

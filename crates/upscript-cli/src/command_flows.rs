use std::ffi::OsString;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use upscript_core::{PackageName, StateDocument};
use upscript_index::HttpIndexProbe;
use upscript_installer::{
    launcher_name_from_path, launcher_path, refresh, run_launcher, save_state, synchronize,
    EnvironmentLayout, EnvironmentLock, EnvironmentProvisioner, InstallLayout, LaunchRequest,
    LauncherTemplate, PipPackageManager, PythonCallableRunner, RuntimeConfig, SyncReport,
    UpdateContext, VenvProvisioner,
};

use crate::render::{format_launcher_summary, TerminalRenderer};

pub(crate) const DEFAULT_INDEX_URL: &str = "https://pypi.org/simple/";

pub(crate) fn run_fetch_command(
    config: &RuntimeConfig,
    renderer: TerminalRenderer,
    package: &str,
    destination: &Path,
    index_url: &str,
) -> Result<()> {
    let package = PackageName::parse(package)?;
    let layout = InstallLayout::new(absolute_destination(destination)?);
    let environment = layout.environment();

    let provisioner = VenvProvisioner::discover(config.python.as_deref())?;
    run_step(
        renderer,
        &format!("creating environment at {}", environment.root().display()),
        &format!("created environment at {}", environment.root().display()),
        || Ok(provisioner.create(&environment)?),
    )?;

    let _lock = EnvironmentLock::acquire(&environment)?;
    save_state(
        &environment,
        &StateDocument::new(index_url, vec![package.clone()]),
    )?;

    let probe = HttpIndexProbe::new(config.probe_timeout);
    let context = UpdateContext {
        config,
        probe: &probe,
        package_manager: &PipPackageManager,
    };
    run_step(
        renderer,
        &format!("installing {package}"),
        &format!("installed {package}"),
        || Ok(refresh(&environment, &context)?),
    )?;

    let report = write_launchers(&layout, &environment, config)?;
    print_launchers(renderer, &layout, &report);
    Ok(())
}

pub(crate) fn run_update_command(
    config: &RuntimeConfig,
    renderer: TerminalRenderer,
    destination: &Path,
) -> Result<()> {
    let layout = InstallLayout::new(absolute_destination(destination)?);
    let environment = layout.environment();
    let _lock = EnvironmentLock::acquire(&environment)?;

    let probe = HttpIndexProbe::new(config.probe_timeout);
    let context = UpdateContext {
        config,
        probe: &probe,
        package_manager: &PipPackageManager,
    };
    let outcome = run_step(
        renderer,
        "checking for updates",
        "checked for updates",
        || Ok(refresh(&environment, &context)?),
    )?;
    if !outcome.any_updated() {
        renderer.print_status("ok", "everything is up to date");
    }

    // Launchers are rewritten either way so a damaged destination heals.
    let report = write_launchers(&layout, &environment, config)?;
    print_launchers(renderer, &layout, &report);
    Ok(())
}

pub(crate) fn run_launch_command(
    config: &RuntimeConfig,
    environment: &Path,
    launcher: &Path,
    args: &[OsString],
) -> Result<i32> {
    let (requested_name, launcher_dir) = launch_target(launcher)?;
    let environment = EnvironmentLayout::new(environment);
    let template = LauncherTemplate::for_current_exe(&environment)?;
    let probe = HttpIndexProbe::new(config.probe_timeout);
    let context = UpdateContext {
        config,
        probe: &probe,
        package_manager: &PipPackageManager,
    };

    let code = run_launcher(
        &LaunchRequest {
            environment: &environment,
            launcher_dir: &launcher_dir,
            requested_name: &requested_name,
            args,
        },
        &context,
        &template,
        &PythonCallableRunner,
    )?;
    Ok(code)
}

/// The command a launcher stands for and the directory its siblings live in.
pub(crate) fn launch_target(launcher: &Path) -> Result<(String, PathBuf)> {
    let requested_name = launcher_name_from_path(launcher).ok_or_else(|| {
        anyhow!(
            "cannot derive a command name from launcher path {}",
            launcher.display()
        )
    })?;
    let launcher_dir = match launcher.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
    Ok((requested_name, launcher_dir))
}

fn write_launchers(
    layout: &InstallLayout,
    environment: &EnvironmentLayout,
    config: &RuntimeConfig,
) -> Result<SyncReport> {
    let template = LauncherTemplate::for_environment(environment, &config.self_package)?;
    let report = synchronize(
        &layout.launcher_dir(),
        environment,
        &PipPackageManager,
        &template,
    )?;
    Ok(report)
}

fn print_launchers(renderer: TerminalRenderer, layout: &InstallLayout, report: &SyncReport) {
    renderer.print_section("launchers");
    for name in &report.written {
        println!("{}", launcher_path(&layout.launcher_dir(), name).display());
    }
    for name in &report.missing {
        renderer.print_status("warn", &format!("stale launcher {name} was already removed"));
    }
    for name in &report.failed {
        renderer.print_status("warn", &format!("could not remove stale launcher {name}"));
    }
    renderer.print_status(
        "ok",
        &format_launcher_summary(report.written.len(), report.removed.len()),
    );
}

fn run_step<T>(
    renderer: TerminalRenderer,
    message: &str,
    done: &str,
    action: impl FnOnce() -> Result<T>,
) -> Result<T> {
    let step = renderer.start_step(message);
    match action() {
        Ok(value) => {
            step.finish_success(done);
            Ok(value)
        }
        Err(err) => {
            step.finish_abandon();
            Err(err)
        }
    }
}

fn absolute_destination(destination: &Path) -> Result<PathBuf> {
    std::path::absolute(destination)
        .with_context(|| format!("failed to resolve destination {}", destination.display()))
}

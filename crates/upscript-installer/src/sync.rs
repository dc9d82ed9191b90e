use std::collections::HashSet;
use std::fs;
use std::path::Path;

use upscript_core::{ClientPackage, EntryPointRecord};

use crate::launchers::{is_valid_command_name, launcher_path, remove_launcher, write_launcher};
use crate::state_store::{load_state, save_state};
use crate::{EnvironmentLayout, LauncherTemplate, PackageManager, SyncError};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncReport {
    pub written: Vec<String>,
    pub removed: Vec<String>,
    /// Stale launchers that were already gone from disk.
    pub missing: Vec<String>,
    /// Stale launchers that could not be deleted. They are dropped from the
    /// roster regardless.
    pub failed: Vec<String>,
}

/// Rebuilds the launcher roster from the installed command manifests.
///
/// Manifests are all read before anything is written, launchers are written
/// before stale ones are removed, and the roster is saved last.
pub fn synchronize(
    launcher_dir: &Path,
    environment: &EnvironmentLayout,
    package_manager: &dyn PackageManager,
    template: &LauncherTemplate,
) -> Result<SyncReport, SyncError> {
    let mut state = load_state(environment)?;
    let roster = collect_roster(environment, package_manager, &state.client_packages)?;

    fs::create_dir_all(launcher_dir).map_err(|err| SyncError::WriteLauncher {
        path: launcher_dir.to_path_buf(),
        source: err.into(),
    })?;

    let mut report = SyncReport::default();
    for record in &roster {
        write_launcher(launcher_dir, &record.name, template).map_err(|source| {
            SyncError::WriteLauncher {
                path: launcher_path(launcher_dir, &record.name),
                source,
            }
        })?;
        report.written.push(record.name.clone());
    }

    for name in stale_entry_point_names(&state.entry_points, &roster) {
        match remove_launcher(launcher_dir, &name) {
            Ok(true) => report.removed.push(name),
            Ok(false) => {
                tracing::warn!(
                    "stale launcher already missing: {}",
                    launcher_path(launcher_dir, &name).display()
                );
                report.missing.push(name);
            }
            Err(err) => {
                tracing::warn!(
                    "unable to remove stale launcher {}: {err}",
                    launcher_path(launcher_dir, &name).display()
                );
                report.failed.push(name);
            }
        }
    }

    state.entry_points = roster;
    save_state(environment, &state)?;
    Ok(report)
}

pub(crate) fn collect_roster(
    environment: &EnvironmentLayout,
    package_manager: &dyn PackageManager,
    client_packages: &[ClientPackage],
) -> Result<Vec<EntryPointRecord>, SyncError> {
    let mut roster: Vec<EntryPointRecord> = Vec::new();
    let mut seen = HashSet::new();
    for package in client_packages {
        let commands = package_manager
            .command_manifest(environment, &package.name)
            .map_err(|source| SyncError::Manifest {
                package: package.name.to_string(),
                source,
            })?
            .ok_or_else(|| SyncError::PackageNotInstalled {
                package: package.name.to_string(),
            })?;

        for command in commands {
            if !is_valid_command_name(&command.name) {
                tracing::warn!(
                    package = %package.name,
                    "skipping command with unusable launcher name {:?}",
                    command.name
                );
                continue;
            }
            if !seen.insert(command.name.clone()) {
                let owner = roster
                    .iter()
                    .find(|record| record.name == command.name)
                    .map(|record| record.owning_package.as_str())
                    .unwrap_or_default();
                tracing::warn!(
                    "command '{}' from {} is already provided by {owner}; keeping the first",
                    command.name,
                    package.name
                );
                continue;
            }
            roster.push(EntryPointRecord {
                name: command.name,
                callable_ref: command.callable_ref,
                owning_package: package.name.to_string(),
            });
        }
    }
    Ok(roster)
}

pub(crate) fn stale_entry_point_names(
    previous: &[EntryPointRecord],
    current: &[EntryPointRecord],
) -> Vec<String> {
    let current_names = current
        .iter()
        .map(|record| record.name.as_str())
        .collect::<HashSet<_>>();
    previous
        .iter()
        .filter(|record| !current_names.contains(record.name.as_str()))
        .map(|record| record.name.clone())
        .collect()
}

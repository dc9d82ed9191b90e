use std::collections::BTreeMap;

use upscript_core::PackageName;
use upscript_index::IndexProbe;

use crate::state_store::{load_state, save_state};
use crate::{EnvironmentLayout, InstallRequest, PackageManager, RuntimeConfig, UpdateError};

/// The collaborators a refresh pass talks to.
#[derive(Clone, Copy)]
pub struct UpdateContext<'a> {
    pub config: &'a RuntimeConfig,
    pub probe: &'a dyn IndexProbe,
    pub package_manager: &'a dyn PackageManager,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RefreshOutcome {
    pub self_updated: bool,
    pub client_updated: bool,
}

impl RefreshOutcome {
    pub fn any_updated(&self) -> bool {
        self.self_updated || self.client_updated
    }
}

/// Brings the tool itself and then every client package up to date.
///
/// Work happens on an in-memory copy of the state; the copy is persisted only
/// when every package went through, so a failed pass leaves the previous
/// fingerprints on disk and the next pass re-checks everything.
pub fn refresh(
    environment: &EnvironmentLayout,
    context: &UpdateContext<'_>,
) -> Result<RefreshOutcome, UpdateError> {
    let loaded = load_state(environment)?;
    let mut working = loaded.clone();
    let index_url = working.index_url.clone();

    let self_updated = update_package_maybe(
        environment,
        context,
        &mut working.index_fingerprints,
        &index_url,
        &context.config.self_package,
        context.config.self_install_source.as_deref(),
    )?;

    let mut client_updated = false;
    let client_packages = working
        .client_packages
        .iter()
        .map(|package| package.name.clone())
        .collect::<Vec<_>>();
    for package in &client_packages {
        if update_package_maybe(
            environment,
            context,
            &mut working.index_fingerprints,
            &index_url,
            package,
            None,
        )? {
            client_updated = true;
        }
    }

    if working != loaded {
        save_state(environment, &working)?;
    }

    Ok(RefreshOutcome {
        self_updated,
        client_updated,
    })
}

fn update_package_maybe(
    environment: &EnvironmentLayout,
    context: &UpdateContext<'_>,
    fingerprints: &mut BTreeMap<String, String>,
    index_url: &str,
    package: &PackageName,
    source_override: Option<&str>,
) -> Result<bool, UpdateError> {
    let fingerprint = match source_override {
        Some(source) => {
            tracing::debug!(package = %package, source, "installing from override source");
            None
        }
        None => {
            let fingerprint = context
                .probe
                .fingerprint(package, index_url)
                .map_err(|source| UpdateError::Probe {
                    package: package.to_string(),
                    source,
                })?;
            if fingerprints.get(package.as_str()) == Some(&fingerprint) {
                tracing::debug!(package = %package, "index unchanged; skipping install");
                return Ok(false);
            }
            Some(fingerprint)
        }
    };

    let request = InstallRequest {
        package,
        source: source_override.unwrap_or(package.as_str()),
        index_url,
    };
    let updated = install_package(environment, context.package_manager, &request)?;

    if let Some(fingerprint) = fingerprint {
        fingerprints.insert(package.to_string(), fingerprint);
    }
    Ok(updated)
}

/// Returns whether the installed version changed.
fn install_package(
    environment: &EnvironmentLayout,
    package_manager: &dyn PackageManager,
    request: &InstallRequest<'_>,
) -> Result<bool, UpdateError> {
    let inspect = |source| UpdateError::Inspect {
        package: request.package.to_string(),
        source,
    };

    let before = package_manager
        .installed_version(environment, request.package)
        .map_err(inspect)?;
    package_manager.install(environment, request)?;
    let Some(after) = package_manager
        .installed_version(environment, request.package)
        .map_err(inspect)?
    else {
        return Err(UpdateError::MissingAfterInstall {
            package: request.package.to_string(),
        });
    };

    let updated = before.as_deref() != Some(after.as_str());
    if updated {
        tracing::info!(
            package = %request.package,
            from = before.as_deref().unwrap_or("none"),
            to = after.as_str(),
            "package updated"
        );
    }
    Ok(updated)
}

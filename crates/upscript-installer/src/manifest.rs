use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use upscript_core::{normalize_package_name, PackageName};

use crate::EnvironmentLayout;

const CONSOLE_SCRIPTS_SECTION: &str = "console_scripts";
const ENTRY_POINTS_FILE: &str = "entry_points.txt";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandDeclaration {
    pub name: String,
    pub callable_ref: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstalledDistribution {
    pub name: String,
    pub version: String,
    pub dist_info: PathBuf,
}

impl InstalledDistribution {
    pub fn command_manifest(&self) -> Result<Vec<CommandDeclaration>> {
        read_command_manifest(&self.dist_info.join(ENTRY_POINTS_FILE))
    }
}

pub fn find_distribution(
    environment: &EnvironmentLayout,
    package: &PackageName,
) -> Result<Option<InstalledDistribution>> {
    for site_packages in environment.site_packages_dirs()? {
        if let Some(found) = find_distribution_in(&site_packages, package)? {
            return Ok(Some(found));
        }
    }
    Ok(None)
}

pub(crate) fn find_distribution_in(
    site_packages: &Path,
    package: &PackageName,
) -> Result<Option<InstalledDistribution>> {
    let entries = fs::read_dir(site_packages)
        .with_context(|| format!("failed to read site-packages: {}", site_packages.display()))?;
    for entry in entries {
        let entry = entry?;
        if !entry.file_type()?.is_dir() {
            continue;
        }
        let file_name = entry.file_name();
        let Some(stem) = file_name
            .to_str()
            .and_then(|name| name.strip_suffix(".dist-info"))
        else {
            continue;
        };
        let Some((raw_name, raw_version)) = stem.split_once('-') else {
            continue;
        };
        if normalize_package_name(raw_name).as_deref() != Some(package.as_str()) {
            continue;
        }

        let dist_info = entry.path();
        let version = read_metadata_version(&dist_info)?.unwrap_or_else(|| raw_version.to_string());
        return Ok(Some(InstalledDistribution {
            name: raw_name.to_string(),
            version,
            dist_info,
        }));
    }
    Ok(None)
}

fn read_metadata_version(dist_info: &Path) -> Result<Option<String>> {
    let path = dist_info.join("METADATA");
    if !path.exists() {
        return Ok(None);
    }
    let raw = fs::read_to_string(&path)
        .with_context(|| format!("failed to read distribution metadata: {}", path.display()))?;
    // Headers end at the first blank line; the description body follows.
    Ok(raw
        .lines()
        .take_while(|line| !line.trim().is_empty())
        .find_map(|line| line.strip_prefix("Version:"))
        .map(|version| version.trim().to_string()))
}

pub fn read_command_manifest(path: &Path) -> Result<Vec<CommandDeclaration>> {
    if !path.exists() {
        return Ok(Vec::new());
    }
    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed to read command manifest: {}", path.display()))?;
    Ok(parse_console_scripts(&raw))
}

/// Reads the `console_scripts` section of an ini-style entry point file.
/// Command names are lowercased, matching how the packaging tools read them.
pub fn parse_console_scripts(raw: &str) -> Vec<CommandDeclaration> {
    let mut commands: Vec<CommandDeclaration> = Vec::new();
    let mut in_section = false;
    for line in raw.lines() {
        if line.starts_with(char::is_whitespace) && !line.trim().is_empty() {
            // continuation lines never occur in console_scripts values
            continue;
        }
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') || trimmed.starts_with(';') {
            continue;
        }
        if let Some(header) = trimmed.strip_prefix('[') {
            in_section = header.strip_suffix(']').map(str::trim) == Some(CONSOLE_SCRIPTS_SECTION);
            continue;
        }
        if !in_section {
            continue;
        }

        let Some(split_at) = trimmed.find(['=', ':']) else {
            continue;
        };
        let name = trimmed[..split_at].trim().to_lowercase();
        let callable_ref = trimmed[split_at + 1..].trim().to_string();
        if name.is_empty() || commands.iter().any(|command| command.name == name) {
            continue;
        }
        commands.push(CommandDeclaration { name, callable_ref });
    }
    commands
}

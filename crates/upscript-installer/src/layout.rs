use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

pub const ENVIRONMENT_SUBDIR: &str = ".files";
pub const STATE_FILE_NAME: &str = "upscript-state.json";
pub const LOCK_FILE_NAME: &str = "upscript.lock";

/// Where `fetch` puts things: launchers at the top, the environment hidden
/// underneath.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallLayout {
    destination: PathBuf,
}

impl InstallLayout {
    pub fn new(destination: impl Into<PathBuf>) -> Self {
        Self {
            destination: destination.into(),
        }
    }

    pub fn destination(&self) -> &Path {
        &self.destination
    }

    pub fn launcher_dir(&self) -> PathBuf {
        self.destination.clone()
    }

    pub fn environment(&self) -> EnvironmentLayout {
        EnvironmentLayout::new(self.destination.join(ENVIRONMENT_SUBDIR))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnvironmentLayout {
    root: PathBuf,
}

impl EnvironmentLayout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn state_path(&self) -> PathBuf {
        self.root.join(STATE_FILE_NAME)
    }

    pub fn lock_path(&self) -> PathBuf {
        self.root.join(LOCK_FILE_NAME)
    }

    pub fn bin_dir(&self) -> PathBuf {
        if cfg!(windows) {
            self.root.join("Scripts")
        } else {
            self.root.join("bin")
        }
    }

    pub fn python_path(&self) -> PathBuf {
        self.executable_path("python")
    }

    pub fn executable_path(&self, name: &str) -> PathBuf {
        let mut file_name = name.to_string();
        if cfg!(windows) {
            file_name.push_str(".exe");
        }
        self.bin_dir().join(file_name)
    }

    /// All `site-packages` directories present in the environment.
    pub fn site_packages_dirs(&self) -> Result<Vec<PathBuf>> {
        if cfg!(windows) {
            let dir = self.root.join("Lib").join("site-packages");
            return Ok(if dir.is_dir() { vec![dir] } else { Vec::new() });
        }

        let lib_dir = self.root.join("lib");
        if !lib_dir.is_dir() {
            return Ok(Vec::new());
        }

        let mut dirs = Vec::new();
        for entry in fs::read_dir(&lib_dir)
            .with_context(|| format!("failed to read environment lib dir: {}", lib_dir.display()))?
        {
            let entry = entry?;
            let is_python_dir = entry
                .file_name()
                .to_str()
                .is_some_and(|name| name.starts_with("python"));
            if !is_python_dir {
                continue;
            }
            let site_packages = entry.path().join("site-packages");
            if site_packages.is_dir() {
                dirs.push(site_packages);
            }
        }
        dirs.sort();
        Ok(dirs)
    }
}

use std::fs::{File, OpenOptions};

use anyhow::{Context, Result};
use fs4::FileExt;

use crate::EnvironmentLayout;

/// Advisory exclusive lock serializing refresh and synchronization passes
/// against one environment. Released on drop.
#[derive(Debug)]
pub struct EnvironmentLock {
    file: File,
}

impl EnvironmentLock {
    pub fn acquire(environment: &EnvironmentLayout) -> Result<Self> {
        let path = environment.lock_path();
        let file = OpenOptions::new()
            .create(true)
            .read(true)
            .write(true)
            .truncate(false)
            .open(&path)
            .with_context(|| format!("failed to open environment lock {}", path.display()))?;
        file.lock_exclusive()
            .with_context(|| format!("failed to lock {}", path.display()))?;
        tracing::debug!(path = %path.display(), "acquired environment lock");
        Ok(Self { file })
    }
}

impl Drop for EnvironmentLock {
    fn drop(&mut self) {
        let _ = self.file.unlock();
    }
}

use anyhow::Context;
use std::path::{Path, PathBuf};

/// Per-user directory holding downloaded Chrome for Testing builds.
#[derive(Debug)]
pub(crate) struct CacheDir(PathBuf);

impl CacheDir {
    pub fn get_or_create() -> anyhow::Result<Self> {
        let project_dirs = directories::ProjectDirs::from("", "", "storefront-scenario")
            .context("Could not determine a home directory for the browser cache.")?;

        let cache_dir = project_dirs.cache_dir();
        if !cache_dir.exists() {
            std::fs::create_dir_all(cache_dir)
                .with_context(|| format!("Failed to create cache directory {cache_dir:?}."))?;
        }

        Ok(Self(cache_dir.to_owned()))
    }

    pub fn path(&self) -> &Path {
        &self.0
    }
}

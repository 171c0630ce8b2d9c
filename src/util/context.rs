//! Layout of the contribs working directory.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::core::target::Target;
use crate::util::fs::ensure_dir;

/// Paths inside the contribs directory.
///
/// ```text
/// contribs/
///   src/      downloaded archives
///   build/    one directory per target, holding extracted sources
///   env/      one install prefix per target, plus auxiliary tools
///   deploy/   deployment tools
/// ```
#[derive(Debug, Clone)]
pub struct ContribsContext {
    root: PathBuf,
}

impl ContribsContext {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        ContribsContext { root: root.into() }
    }

    /// Context for the current working directory.
    pub fn from_cwd() -> Result<Self> {
        let cwd = std::env::current_dir().context("failed to get current directory")?;
        Ok(Self::new(cwd))
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn src_dir(&self) -> PathBuf {
        self.root.join("src")
    }

    pub fn build_dir(&self) -> PathBuf {
        self.root.join("build")
    }

    pub fn env_dir(&self) -> PathBuf {
        self.root.join("env")
    }

    pub fn deploy_dir(&self) -> PathBuf {
        self.root.join("deploy")
    }

    /// `build/<os>_<arch>`
    pub fn target_build_dir(&self, target: &Target) -> PathBuf {
        self.build_dir().join(target.dir_name())
    }

    /// `env/<os>_<arch>`, the install prefix for a target.
    pub fn target_env_dir(&self, target: &Target) -> PathBuf {
        self.env_dir().join(target.dir_name())
    }

    /// Create `src/`, `build/`, `env/` and `deploy/`.
    pub fn ensure_layout(&self) -> Result<()> {
        for dir in [
            self.src_dir(),
            self.build_dir(),
            self.env_dir(),
            self.deploy_dir(),
        ] {
            ensure_dir(&dir)?;
        }
        Ok(())
    }
}

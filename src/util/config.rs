//! Configuration file support.
//!
//! Two optional configuration files are read:
//! - Global: `~/.contribs/config.toml` - user-wide defaults
//! - Project: `contribs.toml` in the contribs directory
//!
//! Project config takes precedence over global config. Command line flags
//! and environment variables override both; that layering happens in the
//! binary.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Name of the project configuration file inside the contribs directory.
pub const PROJECT_CONFIG_FILE: &str = "contribs.toml";

/// Contribs configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Qt installation settings
    pub qt: QtConfig,

    /// Android toolchain settings
    pub android: AndroidConfig,

    /// Build settings
    pub build: BuildConfig,
}

/// Qt installation settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct QtConfig {
    /// Qt version the modules are built against (e.g. "6.6.3")
    pub version: Option<String>,

    /// Root of the Qt installation (the directory holding `<version>/`)
    pub directory: Option<PathBuf>,
}

/// Android toolchain settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AndroidConfig {
    pub sdk: Option<PathBuf>,
    pub ndk: Option<PathBuf>,
}

/// Build-related configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BuildConfig {
    /// Number of parallel compile jobs (defaults to the CPU count)
    pub jobs: Option<usize>,

    /// Targets to build when `--targets` is not given
    pub targets: Vec<String>,

    /// Modules to build when `--softwares` is not given
    pub softwares: Vec<String>,
}

impl Config {
    /// Load configuration from a file.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config: {}", path.display()))?;

        toml::from_str(&contents)
            .with_context(|| format!("failed to parse config: {}", path.display()))
    }

    /// Load configuration with fallback to defaults if the file doesn't exist
    /// or can't be parsed.
    pub fn load_or_default(path: &Path) -> Self {
        if path.exists() {
            Self::load(path).unwrap_or_else(|e| {
                tracing::warn!("Failed to load config from {}: {:#}", path.display(), e);
                Self::default()
            })
        } else {
            Self::default()
        }
    }

    /// Merge another config into this one (other takes precedence).
    pub fn merge(&mut self, other: Config) {
        if other.qt.version.is_some() {
            self.qt.version = other.qt.version;
        }
        if other.qt.directory.is_some() {
            self.qt.directory = other.qt.directory;
        }
        if other.android.sdk.is_some() {
            self.android.sdk = other.android.sdk;
        }
        if other.android.ndk.is_some() {
            self.android.ndk = other.android.ndk;
        }
        if other.build.jobs.is_some() {
            self.build.jobs = other.build.jobs;
        }
        if !other.build.targets.is_empty() {
            self.build.targets = other.build.targets;
        }
        if !other.build.softwares.is_empty() {
            self.build.softwares = other.build.softwares;
        }
    }
}

/// Load merged configuration from global and project locations.
///
/// Order of precedence (highest to lowest):
/// 1. Project config (`contribs.toml`)
/// 2. Global config (`~/.contribs/config.toml`)
/// 3. Defaults
pub fn load_config(global_path: Option<&Path>, project_path: &Path) -> Config {
    let mut config = Config::default();

    if let Some(global_path) = global_path {
        if global_path.exists() {
            tracing::debug!("Loading global config from {}", global_path.display());
            config.merge(Config::load_or_default(global_path));
        }
    }

    if project_path.exists() {
        tracing::debug!("Loading project config from {}", project_path.display());
        config.merge(Config::load_or_default(project_path));
    }

    config
}

/// Get the global contribs config directory (~/.contribs).
pub fn global_config_dir() -> Option<PathBuf> {
    directories::BaseDirs::new().map(|b| b.home_dir().join(".contribs"))
}

/// Get the global config path (~/.contribs/config.toml).
pub fn global_config_path() -> Option<PathBuf> {
    global_config_dir().map(|dir| dir.join("config.toml"))
}

/// Get the project config path (`<contribs dir>/contribs.toml`).
pub fn project_config_path(contribs_dir: &Path) -> PathBuf {
    contribs_dir.join(PROJECT_CONFIG_FILE)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_parse_full_config() {
        let config: Config = toml::from_str(
            r#"
[qt]
version = "6.7.2"
directory = "/opt/Qt"

[android]
sdk = "/opt/android-sdk"
ndk = "/opt/android-sdk/ndk/26.1.10909125"

[build]
jobs = 4
targets = ["android_armv8", "linux"]
"#,
        )
        .unwrap();

        assert_eq!(config.qt.version.as_deref(), Some("6.7.2"));
        assert_eq!(config.qt.directory, Some(PathBuf::from("/opt/Qt")));
        assert_eq!(config.android.sdk, Some(PathBuf::from("/opt/android-sdk")));
        assert_eq!(config.build.jobs, Some(4));
        assert_eq!(config.build.targets, ["android_armv8", "linux"]);
        assert!(config.build.softwares.is_empty());
    }

    #[test]
    fn test_empty_config_is_default() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_merge_prefers_other() {
        let mut base = Config::default();
        base.qt.version = Some("6.5.0".into());
        base.android.ndk = Some(PathBuf::from("/old/ndk"));
        base.build.jobs = Some(2);

        let mut over = Config::default();
        over.qt.version = Some("6.6.3".into());
        over.build.softwares = vec!["qtmqtt".into()];

        base.merge(over);
        assert_eq!(base.qt.version.as_deref(), Some("6.6.3"));
        assert_eq!(base.android.ndk, Some(PathBuf::from("/old/ndk")));
        assert_eq!(base.build.jobs, Some(2));
        assert_eq!(base.build.softwares, ["qtmqtt"]);
    }

    #[test]
    fn test_project_overrides_global() {
        let tmp = TempDir::new().unwrap();
        let global = tmp.path().join("config.toml");
        let project = tmp.path().join(PROJECT_CONFIG_FILE);
        std::fs::write(&global, "[qt]\nversion = \"6.5.0\"\ndirectory = \"/opt/Qt\"\n").unwrap();
        std::fs::write(&project, "[qt]\nversion = \"6.6.3\"\n").unwrap();

        let config = load_config(Some(&global), &project);
        assert_eq!(config.qt.version.as_deref(), Some("6.6.3"));
        assert_eq!(config.qt.directory, Some(PathBuf::from("/opt/Qt")));
    }

    #[test]
    fn test_missing_files_give_defaults() {
        let tmp = TempDir::new().unwrap();
        let config = load_config(None, &tmp.path().join(PROJECT_CONFIG_FILE));
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_invalid_file_falls_back_to_default() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join(PROJECT_CONFIG_FILE);
        std::fs::write(&path, "[build]\njobs = \"many\"\n").unwrap();

        assert!(Config::load(&path).is_err());
        assert_eq!(Config::load_or_default(&path), Config::default());
    }
}

//! Facts about the machine running the build.
//!
//! Everything the resolver and the toolchain planner need to know about the
//! host is captured once at startup in a [`HostFacts`] value and passed down
//! explicitly. Nothing below this module reads the process environment.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::core::software::QtVersion;
use crate::core::target::VisualStudio;

/// Operating system the build runs on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HostOs {
    Linux,
    Macos,
    Windows,
}

impl HostOs {
    /// Map a Rust `target_os` name, e.g. [`std::env::consts::OS`].
    pub fn from_os_name(name: &str) -> Option<Self> {
        match name {
            "linux" => Some(HostOs::Linux),
            "macos" => Some(HostOs::Macos),
            "windows" => Some(HostOs::Windows),
            _ => None,
        }
    }

    /// The host this binary was compiled for.
    pub fn current() -> Option<Self> {
        Self::from_os_name(std::env::consts::OS)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            HostOs::Linux => "linux",
            HostOs::Macos => "macos",
            HostOs::Windows => "windows",
        }
    }

    /// Qt label of the host-architecture Qt used when cross compiling.
    pub fn host_qt_label(&self) -> Option<&'static str> {
        match self {
            HostOs::Linux => Some("gcc_64"),
            HostOs::Macos => Some("macOS"),
            HostOs::Windows => None,
        }
    }
}

impl fmt::Display for HostOs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Immutable snapshot of the host and of the toolchain settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostFacts {
    pub os: HostOs,
    pub arch: String,
    pub cpu_count: usize,
    /// The `contribs/` directory the tool runs from
    pub contribs_dir: PathBuf,
    pub qt_version: QtVersion,
    /// Root of the Qt installation (`QT_DIRECTORY`)
    pub qt_directory: Option<PathBuf>,
    /// `ANDROID_SDK_ROOT`
    pub android_sdk: Option<PathBuf>,
    /// `ANDROID_NDK_ROOT`; its presence also enables the android targets
    pub android_ndk: Option<PathBuf>,
    /// Derived from `VisualStudioVersion`
    pub visual_studio: VisualStudio,
}

impl HostFacts {
    /// Host facts with default settings and no SDKs configured.
    pub fn new(os: HostOs, contribs_dir: impl Into<PathBuf>) -> Self {
        HostFacts {
            os,
            arch: std::env::consts::ARCH.to_string(),
            cpu_count: 1,
            contribs_dir: contribs_dir.into(),
            qt_version: QtVersion::default(),
            qt_directory: None,
            android_sdk: None,
            android_ndk: None,
            visual_studio: VisualStudio::default(),
        }
    }

    pub fn with_cpu_count(mut self, cpu_count: usize) -> Self {
        self.cpu_count = cpu_count.max(1);
        self
    }

    pub fn with_qt_version(mut self, version: QtVersion) -> Self {
        self.qt_version = version;
        self
    }

    pub fn with_qt_directory(mut self, dir: Option<PathBuf>) -> Self {
        self.qt_directory = non_empty(dir);
        self
    }

    pub fn with_android_sdk(mut self, dir: Option<PathBuf>) -> Self {
        self.android_sdk = non_empty(dir);
        self
    }

    pub fn with_android_ndk(mut self, dir: Option<PathBuf>) -> Self {
        self.android_ndk = non_empty(dir);
        self
    }

    pub fn with_visual_studio(mut self, vs: VisualStudio) -> Self {
        self.visual_studio = vs;
        self
    }

    /// `<qt dir>/<version>/<label>` for a Qt label.
    ///
    /// Without a configured Qt directory this is a relative path, which the
    /// build driver reports as missing before anything runs.
    pub fn qt_prefix(&self, qt_label: &str) -> PathBuf {
        self.qt_directory
            .as_deref()
            .unwrap_or_else(|| Path::new(""))
            .join(self.qt_version.to_string())
            .join(qt_label)
    }
}

/// Treat an empty path (e.g. `QT_DIRECTORY=""`) as unset.
fn non_empty(dir: Option<PathBuf>) -> Option<PathBuf> {
    dir.filter(|d| !d.as_os_str().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_os_name() {
        assert_eq!(HostOs::from_os_name("linux"), Some(HostOs::Linux));
        assert_eq!(HostOs::from_os_name("macos"), Some(HostOs::Macos));
        assert_eq!(HostOs::from_os_name("windows"), Some(HostOs::Windows));
        assert_eq!(HostOs::from_os_name("freebsd"), None);
    }

    #[test]
    fn test_empty_paths_are_unset() {
        let host = HostFacts::new(HostOs::Linux, "/work/contribs")
            .with_android_ndk(Some(PathBuf::new()))
            .with_qt_directory(Some(PathBuf::from("/opt/Qt")));
        assert_eq!(host.android_ndk, None);
        assert_eq!(host.qt_directory, Some(PathBuf::from("/opt/Qt")));
    }

    #[test]
    fn test_qt_prefix() {
        let host = HostFacts::new(HostOs::Linux, "/work/contribs")
            .with_qt_directory(Some(PathBuf::from("/opt/Qt")));
        assert_eq!(
            host.qt_prefix("gcc_64"),
            PathBuf::from("/opt/Qt").join("6.6.3").join("gcc_64")
        );
    }

    #[test]
    fn test_cpu_count_is_at_least_one() {
        let host = HostFacts::new(HostOs::Macos, "/work/contribs").with_cpu_count(0);
        assert_eq!(host.cpu_count, 1);
    }
}

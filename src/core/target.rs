//! Build targets.
//!
//! A [`Target`] is one (operating system, architecture, Qt label) triple the
//! contribs get built for. Targets only ever come out of [`CATALOG`]: adding
//! a platform is an edit to that table (and to [`NAMED_TARGETS`] if it needs a
//! command-line name), never a new branch somewhere else.

use std::fmt;

use serde::Serialize;

use crate::util::errors::ConfigurationError;

/// Operating system a target is built for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TargetOs {
    Linux,
    Macos,
    Windows,
    Android,
    Ios,
}

impl TargetOs {
    pub fn as_str(&self) -> &'static str {
        match self {
            TargetOs::Linux => "linux",
            TargetOs::Macos => "macos",
            TargetOs::Windows => "windows",
            TargetOs::Android => "android",
            TargetOs::Ios => "ios",
        }
    }

    /// Mobile targets are always cross-compiled and need a host Qt.
    pub fn is_mobile(&self) -> bool {
        matches!(self, TargetOs::Android | TargetOs::Ios)
    }
}

impl fmt::Display for TargetOs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Architecture tag of a target.
///
/// The meaning depends on the operating system: `Unified` is a fat
/// x86_64+arm64 binary on macOS but a device+simulator build on iOS, and
/// macOS spells 64-bit ARM `arm64` where every other platform says `armv8`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum TargetArch {
    #[serde(rename = "x86")]
    X86,
    #[serde(rename = "x86_64")]
    X86_64,
    #[serde(rename = "armv7")]
    Armv7,
    #[serde(rename = "armv8")]
    Armv8,
    #[serde(rename = "arm64")]
    Arm64,
    #[serde(rename = "unified")]
    Unified,
    #[serde(rename = "simulator")]
    Simulator,
}

impl TargetArch {
    pub fn as_str(&self) -> &'static str {
        match self {
            TargetArch::X86 => "x86",
            TargetArch::X86_64 => "x86_64",
            TargetArch::Armv7 => "armv7",
            TargetArch::Armv8 => "armv8",
            TargetArch::Arm64 => "arm64",
            TargetArch::Unified => "unified",
            TargetArch::Simulator => "simulator",
        }
    }
}

impl fmt::Display for TargetArch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Visual Studio generation used to build windows targets natively.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
pub enum VisualStudio {
    #[default]
    #[serde(rename = "2019")]
    Vs2019,
    #[serde(rename = "2022")]
    Vs2022,
}

impl VisualStudio {
    /// Pick the generation from the `VisualStudioVersion` environment signal.
    ///
    /// Only `17.0` selects 2022; anything else, including no signal at all,
    /// falls back to 2019.
    pub fn from_version_signal(signal: Option<&str>) -> Self {
        match signal {
            Some(version) if version.contains("17.0") => VisualStudio::Vs2022,
            _ => VisualStudio::Vs2019,
        }
    }

    /// CMake generator name for this generation.
    pub fn generator(&self) -> &'static str {
        match self {
            VisualStudio::Vs2019 => "Visual Studio 16 2019",
            VisualStudio::Vs2022 => "Visual Studio 17 2022",
        }
    }
}

struct CatalogEntry {
    os: TargetOs,
    arch: TargetArch,
    qt_label: &'static str,
}

const fn entry(os: TargetOs, arch: TargetArch, qt_label: &'static str) -> CatalogEntry {
    CatalogEntry { os, arch, qt_label }
}

/// Every buildable (os, arch) pair and the prebuilt Qt variant it uses.
const CATALOG: &[CatalogEntry] = &[
    entry(TargetOs::Linux, TargetArch::X86_64, "gcc_64"),
    entry(TargetOs::Macos, TargetArch::Unified, "macOS"),
    entry(TargetOs::Macos, TargetArch::X86_64, "macOS"),
    entry(TargetOs::Macos, TargetArch::Arm64, "macOS"),
    entry(TargetOs::Windows, TargetArch::X86, "msvc2019_64"),
    entry(TargetOs::Windows, TargetArch::X86_64, "msvc2019_64"),
    entry(TargetOs::Windows, TargetArch::Armv7, "msvc2019_64"),
    entry(TargetOs::Windows, TargetArch::Armv8, "msvc2019_arm64"),
    entry(TargetOs::Android, TargetArch::Armv8, "android_arm64_v8a"),
    entry(TargetOs::Android, TargetArch::Armv7, "android_armv7"),
    entry(TargetOs::Android, TargetArch::X86_64, "android_x86_64"),
    entry(TargetOs::Android, TargetArch::X86, "android_x86"),
    entry(TargetOs::Ios, TargetArch::Unified, "iOS"),
    entry(TargetOs::Ios, TargetArch::Simulator, "iOS"),
    entry(TargetOs::Ios, TargetArch::Armv7, "iOS"),
    entry(TargetOs::Ios, TargetArch::Armv8, "iOS"),
];

/// A single build output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct Target {
    pub os: TargetOs,
    pub arch: TargetArch,
    /// Prebuilt Qt variant, i.e. the `<label>` in `<qt dir>/<version>/<label>/`
    pub qt_label: &'static str,
    /// Only set on windows targets
    #[serde(skip_serializing_if = "Option::is_none")]
    pub visual_studio: Option<VisualStudio>,
}

impl Target {
    /// Look up an (os, arch) pair in the catalog.
    pub fn new(os: TargetOs, arch: TargetArch) -> Result<Self, ConfigurationError> {
        CATALOG
            .iter()
            .find(|e| e.os == os && e.arch == arch)
            .map(|e| Target {
                os: e.os,
                arch: e.arch,
                qt_label: e.qt_label,
                visual_studio: None,
            })
            .ok_or(ConfigurationError::UnknownTarget { os, arch })
    }

    /// Pin the Visual Studio generation. Ignored for non-windows targets.
    pub fn with_visual_studio(mut self, vs: VisualStudio) -> Self {
        if self.os == TargetOs::Windows {
            self.visual_studio = Some(vs);
        }
        self
    }

    /// Every target in the catalog, in catalog order.
    pub fn catalog() -> impl Iterator<Item = Target> {
        CATALOG.iter().map(|e| Target {
            os: e.os,
            arch: e.arch,
            qt_label: e.qt_label,
            visual_studio: None,
        })
    }

    /// Directory name for this target's build and env directories.
    pub fn dir_name(&self) -> String {
        format!("{}_{}", self.os, self.arch)
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{} ({})", self.os, self.arch, self.qt_label)
    }
}

struct NamedTarget {
    name: &'static str,
    os: TargetOs,
    arch: TargetArch,
    visual_studio: Option<VisualStudio>,
}

const fn named(name: &'static str, os: TargetOs, arch: TargetArch) -> NamedTarget {
    NamedTarget {
        name,
        os,
        arch,
        visual_studio: None,
    }
}

const fn msvc(name: &'static str, vs: VisualStudio) -> NamedTarget {
    NamedTarget {
        name,
        os: TargetOs::Windows,
        arch: TargetArch::X86_64,
        visual_studio: Some(vs),
    }
}

/// Names accepted by `--targets`.
const NAMED_TARGETS: &[NamedTarget] = &[
    named("linux", TargetOs::Linux, TargetArch::X86_64),
    named("macos", TargetOs::Macos, TargetArch::Unified),
    named("macos_x86_64", TargetOs::Macos, TargetArch::X86_64),
    named("macos_arm64", TargetOs::Macos, TargetArch::Arm64),
    msvc("msvc2019", VisualStudio::Vs2019),
    msvc("msvc2022", VisualStudio::Vs2022),
    named("android_armv8", TargetOs::Android, TargetArch::Armv8),
    named("android_armv7", TargetOs::Android, TargetArch::Armv7),
    named("android_x86_64", TargetOs::Android, TargetArch::X86_64),
    named("android_x86", TargetOs::Android, TargetArch::X86),
    named("ios", TargetOs::Ios, TargetArch::Unified),
    named("ios_simulator", TargetOs::Ios, TargetArch::Simulator),
    named("ios_armv7", TargetOs::Ios, TargetArch::Armv7),
    named("ios_armv8", TargetOs::Ios, TargetArch::Armv8),
];

/// Map a `--targets` name to its target.
pub fn lookup_name(name: &str) -> Option<Target> {
    let named = NAMED_TARGETS.iter().find(|n| n.name == name)?;
    let target = Target::new(named.os, named.arch).ok()?;
    Some(match named.visual_studio {
        Some(vs) => target.with_visual_studio(vs),
        None => target,
    })
}

/// All names accepted by `--targets`, in display order.
pub fn target_names() -> impl Iterator<Item = &'static str> {
    NAMED_TARGETS.iter().map(|n| n.name)
}

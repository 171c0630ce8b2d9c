//! Error taxonomy for the contribs pipeline.
//!
//! Every error here is fatal. Nothing is retried in-process: the run stops,
//! whatever was already downloaded or built stays on disk, and the operator
//! re-invokes the tool once the underlying condition is fixed.

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

use crate::core::host::HostOs;
use crate::core::target::{TargetArch, TargetOs};

/// The target matrix or the toolchain settings cannot produce a valid build.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigurationError {
    /// An (os, arch) pair outside the target catalog.
    #[error("unknown target `{os}_{arch}`: not part of the target catalog")]
    UnknownTarget { os: TargetOs, arch: TargetArch },

    /// The target exists but cannot be built from this host.
    #[error("no toolchain to build `{os}_{arch}` from a {host} host")]
    UnsupportedCombination {
        host: HostOs,
        os: TargetOs,
        arch: TargetArch,
    },

    /// A setting needed for this target was never provided.
    #[error("`{name}` is required {reason}\n\
             help: set the {name} environment variable or pass {flag}")]
    MissingVariable {
        name: &'static str,
        flag: &'static str,
        reason: String,
    },

    /// A program the build relies on could not be located.
    #[error("`{tool}` not found\n\
             help: {hint}")]
    MissingTool { tool: String, hint: String },

    #[error("invalid Qt version `{value}`: {reason}")]
    InvalidQtVersion { value: String, reason: String },
}

/// The three blocking steps a build driver runs for every module.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildStep {
    Configure,
    Compile,
    Install,
}

impl fmt::Display for BuildStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BuildStep::Configure => write!(f, "configure"),
            BuildStep::Compile => write!(f, "compile"),
            BuildStep::Install => write!(f, "install"),
        }
    }
}

/// Top-level error for a contribs run.
#[derive(Debug, Error)]
pub enum ContribsError {
    #[error("this tool MUST be run from the contribs/ directory (current directory: {})", cwd.display())]
    WrongDirectory { cwd: PathBuf },

    #[error("this tool SHOULD NOT be run as root")]
    ElevatedPrivileges,

    #[error("unsupported host operating system `{os}`")]
    UnsupportedHost { os: String },

    #[error(transparent)]
    Configuration(#[from] ConfigurationError),

    #[error("failed to download {url}: {reason}")]
    Fetch { url: String, reason: String },

    #[error("failed to extract {}: {reason}", archive.display())]
    Extract { archive: PathBuf, reason: String },

    #[error("{step} step failed: `{command}` exited with {}", display_code(*code))]
    BuildTool {
        step: BuildStep,
        command: String,
        code: Option<i32>,
    },
}

fn display_code(code: Option<i32>) -> String {
    match code {
        Some(code) => format!("code {}", code),
        None => "no exit code (terminated by signal)".to_string(),
    }
}

impl ContribsError {
    /// Process exit code for this error.
    ///
    /// A failing build tool propagates its own exit code; everything else
    /// exits with 1.
    pub fn exit_code(&self) -> i32 {
        match self {
            ContribsError::BuildTool {
                code: Some(code), ..
            } if *code != 0 => *code,
            _ => 1,
        }
    }
}

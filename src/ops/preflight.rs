//! Checks that must pass before anything touches the disk.

use std::path::Path;

use crate::core::host::HostOs;
use crate::util::errors::ContribsError;
use crate::util::process::ProcessBuilder;

/// Required name of the directory the tool runs from.
pub const CONTRIBS_DIR_NAME: &str = "contribs";

/// The tool lays out `src/`, `build/` and `env/` next to itself, so it
/// refuses to run anywhere but a directory named `contribs`.
pub fn check_working_dir(cwd: &Path) -> Result<(), ContribsError> {
    match cwd.file_name() {
        Some(name) if name == CONTRIBS_DIR_NAME => Ok(()),
        _ => Err(ContribsError::WrongDirectory {
            cwd: cwd.to_path_buf(),
        }),
    }
}

/// Refuse to run as root on unix hosts.
pub fn check_privileges(host: HostOs) -> Result<(), ContribsError> {
    if host == HostOs::Windows {
        return Ok(());
    }

    match effective_uid() {
        Some(0) => Err(ContribsError::ElevatedPrivileges),
        Some(uid) => {
            tracing::debug!("Running as uid {}", uid);
            Ok(())
        }
        None => {
            tracing::debug!("Could not determine the effective user id");
            Ok(())
        }
    }
}

/// Effective user id, as reported by `id -u`.
pub fn effective_uid() -> Option<u32> {
    let output = ProcessBuilder::new("id").arg("-u").exec_and_check().ok()?;
    String::from_utf8_lossy(&output.stdout).trim().parse().ok()
}

//! Implementation of `--clean` and `--rebuild`.

use anyhow::Result;

use crate::util::context::ContribsContext;
use crate::util::fs::remove_dir_all_if_exists;
use crate::util::shell::{Shell, Status};

/// Remove downloads, builds and environments (`src/`, `build/`, `env/`).
///
/// `deploy/` is kept: its tools don't depend on the Qt version.
pub fn clean(ctx: &ContribsContext, shell: &Shell) -> Result<()> {
    for dir in [ctx.src_dir(), ctx.build_dir(), ctx.env_dir()] {
        if remove_dir_all_if_exists(&dir)? {
            shell.status(Status::Removed, dir.display());
        }
    }
    Ok(())
}

/// Remove `build/` so every module is extracted and configured again.
pub fn rebuild(ctx: &ContribsContext, shell: &Shell) -> Result<()> {
    let dir = ctx.build_dir();
    if remove_dir_all_if_exists(&dir)? {
        shell.status(Status::Removed, dir.display());
    }
    Ok(())
}

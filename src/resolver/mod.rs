//! Target resolution.
//!
//! Turns the `--targets` list and the host facts into the ordered list of
//! targets to build. The resolver is pure and deterministic: it never touches
//! the filesystem or the environment.

use std::collections::BTreeSet;

use crate::core::host::{HostFacts, HostOs};
use crate::core::target::{lookup_name, target_names, Target, TargetArch, TargetOs};

/// Android targets added whenever an NDK is available, in build order.
const ANDROID_ARCHES: [TargetArch; 4] = [
    TargetArch::Armv8,
    TargetArch::Armv7,
    TargetArch::X86_64,
    TargetArch::X86,
];

/// Resolve the ordered list of targets to build.
///
/// With an explicit list, the target name table is walked in its own order
/// and every name present in the list is kept, so the result does not depend
/// on the order the names were given in. Unrecognized names are dropped
/// without an error; a list made only of unknown names resolves to nothing.
///
/// Without one, targets are picked from the host: linux builds linux,
/// macOS builds macOS and iOS, windows builds windows with the Visual Studio
/// generation the environment advertises. An available NDK adds the four
/// android targets on any host.
pub fn resolve_targets(explicit: &[String], host: &HostFacts) -> Vec<Target> {
    if explicit.is_empty() {
        tracing::debug!("Selecting targets for a {} host", host.os);
        return host_targets(host);
    }

    tracing::debug!("Selecting targets from {:?}", explicit);

    let requested: BTreeSet<&str> = explicit.iter().map(|name| name.trim()).collect();
    for name in &requested {
        if lookup_name(name).is_none() {
            tracing::debug!("Ignoring unknown target name `{}`", name);
        }
    }

    let mut targets: Vec<Target> = Vec::new();
    for name in target_names().filter(|name| requested.contains(name)) {
        let Some(target) = lookup_name(name) else {
            continue;
        };

        if let Some(existing) = targets.iter().find(|t| t.dir_name() == target.dir_name()) {
            if existing.visual_studio != target.visual_studio {
                tracing::warn!(
                    "`{}` shares its build directory with an earlier target; keeping {}",
                    name,
                    existing
                );
            }
            continue;
        }

        targets.push(target);
    }

    targets
}

fn host_targets(host: &HostFacts) -> Vec<Target> {
    let mut targets = Vec::new();

    match host.os {
        HostOs::Linux => targets.extend(catalog(TargetOs::Linux, TargetArch::X86_64)),
        HostOs::Macos => {
            targets.extend(catalog(TargetOs::Macos, TargetArch::Unified));
            targets.extend(catalog(TargetOs::Ios, TargetArch::Unified));
        }
        HostOs::Windows => targets.extend(
            catalog(TargetOs::Windows, TargetArch::X86_64)
                .map(|t| t.with_visual_studio(host.visual_studio)),
        ),
    }

    if host.android_ndk.is_some() {
        for arch in ANDROID_ARCHES {
            targets.extend(catalog(TargetOs::Android, arch));
        }
    }

    targets
}

/// Catalog lookup for pairs this module knows are present.
fn catalog(os: TargetOs, arch: TargetArch) -> Option<Target> {
    Target::new(os, arch).ok()
}

//! Toolchain planning.
//!
//! A [`ToolchainPlan`] is everything the build driver needs to configure,
//! compile and install a module for one target: the CMake generator, the
//! arguments that select the toolchain and architecture, the static/shared
//! switch and the environment to run under.
//!
//! Plans are derived by [`derive_plan`], a pure function of the target and
//! the host facts. Every supported (host, target os, arch) triple is listed
//! in its match; anything else is a configuration error, never a default.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::core::host::{HostFacts, HostOs};
use crate::core::target::{Target, TargetArch, TargetOs};
use crate::util::errors::ConfigurationError;

/// Generator used everywhere except native iOS and windows builds.
pub const NINJA: &str = "Ninja";

/// Generator for iOS builds.
pub const XCODE: &str = "Xcode";

/// Minimum android API level the modules are built for.
pub const ANDROID_PLATFORM: &str = "android-23";

/// Environment variable pointing cross builds at the host Qt tools.
pub const QT_HOST_PATH: &str = "QT_HOST_PATH";

/// Concrete toolchain settings for building one target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ToolchainPlan {
    /// CMake generator (`-G`)
    pub generator: String,
    /// Arguments that must precede any other configure argument
    pub invocation_prefix: Vec<String>,
    pub build_shared_libs: bool,
    pub build_static_libs: bool,
    /// Variables to set for every build tool invocation
    pub environment_overrides: BTreeMap<String, String>,
    /// CMake executable for the compile and install steps
    pub cmake_program: String,
    /// Qt's `qt-configure-module` script for the target's Qt variant
    pub configure_tool: PathBuf,
}

impl ToolchainPlan {
    /// Whether the generator builds several configurations from one tree,
    /// which means `--config` has to be passed when compiling.
    pub fn is_multi_config(&self) -> bool {
        self.generator != NINJA
    }

    /// Whether the install step can go through `ninja install`.
    pub fn uses_ninja(&self) -> bool {
        self.generator == NINJA
    }

    /// CMake cache arguments selecting the library flavour.
    pub fn library_args(&self) -> [String; 2] {
        [
            format!("-DBUILD_SHARED_LIBS={}", on_off(self.build_shared_libs)),
            format!("-DBUILD_STATIC_LIBS={}", on_off(self.build_static_libs)),
        ]
    }
}

fn on_off(value: bool) -> &'static str {
    if value {
        "ON"
    } else {
        "OFF"
    }
}

/// Derive the toolchain plan for building `target` on this host.
pub fn derive_plan(
    target: &Target,
    host: &HostFacts,
) -> Result<ToolchainPlan, ConfigurationError> {
    let unsupported = || ConfigurationError::UnsupportedCombination {
        host: host.os,
        os: target.os,
        arch: target.arch,
    };

    let mut plan = ToolchainPlan {
        generator: NINJA.to_string(),
        invocation_prefix: Vec::new(),
        build_shared_libs: true,
        build_static_libs: false,
        environment_overrides: BTreeMap::new(),
        cmake_program: "cmake".to_string(),
        configure_tool: configure_tool(host, target.qt_label),
    };

    match (host.os, target.os) {
        (_, TargetOs::Android) => {
            let abi = android_abi(target.arch).ok_or_else(unsupported)?;
            let ndk = host
                .android_ndk
                .as_deref()
                .ok_or_else(|| ConfigurationError::MissingVariable {
                    name: "ANDROID_NDK_ROOT",
                    flag: "--android-ndk",
                    reason: format!("to build for {}", target.dir_name()),
                })?;

            plan.invocation_prefix = vec![
                toolchain_file(&ndk.join("build").join("cmake").join("android.toolchain.cmake")),
                format!("-DANDROID_ABI={}", abi),
                format!("-DANDROID_PLATFORM={}", ANDROID_PLATFORM),
            ];
            if let Some(sdk) = &host.android_sdk {
                plan.invocation_prefix
                    .push(format!("-DANDROID_SDK_ROOT={}", sdk.display()));
            }
        }

        (HostOs::Linux, TargetOs::Linux) if target.arch == TargetArch::X86_64 => {}

        (HostOs::Linux, TargetOs::Windows) => {
            let cmake = mingw_cmake(target.arch).ok_or_else(unsupported)?;
            plan.cmake_program = cmake.to_string();
        }

        (HostOs::Macos, TargetOs::Macos) => {
            let archs = osx_architectures(target.arch).ok_or_else(unsupported)?;
            plan.invocation_prefix = vec![format!("-DCMAKE_OSX_ARCHITECTURES={}", archs)];
        }

        (HostOs::Macos, TargetOs::Ios) => {
            let platform = ios_platform(target.arch).ok_or_else(unsupported)?;
            let ios_toolchain = host.contribs_dir.join("tools").join("ios.toolchain.cmake");

            plan.generator = XCODE.to_string();
            plan.invocation_prefix = vec![
                toolchain_file(&ios_toolchain),
                format!("-DPLATFORM={}", platform),
            ];
            plan.build_shared_libs = false;
            plan.build_static_libs = true;
        }

        (HostOs::Windows, TargetOs::Windows) => {
            let platform = msvc_platform(target.arch).ok_or_else(unsupported)?;
            let vs = target.visual_studio.unwrap_or(host.visual_studio);

            plan.generator = vs.generator().to_string();
            plan.invocation_prefix = vec!["-A".to_string(), platform.to_string()];
        }

        _ => return Err(unsupported()),
    }

    if target.os.is_mobile() {
        if let Some(label) = host.os.host_qt_label() {
            let qt_directory =
                host.qt_directory
                    .as_ref()
                    .ok_or_else(|| ConfigurationError::MissingVariable {
                        name: "QT_DIRECTORY",
                        flag: "--qt-directory",
                        reason: format!("to cross-compile for {}", target.dir_name()),
                    })?;
            let host_qt = qt_directory
                .join(host.qt_version.to_string())
                .join(label);
            plan.environment_overrides
                .insert(QT_HOST_PATH.to_string(), host_qt.display().to_string());
        }
    }

    Ok(plan)
}

fn configure_tool(host: &HostFacts, qt_label: &str) -> PathBuf {
    let script = match host.os {
        HostOs::Windows => "qt-configure-module.bat",
        HostOs::Linux | HostOs::Macos => "qt-configure-module",
    };
    host.qt_prefix(qt_label).join("bin").join(script)
}

fn toolchain_file(path: &Path) -> String {
    format!("-DCMAKE_TOOLCHAIN_FILE={}", path.display())
}

// Per-architecture tables. `None` means the architecture has no toolchain
// for that platform.

fn android_abi(arch: TargetArch) -> Option<&'static str> {
    match arch {
        TargetArch::X86 => Some("x86"),
        TargetArch::X86_64 => Some("x86_64"),
        TargetArch::Armv7 => Some("armeabi-v7a"),
        TargetArch::Armv8 => Some("arm64-v8a"),
        _ => None,
    }
}

fn ios_platform(arch: TargetArch) -> Option<&'static str> {
    match arch {
        TargetArch::Unified => Some("OS64COMBINED"),
        TargetArch::Simulator => Some("SIMULATOR64"),
        TargetArch::Armv7 => Some("OS"),
        TargetArch::Armv8 => Some("OS64"),
        _ => None,
    }
}

fn osx_architectures(arch: TargetArch) -> Option<&'static str> {
    match arch {
        TargetArch::Unified => Some("x86_64;arm64"),
        TargetArch::X86_64 => Some("x86_64"),
        TargetArch::Arm64 => Some("arm64"),
        _ => None,
    }
}

fn msvc_platform(arch: TargetArch) -> Option<&'static str> {
    match arch {
        TargetArch::X86 => Some("Win32"),
        TargetArch::X86_64 => Some("x64"),
        TargetArch::Armv7 => Some("ARM"),
        TargetArch::Armv8 => Some("ARM64"),
        _ => None,
    }
}

fn mingw_cmake(arch: TargetArch) -> Option<&'static str> {
    match arch {
        TargetArch::X86 => Some("i686-w64-mingw32-cmake"),
        TargetArch::X86_64 => Some("x86_64-w64-mingw32-cmake"),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::target::{lookup_name, VisualStudio};
    use crate::resolver::resolve_targets;

    fn host(os: HostOs) -> HostFacts {
        HostFacts::new(os, "/work/contribs")
            .with_qt_directory(Some(PathBuf::from("/opt/Qt")))
            .with_android_ndk(Some(PathBuf::from("/opt/ndk")))
    }

    fn target(os: TargetOs, arch: TargetArch) -> Target {
        Target::new(os, arch).unwrap()
    }

    #[test]
    fn test_linux_native_plan() {
        let targets = resolve_targets(&["linux".to_string()], &host(HostOs::Linux));
        assert_eq!(targets.len(), 1);
        assert_eq!(targets[0].qt_label, "gcc_64");

        let plan = derive_plan(&targets[0], &host(HostOs::Linux)).unwrap();
        assert_eq!(plan.generator, "Ninja");
        assert!(plan.invocation_prefix.is_empty());
        assert!(plan.build_shared_libs);
        assert!(!plan.build_static_libs);
        assert!(plan.environment_overrides.is_empty());
        assert_eq!(plan.cmake_program, "cmake");
        assert_eq!(
            plan.configure_tool,
            PathBuf::from("/opt/Qt/6.6.3/gcc_64/bin/qt-configure-module")
        );
    }

    #[test]
    fn test_ios_armv8_plan() {
        let targets = resolve_targets(&["ios_armv8".to_string()], &host(HostOs::Macos));
        assert_eq!(targets.len(), 1);
        assert_eq!((targets[0].os, targets[0].arch), (TargetOs::Ios, TargetArch::Armv8));

        let plan = derive_plan(&targets[0], &host(HostOs::Macos)).unwrap();
        assert_eq!(plan.generator, "Xcode");
        assert!(plan.invocation_prefix.contains(&"-DPLATFORM=OS64".to_string()));
        assert!(plan.invocation_prefix[0].starts_with("-DCMAKE_TOOLCHAIN_FILE="));
        assert!(plan.invocation_prefix[0].ends_with("ios.toolchain.cmake"));
        assert!(!plan.build_shared_libs);
        assert!(plan.build_static_libs);
    }

    #[test]
    fn test_ios_platform_tags() {
        let macos = host(HostOs::Macos);
        for (arch, tag) in [
            (TargetArch::Unified, "-DPLATFORM=OS64COMBINED"),
            (TargetArch::Simulator, "-DPLATFORM=SIMULATOR64"),
            (TargetArch::Armv7, "-DPLATFORM=OS"),
            (TargetArch::Armv8, "-DPLATFORM=OS64"),
        ] {
            let plan = derive_plan(&target(TargetOs::Ios, arch), &macos).unwrap();
            assert_eq!(plan.invocation_prefix[1], tag);
            assert!(plan.build_static_libs && !plan.build_shared_libs);
        }
    }

    #[test]
    fn test_macos_architecture_flags() {
        let macos = host(HostOs::Macos);
        let unified = derive_plan(&target(TargetOs::Macos, TargetArch::Unified), &macos).unwrap();
        assert_eq!(unified.generator, "Ninja");
        assert_eq!(
            unified.invocation_prefix,
            ["-DCMAKE_OSX_ARCHITECTURES=x86_64;arm64"]
        );

        let arm = derive_plan(&target(TargetOs::Macos, TargetArch::Arm64), &macos).unwrap();
        assert_eq!(arm.invocation_prefix, ["-DCMAKE_OSX_ARCHITECTURES=arm64"]);
        assert!(arm.environment_overrides.is_empty());
    }

    #[test]
    fn test_android_plans() {
        for (arch, abi) in [
            (TargetArch::X86, "x86"),
            (TargetArch::X86_64, "x86_64"),
            (TargetArch::Armv7, "armeabi-v7a"),
            (TargetArch::Armv8, "arm64-v8a"),
        ] {
            let plan = derive_plan(&target(TargetOs::Android, arch), &host(HostOs::Linux)).unwrap();
            assert_eq!(plan.generator, "Ninja");
            assert_eq!(
                plan.invocation_prefix,
                [
                    format!(
                        "-DCMAKE_TOOLCHAIN_FILE={}",
                        PathBuf::from("/opt/ndk/build/cmake/android.toolchain.cmake").display()
                    ),
                    format!("-DANDROID_ABI={}", abi),
                    "-DANDROID_PLATFORM=android-23".to_string(),
                ]
            );
            assert!(plan.build_shared_libs);
        }
    }

    #[test]
    fn test_android_on_linux_sets_host_qt_path() {
        let linux = host(HostOs::Linux);
        for arch in [TargetArch::X86, TargetArch::X86_64, TargetArch::Armv7, TargetArch::Armv8] {
            let plan = derive_plan(&target(TargetOs::Android, arch), &linux).unwrap();
            let value = plan.environment_overrides.get(QT_HOST_PATH).unwrap();
            assert!(!value.is_empty());
            assert_eq!(
                PathBuf::from(value),
                PathBuf::from("/opt/Qt").join("6.6.3").join("gcc_64")
            );
        }
    }

    #[test]
    fn test_ios_on_macos_uses_macos_host_qt() {
        let ios = target(TargetOs::Ios, TargetArch::Unified);
        let plan = derive_plan(&ios, &host(HostOs::Macos)).unwrap();
        assert_eq!(
            PathBuf::from(&plan.environment_overrides[QT_HOST_PATH]),
            PathBuf::from("/opt/Qt").join("6.6.3").join("macOS")
        );
    }

    #[test]
    fn test_android_on_windows_has_no_host_qt_override() {
        let android = target(TargetOs::Android, TargetArch::Armv8);
        let plan = derive_plan(&android, &host(HostOs::Windows)).unwrap();
        assert_eq!(plan.generator, "Ninja");
        assert!(plan.environment_overrides.is_empty());
        assert!(plan
            .configure_tool
            .to_string_lossy()
            .ends_with("qt-configure-module.bat"));
    }

    #[test]
    fn test_android_sdk_is_forwarded_when_known() {
        let facts = host(HostOs::Linux).with_android_sdk(Some(PathBuf::from("/opt/sdk")));
        let plan = derive_plan(&target(TargetOs::Android, TargetArch::X86), &facts).unwrap();
        assert_eq!(plan.invocation_prefix.len(), 4);
        assert!(plan.invocation_prefix[3].starts_with("-DANDROID_SDK_ROOT="));
    }

    #[test]
    fn test_android_without_ndk_is_an_error() {
        let facts = HostFacts::new(HostOs::Linux, "/work/contribs")
            .with_qt_directory(Some(PathBuf::from("/opt/Qt")));
        let err = derive_plan(&target(TargetOs::Android, TargetArch::Armv8), &facts).unwrap_err();
        assert!(matches!(
            err,
            ConfigurationError::MissingVariable {
                name: "ANDROID_NDK_ROOT",
                ..
            }
        ));
    }

    #[test]
    fn test_cross_build_without_qt_directory_is_an_error() {
        let facts = HostFacts::new(HostOs::Macos, "/work/contribs");
        let err = derive_plan(&target(TargetOs::Ios, TargetArch::Armv8), &facts).unwrap_err();
        assert!(matches!(
            err,
            ConfigurationError::MissingVariable {
                name: "QT_DIRECTORY",
                ..
            }
        ));
    }

    #[test]
    fn test_windows_native_plans() {
        let windows = host(HostOs::Windows);
        for (arch, platform) in [
            (TargetArch::X86, "Win32"),
            (TargetArch::X86_64, "x64"),
            (TargetArch::Armv7, "ARM"),
            (TargetArch::Armv8, "ARM64"),
        ] {
            let plan = derive_plan(&target(TargetOs::Windows, arch), &windows).unwrap();
            assert_eq!(plan.generator, "Visual Studio 16 2019");
            assert_eq!(plan.invocation_prefix, ["-A", platform]);
            assert!(plan.is_multi_config());
        }
    }

    #[test]
    fn test_windows_generator_follows_target() {
        let target = lookup_name("msvc2022").unwrap();
        let plan = derive_plan(&target, &host(HostOs::Windows)).unwrap();
        assert_eq!(plan.generator, "Visual Studio 17 2022");

        let unpinned = Target::new(TargetOs::Windows, TargetArch::X86_64).unwrap();
        let facts = host(HostOs::Windows).with_visual_studio(VisualStudio::Vs2022);
        let plan = derive_plan(&unpinned, &facts).unwrap();
        assert_eq!(plan.generator, "Visual Studio 17 2022");
    }

    #[test]
    fn test_windows_from_linux_uses_mingw() {
        let linux = host(HostOs::Linux);
        let plan = derive_plan(&target(TargetOs::Windows, TargetArch::X86_64), &linux).unwrap();
        assert_eq!(plan.generator, "Ninja");
        assert_eq!(plan.cmake_program, "x86_64-w64-mingw32-cmake");

        let plan = derive_plan(&target(TargetOs::Windows, TargetArch::X86), &linux).unwrap();
        assert_eq!(plan.cmake_program, "i686-w64-mingw32-cmake");
    }

    #[test]
    fn test_unsupported_combinations_are_rejected() {
        let cases = [
            (HostOs::Linux, TargetOs::Macos, TargetArch::Unified),
            (HostOs::Linux, TargetOs::Ios, TargetArch::Armv8),
            (HostOs::Linux, TargetOs::Windows, TargetArch::Armv8),
            (HostOs::Macos, TargetOs::Linux, TargetArch::X86_64),
            (HostOs::Macos, TargetOs::Windows, TargetArch::X86_64),
            (HostOs::Windows, TargetOs::Linux, TargetArch::X86_64),
            (HostOs::Windows, TargetOs::Ios, TargetArch::Unified),
        ];
        for (host_os, os, arch) in cases {
            let err = derive_plan(&target(os, arch), &host(host_os)).unwrap_err();
            assert_eq!(
                err,
                ConfigurationError::UnsupportedCombination {
                    host: host_os,
                    os,
                    arch
                }
            );
        }
    }

    #[test]
    fn test_every_catalog_target_has_a_plan_on_some_host() {
        for target in Target::catalog() {
            let planned = [HostOs::Linux, HostOs::Macos, HostOs::Windows]
                .into_iter()
                .any(|os| derive_plan(&target, &host(os)).is_ok());
            assert!(planned, "{} cannot be built anywhere", target);
        }
    }

    #[test]
    fn test_derivation_is_pure() {
        let facts = host(HostOs::Macos);
        for target in Target::catalog() {
            assert_eq!(derive_plan(&target, &facts), derive_plan(&target, &facts));
        }
    }

    #[test]
    fn test_library_args() {
        let ios = target(TargetOs::Ios, TargetArch::Unified);
        let plan = derive_plan(&ios, &host(HostOs::Macos)).unwrap();
        assert_eq!(
            plan.library_args(),
            ["-DBUILD_SHARED_LIBS=OFF", "-DBUILD_STATIC_LIBS=ON"]
        );
    }
}

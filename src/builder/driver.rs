//! Build driver for Qt modules.
//!
//! A module is built in three blocking steps, each run from the module's
//! `build/` directory:
//!
//! 1. configure: `qt-configure-module .. -- -G <generator> <plan args>`
//! 2. compile: `cmake --build . --target all --parallel <jobs>`
//! 3. install: `ninja install` (Ninja) or `cmake --install .`
//!
//! Any non-zero exit aborts the target immediately.

use std::path::Path;

use anyhow::Result;

use crate::builder::plan::ToolchainPlan;
use crate::util::errors::{BuildStep, ConfigurationError, ContribsError};
use crate::util::process::{find_executable, ProcessBuilder};

/// Configuration used for multi-config generators.
const BUILD_CONFIG: &str = "Release";

/// One module build: where it lives and how to drive it.
#[derive(Debug, Clone, Copy)]
pub struct ModuleBuild<'a> {
    pub plan: &'a ToolchainPlan,
    /// Extracted module sources
    pub source_dir: &'a Path,
    /// Out-of-tree build directory, inside the sources
    pub build_dir: &'a Path,
    pub jobs: usize,
}

/// The external build tool boundary.
pub trait BuildDriver {
    /// Check that every program the plan relies on is available.
    fn check_tools(&self, _plan: &ToolchainPlan) -> Result<()> {
        Ok(())
    }

    fn configure(&self, build: &ModuleBuild<'_>) -> Result<()>;

    fn compile(&self, build: &ModuleBuild<'_>) -> Result<()>;

    fn install(&self, build: &ModuleBuild<'_>) -> Result<()>;
}

/// Drives Qt's `qt-configure-module`, CMake and Ninja.
#[derive(Debug, Default)]
pub struct QtModuleDriver;

impl QtModuleDriver {
    pub fn new() -> Self {
        QtModuleDriver
    }

    /// The configure command for a module build.
    pub fn configure_command(build: &ModuleBuild<'_>) -> ProcessBuilder {
        let plan = build.plan;
        let cmd = ProcessBuilder::new(&plan.configure_tool)
            .arg(build.source_dir)
            .arg("--")
            .arg("-G")
            .arg(&plan.generator)
            .args(&plan.invocation_prefix)
            .args(plan.library_args());
        with_plan_env(cmd, build)
    }

    /// The compile command for a module build.
    pub fn compile_command(build: &ModuleBuild<'_>) -> ProcessBuilder {
        let plan = build.plan;
        let mut cmd = ProcessBuilder::new(&plan.cmake_program)
            .args(["--build", ".", "--target", "all", "--parallel"])
            .arg(build.jobs.max(1).to_string());

        // Multi-config generators (Xcode, Visual Studio) default to Debug
        if plan.is_multi_config() {
            cmd = cmd.arg("--config").arg(BUILD_CONFIG);
        }

        with_plan_env(cmd, build)
    }

    /// The install command for a module build.
    ///
    /// Ninja trees are installed through `ninja install`, which also picks up
    /// the Qt module's documentation and metatypes.
    pub fn install_command(build: &ModuleBuild<'_>) -> ProcessBuilder {
        let plan = build.plan;
        let cmd = if plan.uses_ninja() {
            ProcessBuilder::new("ninja").arg("install")
        } else {
            ProcessBuilder::new(&plan.cmake_program)
                .args(["--install", ".", "--config", BUILD_CONFIG])
        };
        with_plan_env(cmd, build)
    }

    fn run(step: BuildStep, cmd: ProcessBuilder) -> Result<()> {
        tracing::debug!("Running {}: {}", step, cmd.display_command());

        let status = cmd.status()?;
        if !status.success() {
            return Err(ContribsError::BuildTool {
                step,
                command: cmd.display_command(),
                code: status.code(),
            }
            .into());
        }
        Ok(())
    }
}

fn with_plan_env(cmd: ProcessBuilder, build: &ModuleBuild<'_>) -> ProcessBuilder {
    build
        .plan
        .environment_overrides
        .iter()
        .fold(cmd.cwd(build.build_dir), |cmd, (key, value)| cmd.env(key, value))
}

impl BuildDriver for QtModuleDriver {
    fn check_tools(&self, plan: &ToolchainPlan) -> Result<()> {
        if !plan.configure_tool.is_file() {
            return Err(ContribsError::from(ConfigurationError::MissingTool {
                tool: plan.configure_tool.display().to_string(),
                hint: "point QT_DIRECTORY (or --qt-directory) at a Qt installation \
                       that has the requested version and variant"
                    .to_string(),
            })
            .into());
        }

        let mut programs = vec![plan.cmake_program.as_str()];
        if plan.uses_ninja() {
            programs.push("ninja");
        }

        for program in programs {
            if find_executable(program).is_none() {
                return Err(ContribsError::from(ConfigurationError::MissingTool {
                    tool: program.to_string(),
                    hint: format!("install {} and ensure it's in your PATH", program),
                })
                .into());
            }
        }

        Ok(())
    }

    fn configure(&self, build: &ModuleBuild<'_>) -> Result<()> {
        Self::run(BuildStep::Configure, Self::configure_command(build))
    }

    fn compile(&self, build: &ModuleBuild<'_>) -> Result<()> {
        Self::run(BuildStep::Compile, Self::compile_command(build))
    }

    fn install(&self, build: &ModuleBuild<'_>) -> Result<()> {
        Self::run(BuildStep::Install, Self::install_command(build))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::plan::derive_plan;
    use crate::core::host::{HostFacts, HostOs};
    use crate::core::target::{lookup_name, Target, TargetArch, TargetOs};
    use std::path::PathBuf;

    fn plan_for(name: &str, os: HostOs) -> ToolchainPlan {
        let host = HostFacts::new(os, "/work/contribs")
            .with_qt_directory(Some(PathBuf::from("/opt/Qt")))
            .with_android_ndk(Some(PathBuf::from("/opt/ndk")));
        derive_plan(&lookup_name(name).unwrap(), &host).unwrap()
    }

    fn module<'a>(plan: &'a ToolchainPlan, src: &'a Path, build: &'a Path) -> ModuleBuild<'a> {
        ModuleBuild {
            plan,
            source_dir: src,
            build_dir: build,
            jobs: 8,
        }
    }

    #[test]
    fn test_configure_command_for_linux() {
        let plan = plan_for("linux", HostOs::Linux);
        let build = module(&plan, Path::new(".."), Path::new("/b"));
        let cmd = QtModuleDriver::configure_command(&build);

        assert!(cmd.get_program().ends_with("qt-configure-module"));
        assert_eq!(
            cmd.get_args(),
            [
                "..",
                "--",
                "-G",
                "Ninja",
                "-DBUILD_SHARED_LIBS=ON",
                "-DBUILD_STATIC_LIBS=OFF"
            ]
        );
        assert_eq!(cmd.get_cwd(), Some(Path::new("/b")));
    }

    #[test]
    fn test_configure_command_keeps_prefix_order() {
        let plan = plan_for("ios_armv8", HostOs::Macos);
        let build = module(&plan, Path::new(".."), Path::new("/b"));
        let cmd = QtModuleDriver::configure_command(&build);
        let args = cmd.get_args();

        assert_eq!(&args[..4], ["..", "--", "-G", "Xcode"]);
        assert!(args[4].starts_with("-DCMAKE_TOOLCHAIN_FILE="));
        assert_eq!(args[5], "-DPLATFORM=OS64");
        assert_eq!(args[6], "-DBUILD_SHARED_LIBS=OFF");
        let host_path = plan.environment_overrides.get("QT_HOST_PATH");
        assert_eq!(cmd.get_env("QT_HOST_PATH"), host_path.map(String::as_str));
    }

    #[test]
    fn test_compile_command() {
        let plan = plan_for("android_armv7", HostOs::Linux);
        let build = module(&plan, Path::new(".."), Path::new("/b"));
        let cmd = QtModuleDriver::compile_command(&build);
        assert_eq!(
            cmd.display_command(),
            "cmake --build . --target all --parallel 8"
        );
        assert!(cmd.get_env("QT_HOST_PATH").is_some());
    }

    #[test]
    fn test_compile_command_for_multi_config_generator() {
        let plan = plan_for("msvc2022", HostOs::Windows);
        let build = module(&plan, Path::new(".."), Path::new("/b"));
        let cmd = QtModuleDriver::compile_command(&build);
        assert!(cmd.display_command().ends_with("--config Release"));
    }

    #[test]
    fn test_install_command() {
        let plan = plan_for("linux", HostOs::Linux);
        let build = module(&plan, Path::new(".."), Path::new("/b"));
        assert_eq!(
            QtModuleDriver::install_command(&build).display_command(),
            "ninja install"
        );

        let plan = plan_for("ios", HostOs::Macos);
        let build = module(&plan, Path::new(".."), Path::new("/b"));
        assert_eq!(
            QtModuleDriver::install_command(&build).display_command(),
            "cmake --install . --config Release"
        );
    }

    #[test]
    fn test_mingw_wrapper_is_used_for_compile() {
        let host = HostFacts::new(HostOs::Linux, "/work/contribs");
        let target = Target::new(TargetOs::Windows, TargetArch::X86_64).unwrap();
        let plan = derive_plan(&target, &host).unwrap();
        let build = module(&plan, Path::new(".."), Path::new("/b"));
        assert!(QtModuleDriver::compile_command(&build)
            .display_command()
            .starts_with("x86_64-w64-mingw32-cmake --build"));
    }

    #[test]
    fn test_check_tools_reports_missing_configure_script() {
        let plan = plan_for("linux", HostOs::Linux);
        let err = QtModuleDriver::new().check_tools(&plan).unwrap_err();
        let err = err.downcast_ref::<ContribsError>().unwrap();
        assert!(matches!(
            err,
            ContribsError::Configuration(ConfigurationError::MissingTool { .. })
        ));
    }

    #[cfg(unix)]
    #[test]
    fn test_failing_step_reports_exit_code() {
        let tmp = tempfile::TempDir::new().unwrap();
        let mut plan = plan_for("linux", HostOs::Linux);
        plan.cmake_program = "false".to_string();
        let build = module(&plan, tmp.path(), tmp.path());

        let err = QtModuleDriver::new().compile(&build).unwrap_err();
        match err.downcast_ref::<ContribsError>() {
            Some(ContribsError::BuildTool { step, code, .. }) => {
                assert_eq!(*step, BuildStep::Compile);
                assert_eq!(*code, Some(1));
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }
}

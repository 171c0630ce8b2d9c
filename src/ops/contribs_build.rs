//! Implementation of the build pipeline.
//!
//! A run goes through three phases:
//!
//! 1. plan every target up front, so a configuration problem stops the run
//!    before anything is downloaded;
//! 2. download the auxiliary tools and module sources (skipped when the
//!    archive is already in `src/`);
//! 3. for each target in order, extract, configure, compile and install
//!    every applicable module.
//!
//! Everything runs sequentially and the first failure stops the run.

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use serde::Serialize;
use url::Url;

use crate::builder::driver::{BuildDriver, ModuleBuild};
use crate::builder::plan::{derive_plan, ToolchainPlan};
use crate::core::host::HostFacts;
use crate::core::software::{self, QtVersion, Software};
use crate::core::target::{Target, TargetOs};
use crate::sources::{Extractor, Fetcher};
use crate::util::context::ContribsContext;
use crate::util::errors::ConfigurationError;
use crate::util::fs::{ensure_dir, set_executable};
use crate::util::shell::{Shell, Status};

/// Options for a build run.
#[derive(Debug, Clone, Default)]
pub struct BuildOptions {
    /// Modules to build (empty = all)
    pub softwares: Vec<Software>,

    /// Number of parallel compile jobs (defaults to the CPU count)
    pub jobs: Option<usize>,
}

impl BuildOptions {
    /// The selected modules, in build order.
    pub fn selected_softwares(&self) -> Vec<Software> {
        if self.softwares.is_empty() {
            return Software::ALL.to_vec();
        }
        Software::ALL
            .into_iter()
            .filter(|s| self.softwares.contains(s))
            .collect()
    }
}

/// A target together with the toolchain plan that builds it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TargetPlan {
    pub name: String,
    pub target: Target,
    pub plan: ToolchainPlan,
}

/// Derive the toolchain plan of every target, stopping at the first one
/// that cannot be built from this host.
pub fn plan_targets(
    targets: &[Target],
    host: &HostFacts,
) -> Result<Vec<TargetPlan>, ConfigurationError> {
    targets
        .iter()
        .map(|target| {
            Ok(TargetPlan {
                name: target.dir_name(),
                target: *target,
                plan: derive_plan(target, host)?,
            })
        })
        .collect()
}

#[derive(Serialize)]
struct PlanTarget<'a> {
    #[serde(flatten)]
    plan: &'a TargetPlan,
    softwares: Vec<Software>,
}

#[derive(Serialize)]
struct PlanOutput<'a> {
    host: &'a str,
    host_arch: &'a str,
    qt_version: &'a QtVersion,
    jobs: usize,
    targets: Vec<PlanTarget<'a>>,
}

/// Render the resolved targets and their plans as pretty JSON.
pub fn plan_json(host: &HostFacts, plans: &[TargetPlan], opts: &BuildOptions) -> Result<String> {
    let softwares = opts.selected_softwares();
    let output = PlanOutput {
        host: host.os.as_str(),
        host_arch: &host.arch,
        qt_version: &host.qt_version,
        jobs: opts.jobs.unwrap_or(host.cpu_count),
        targets: plans
            .iter()
            .map(|plan| PlanTarget {
                plan,
                softwares: softwares
                    .iter()
                    .copied()
                    .filter(|s| s.applies_to(&plan.target))
                    .collect(),
            })
            .collect(),
    };
    serde_json::to_string_pretty(&output).context("failed to serialize build plan")
}

/// What a run did.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct BuildReport {
    /// Archives and tools downloaded during this run
    pub downloaded: Vec<String>,
    /// `(target dir name, module)` pairs that were built, in order
    pub built: Vec<(String, Software)>,
}

/// The sequential fetch-extract-build pipeline.
pub struct Pipeline<'a> {
    ctx: &'a ContribsContext,
    host: &'a HostFacts,
    shell: Arc<Shell>,
    fetcher: &'a dyn Fetcher,
    extractor: &'a dyn Extractor,
    driver: &'a dyn BuildDriver,
}

impl<'a> Pipeline<'a> {
    pub fn new(
        ctx: &'a ContribsContext,
        host: &'a HostFacts,
        shell: Arc<Shell>,
        fetcher: &'a dyn Fetcher,
        extractor: &'a dyn Extractor,
        driver: &'a dyn BuildDriver,
    ) -> Self {
        Pipeline {
            ctx,
            host,
            shell,
            fetcher,
            extractor,
            driver,
        }
    }

    /// Fetch everything the planned targets need, then build them in order.
    pub fn run(&self, plans: &[TargetPlan], opts: &BuildOptions) -> Result<BuildReport> {
        let mut report = BuildReport::default();
        let softwares = opts.selected_softwares();
        let jobs = opts.jobs.unwrap_or(self.host.cpu_count).max(1);

        if plans.is_empty() {
            self.shell.warn("no targets selected, nothing to build");
            return Ok(report);
        }

        self.ctx.ensure_layout()?;

        self.fetch_tools(plans, &mut report)?;
        self.fetch_sources(plans, &softwares, &mut report)?;

        for target_plan in plans {
            self.build_target(target_plan, &softwares, jobs, &mut report)?;
        }

        Ok(report)
    }

    /// Download `url` to `dest` unless `dest` already exists.
    fn fetch_cached(&self, url: &Url, dest: &Path, report: &mut BuildReport) -> Result<()> {
        let name = file_label(dest);
        if dest.exists() {
            tracing::debug!("Using cached {}", dest.display());
            return Ok(());
        }

        self.shell.status(Status::Fetching, &name);
        self.fetcher.fetch(url, dest)?;
        report.downloaded.push(name);
        Ok(())
    }

    fn fetch_tools(&self, plans: &[TargetPlan], report: &mut BuildReport) -> Result<()> {
        if has_target_os(plans, TargetOs::Android) {
            let openssl = software::android_openssl()?;
            let archive = self.ctx.src_dir().join(&openssl.file_name);
            self.fetch_cached(&openssl.url, &archive, report)?;

            let env_dir = self.ctx.env_dir();
            if env_dir.join(&openssl.dir_name).is_dir() {
                tracing::debug!("{} already extracted", openssl.dir_name);
            } else {
                self.shell.status(Status::Extracting, &openssl.file_name);
                self.extractor.extract(&archive, &env_dir)?;
            }
        }

        if has_target_os(plans, TargetOs::Linux) {
            let deploy_dir = self.ctx.deploy_dir();
            for tool in software::linuxdeploy()? {
                let dest = deploy_dir.join(&tool.file_name);
                self.fetch_cached(&tool.url, &dest, report)?;
                set_executable(&dest)?;
            }
        }

        Ok(())
    }

    fn fetch_sources(
        &self,
        plans: &[TargetPlan],
        softwares: &[Software],
        report: &mut BuildReport,
    ) -> Result<()> {
        for software in softwares {
            if !plans.iter().any(|p| software.applies_to(&p.target)) {
                tracing::debug!("{} is not needed by any selected target", software);
                continue;
            }

            let source = software.source(&self.host.qt_version)?;
            let dest = self.ctx.src_dir().join(&source.file_name);
            self.fetch_cached(&source.url, &dest, report)?;
        }
        Ok(())
    }

    fn build_target(
        &self,
        target_plan: &TargetPlan,
        softwares: &[Software],
        jobs: usize,
        report: &mut BuildReport,
    ) -> Result<()> {
        let target = &target_plan.target;
        let plan = &target_plan.plan;

        let build_dir = self.ctx.target_build_dir(target);
        let env_dir = self.ctx.target_env_dir(target);
        ensure_dir(&build_dir)?;
        ensure_dir(&env_dir)?;

        let modules: Vec<Software> = softwares
            .iter()
            .copied()
            .filter(|s| s.applies_to(target))
            .collect();
        if modules.is_empty() {
            self.shell
                .status(Status::Skipped, format!("{}: no selected module applies", target));
            return Ok(());
        }

        let span = self.shell.span(Status::Target, target);
        tracing::debug!("build_dir: {}", build_dir.display());
        tracing::debug!("env_dir: {}", env_dir.display());

        self.driver.check_tools(plan)?;

        for software in modules {
            let source = software.source(&self.host.qt_version)?;
            let module_dir = build_dir.join(&source.dir_name);

            if module_dir.is_dir() {
                tracing::debug!("{} already extracted", module_dir.display());
            } else {
                self.shell.status(Status::Extracting, &source.file_name);
                self.extractor
                    .extract(&self.ctx.src_dir().join(&source.file_name), &build_dir)?;
            }

            let module_build_dir = module_dir.join("build");
            ensure_dir(&module_build_dir)?;

            let build = ModuleBuild {
                plan,
                source_dir: &module_dir,
                build_dir: &module_build_dir,
                jobs,
            };
            let label = format!("{} for {}", software.pretty_name(), target_plan.name);

            self.shell.status(Status::Configuring, &label);
            self.driver.configure(&build)?;
            self.shell.status(Status::Compiling, &label);
            self.driver.compile(&build)?;
            self.shell.status(Status::Installing, &label);
            self.driver.install(&build)?;

            report.built.push((target_plan.name.clone(), software));
        }

        span.finish();
        Ok(())
    }
}

fn has_target_os(plans: &[TargetPlan], os: TargetOs) -> bool {
    plans.iter().any(|p| p.target.os == os)
}

fn file_label(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

//! contribs CLI - builds third-party Qt modules for every target platform

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

mod cli;

use cli::Cli;
use contribs::builder::QtModuleDriver;
use contribs::core::{HostFacts, HostOs, QtVersion, Software, VisualStudio};
use contribs::ops::{self, BuildOptions, Pipeline};
use contribs::resolver::resolve_targets;
use contribs::sources::{HttpFetcher, TarballExtractor};
use contribs::util::config::{global_config_path, load_config, project_config_path, Config};
use contribs::util::shell::{Shell, Status};
use contribs::util::{ContribsContext, ContribsError};

fn main() {
    if let Err(e) = run() {
        eprintln!("error: {:#}", e);
        let code = e
            .downcast_ref::<ContribsError>()
            .map(ContribsError::exit_code)
            .unwrap_or(1);
        std::process::exit(code);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("contribs=debug")
    } else if cli.quiet {
        EnvFilter::new("contribs=error")
    } else {
        EnvFilter::new("contribs=info")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .without_time()
        .with_writer(std::io::stderr)
        .init();

    let shell = Arc::new(Shell::from_flags(cli.quiet, cli.verbose, cli.color));

    // Preconditions come first, even for --clean
    let ctx = ContribsContext::from_cwd()?;
    ops::check_working_dir(ctx.root())?;
    let host_os = HostOs::current().ok_or_else(|| ContribsError::UnsupportedHost {
        os: std::env::consts::OS.to_string(),
    })?;
    ops::check_privileges(host_os)?;

    if cli.clean {
        return ops::clean(&ctx, &shell);
    }

    let config = load_config(
        global_config_path().as_deref(),
        &project_config_path(ctx.root()),
    );
    let host = host_facts(&cli, &config, host_os, &ctx)?;

    let target_names = if cli.targets.is_empty() {
        config.build.targets.clone()
    } else {
        cli.targets.clone()
    };
    let opts = BuildOptions {
        softwares: selected_softwares(&cli, &config)?,
        jobs: cli.jobs.or(config.build.jobs),
    };

    let targets = resolve_targets(&target_names, &host);
    let plans = ops::plan_targets(&targets, &host).map_err(ContribsError::from)?;

    if cli.plan {
        println!("{}", ops::plan_json(&host, &plans, &opts)?);
        return Ok(());
    }

    if cli.rebuild {
        ops::rebuild(&ctx, &shell)?;
    }

    shell.note(format!(
        "host {} ({}), Qt {}",
        host.os, host.arch, host.qt_version
    ));
    for plan in &plans {
        shell.note(format!("target {}", plan.target));
    }

    let fetcher = HttpFetcher::new(Arc::clone(&shell))?;
    let extractor = TarballExtractor::new();
    let driver = QtModuleDriver::new();
    let pipeline = Pipeline::new(
        &ctx,
        &host,
        Arc::clone(&shell),
        &fetcher,
        &extractor,
        &driver,
    );

    let report = pipeline.run(&plans, &opts)?;
    if !report.built.is_empty() {
        shell.status(
            Status::Finished,
            format!(
                "{} module build(s) across {} target(s)",
                report.built.len(),
                plans.len()
            ),
        );
    }

    Ok(())
}

/// Snapshot the host, layering flags and environment over the config files.
fn host_facts(
    cli: &Cli,
    config: &Config,
    os: HostOs,
    ctx: &ContribsContext,
) -> Result<HostFacts> {
    let qt_version = match cli.qt_version.as_ref().or(config.qt.version.as_ref()) {
        Some(v) => v.parse::<QtVersion>().map_err(ContribsError::from)?,
        None => QtVersion::default(),
    };

    let cpu_count = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1);

    let visual_studio =
        VisualStudio::from_version_signal(std::env::var("VisualStudioVersion").ok().as_deref());

    Ok(HostFacts::new(os, ctx.root())
        .with_cpu_count(cpu_count)
        .with_qt_version(qt_version)
        .with_qt_directory(pick(&cli.qt_directory, &config.qt.directory))
        .with_android_sdk(pick(&cli.android_sdk, &config.android.sdk))
        .with_android_ndk(pick(&cli.android_ndk, &config.android.ndk))
        .with_visual_studio(visual_studio))
}

fn pick(flag: &Option<PathBuf>, configured: &Option<PathBuf>) -> Option<PathBuf> {
    flag.clone().or_else(|| configured.clone())
}

fn selected_softwares(cli: &Cli, config: &Config) -> Result<Vec<Software>> {
    if !cli.softwares.is_empty() {
        return Ok(cli.softwares.clone());
    }
    config
        .build
        .softwares
        .iter()
        .map(|name| {
            name.parse::<Software>()
                .map_err(anyhow::Error::msg)
                .context("invalid `build.softwares` entry in config")
        })
        .collect()
}

//! CLI definitions using clap.

use std::path::PathBuf;

use clap::Parser;

use contribs::core::Software;
use contribs::util::shell::ColorChoice;

/// contribs - download and build the Qt modules an application depends on
///
/// Must be run from the `contribs/` directory. Downloads go to `src/`,
/// per-target builds to `build/<os>_<arch>/`, auxiliary tools to `env/` and
/// `deploy/`.
#[derive(Parser, Debug)]
#[command(name = "contribs")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Remove src/, build/ and env/, then exit
    #[arg(short, long)]
    pub clean: bool,

    /// Remove build/ before building
    #[arg(short, long)]
    pub rebuild: bool,

    /// Targets to build, comma separated (e.g. linux,android_armv8)
    #[arg(long, value_delimiter = ',', value_name = "TARGETS")]
    pub targets: Vec<String>,

    /// Modules to build, comma separated (qtmqtt, qtconnectivity)
    #[arg(long, value_delimiter = ',', value_name = "SOFTWARES")]
    pub softwares: Vec<Software>,

    /// Qt version the modules are built against [default: 6.6.3]
    #[arg(long, value_name = "VERSION")]
    pub qt_version: Option<String>,

    /// Root of the Qt installation
    #[arg(long, env = "QT_DIRECTORY", value_name = "DIR")]
    pub qt_directory: Option<PathBuf>,

    /// Android SDK root
    #[arg(long, env = "ANDROID_SDK_ROOT", value_name = "DIR")]
    pub android_sdk: Option<PathBuf>,

    /// Android NDK root; also enables the android targets
    #[arg(long, env = "ANDROID_NDK_ROOT", value_name = "DIR")]
    pub android_ndk: Option<PathBuf>,

    /// Number of parallel compile jobs
    #[arg(short, long)]
    pub jobs: Option<usize>,

    /// Print the resolved targets and toolchain plans as JSON (no build)
    #[arg(long)]
    pub plan: bool,

    /// Enable verbose output
    #[arg(short, long)]
    pub verbose: bool,

    /// Only print errors
    #[arg(short, long)]
    pub quiet: bool,

    /// Color output: auto, always, never
    #[arg(long, default_value = "auto", value_name = "WHEN")]
    pub color: ColorChoice,
}

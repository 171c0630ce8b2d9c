//! Centralized shell output and progress management.
//!
//! All user-facing output goes through [`Shell`]:
//! - right-aligned status words (`Fetching`, `Compiling`, ...)
//! - byte progress bars for downloads (via indicatif)
//! - timing spans for whole targets
//!
//! Diagnostics meant for debugging go through `tracing` instead.

use std::fmt::Display;
use std::io::{self, IsTerminal};
use std::sync::Arc;
use std::time::{Duration, Instant};

use indicatif::{ProgressBar, ProgressStyle};

/// Output verbosity level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Verbosity {
    /// --quiet: no status output, no progress
    Quiet,
    /// Default: status messages + progress bars
    #[default]
    Normal,
    /// --verbose: status messages, no progress bars
    Verbose,
}

/// Color output mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ColorChoice {
    /// Detect TTY and use colors if available.
    #[default]
    Auto,
    /// Always use ANSI colors.
    Always,
    /// Never use ANSI colors.
    Never,
}

impl std::str::FromStr for ColorChoice {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "auto" => Ok(ColorChoice::Auto),
            "always" => Ok(ColorChoice::Always),
            "never" => Ok(ColorChoice::Never),
            _ => Err(format!(
                "invalid color choice '{}'; expected 'auto', 'always', or 'never'",
                s
            )),
        }
    }
}

/// Status types for output messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    // Success statuses (green)
    Finished,
    Removed,

    // In-progress statuses (cyan)
    Fetching,
    Extracting,
    Configuring,
    Compiling,
    Installing,

    // Info statuses (blue)
    Info,
    Target,

    // Warning statuses (yellow)
    Skipped,
    Warning,
}

impl Status {
    fn as_str(&self) -> &'static str {
        match self {
            Status::Finished => "Finished",
            Status::Removed => "Removed",
            Status::Fetching => "Fetching",
            Status::Extracting => "Extracting",
            Status::Configuring => "Configuring",
            Status::Compiling => "Compiling",
            Status::Installing => "Installing",
            Status::Info => "Info",
            Status::Target => "Target",
            Status::Skipped => "Skipped",
            Status::Warning => "Warning",
        }
    }

    fn color_code(&self) -> &'static str {
        match self {
            Status::Finished | Status::Removed => "\x1b[1;32m",
            Status::Fetching
            | Status::Extracting
            | Status::Configuring
            | Status::Compiling
            | Status::Installing => "\x1b[1;36m",
            Status::Info | Status::Target => "\x1b[1;34m",
            Status::Skipped | Status::Warning => "\x1b[1;33m",
        }
    }
}

/// Width status words are right-aligned to.
const STATUS_WIDTH: usize = 12;

/// Central shell for all CLI output.
#[derive(Debug)]
pub struct Shell {
    verbosity: Verbosity,
    use_color: bool,
}

impl Shell {
    pub fn new(verbosity: Verbosity, color: ColorChoice) -> Self {
        let use_color = match color {
            ColorChoice::Auto => io::stderr().is_terminal(),
            ColorChoice::Always => true,
            ColorChoice::Never => false,
        };

        Shell {
            verbosity,
            use_color,
        }
    }

    /// Create a shell from CLI flags. Quiet wins over verbose.
    pub fn from_flags(quiet: bool, verbose: bool, color: ColorChoice) -> Self {
        let verbosity = if quiet {
            Verbosity::Quiet
        } else if verbose {
            Verbosity::Verbose
        } else {
            Verbosity::Normal
        };
        Shell::new(verbosity, color)
    }

    pub fn is_quiet(&self) -> bool {
        self.verbosity == Verbosity::Quiet
    }

    pub fn is_verbose(&self) -> bool {
        self.verbosity == Verbosity::Verbose
    }

    /// Print a status message to stderr.
    ///
    /// Format: `{status:>12} {message}`. Quiet mode prints nothing; errors
    /// are reported by the binary itself.
    pub fn status(&self, status: Status, msg: impl Display) {
        if self.is_quiet() {
            return;
        }
        eprintln!("{} {}", self.format_status(status), msg);
    }

    pub fn note(&self, msg: impl Display) {
        self.status(Status::Info, msg);
    }

    pub fn warn(&self, msg: impl Display) {
        self.status(Status::Warning, msg);
    }

    fn format_status(&self, status: Status) -> String {
        let text = status.as_str();
        if self.use_color {
            format!(
                "{}{:>width$}\x1b[0m",
                status.color_code(),
                text,
                width = STATUS_WIDTH
            )
        } else {
            format!("{:>width$}", text, width = STATUS_WIDTH)
        }
    }

    /// Start a timed span; its end message reports the elapsed time.
    pub fn span(self: &Arc<Self>, status: Status, msg: impl Display) -> Span {
        Span::new(Arc::clone(self), status, msg.to_string())
    }

    /// Create a byte-based progress bar for downloads.
    ///
    /// `total_bytes` is `None` when the server sends no content length.
    pub fn bytes_progress(&self, msg: impl Display, total_bytes: Option<u64>) -> Progress {
        Progress::new(self, msg.to_string(), total_bytes)
    }
}

/// A timed operation. Prints its start immediately and its duration when
/// finished; a span dropped without finishing prints nothing more.
pub struct Span {
    shell: Arc<Shell>,
    message: String,
    start: Instant,
}

impl Span {
    fn new(shell: Arc<Shell>, status: Status, message: String) -> Self {
        shell.status(status, &message);
        Span {
            shell,
            message,
            start: Instant::now(),
        }
    }

    /// Mark the span as finished.
    pub fn finish(self) {
        let elapsed = self.start.elapsed();
        self.shell.status(
            Status::Finished,
            format!("{} in {}", self.message, format_duration(elapsed)),
        );
    }
}

/// Progress bar wrapper that respects the shell verbosity.
pub struct Progress {
    pb: Option<ProgressBar>,
    current: u64,
}

impl Progress {
    fn new(shell: &Shell, message: String, total: Option<u64>) -> Self {
        let pb = if shell.is_quiet() || shell.is_verbose() {
            None
        } else {
            let pb = match total {
                Some(total) => {
                    let pb = ProgressBar::new(total);
                    if let Ok(style) = ProgressStyle::default_bar()
                        .template("{spinner:.green} {msg} [{bar:40.cyan/blue}] {bytes}/{total_bytes}")
                    {
                        pb.set_style(style.progress_chars("#>-"));
                    }
                    pb
                }
                None => {
                    let pb = ProgressBar::new_spinner();
                    if let Ok(style) =
                        ProgressStyle::default_spinner().template("{spinner:.green} {msg} {bytes}")
                    {
                        pb.set_style(style);
                    }
                    pb
                }
            };
            pb.set_message(message);
            Some(pb)
        };

        Progress { pb, current: 0 }
    }

    /// Advance by `delta` bytes.
    pub fn inc(&mut self, delta: u64) {
        self.current += delta;
        if let Some(pb) = &self.pb {
            pb.inc(delta);
        }
    }

    /// Finish and remove the bar from the terminal.
    pub fn finish(&self) {
        if let Some(pb) = &self.pb {
            pb.finish_and_clear();
        }
    }

    pub fn position(&self) -> u64 {
        self.current
    }
}

/// Format a duration in a human-readable way.
fn format_duration(duration: Duration) -> String {
    let secs = duration.as_secs_f64();
    if secs < 60.0 {
        format!("{:.2}s", secs)
    } else {
        format!("{:.1}m", secs / 60.0)
    }
}

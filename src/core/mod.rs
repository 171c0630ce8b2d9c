//! Core data structures.
//!
//! - Build targets and the target catalog
//! - Host facts captured at startup
//! - The software modules and their source archives

pub mod host;
pub mod software;
pub mod target;

pub use host::{HostFacts, HostOs};
pub use software::{QtVersion, Software, SourceArchive};
pub use target::{Target, TargetArch, TargetOs, VisualStudio};

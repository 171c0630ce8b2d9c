//! contribs - builds the third-party Qt modules an application depends on
//!
//! This crate provides the library side of the `contribs` tool: the target
//! catalog and resolution, toolchain planning per (host, target) pair, the
//! source fetching and extraction layer, and the sequential build pipeline.

pub mod builder;
pub mod core;
pub mod ops;
pub mod resolver;
pub mod sources;
pub mod util;

pub use core::{HostFacts, HostOs, QtVersion, Software, Target};
pub use resolver::resolve_targets;
pub use util::errors::{ConfigurationError, ContribsError};

//! High-level operations.
//!
//! This module contains the implementation of the contribs commands.

pub mod contribs_build;
pub mod contribs_clean;
pub mod preflight;

pub use contribs_build::{plan_json, plan_targets, BuildOptions, BuildReport, Pipeline, TargetPlan};
pub use contribs_clean::{clean, rebuild};
pub use preflight::{check_privileges, check_working_dir};

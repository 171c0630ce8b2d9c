//! Module builds.
//!
//! [`plan`] turns a target and the host facts into a toolchain plan;
//! [`driver`] runs the configure, compile and install steps from it.

pub mod driver;
pub mod plan;

pub use driver::{BuildDriver, ModuleBuild, QtModuleDriver};
pub use plan::{derive_plan, ToolchainPlan};

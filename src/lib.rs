//! monokube - build, render and roll out the packages of a monorepo.
//!
//! This crate provides the core library functionality for monokube,
//! including package discovery, manifest rendering and the staged release
//! pipeline.

pub mod core;
pub mod ops;
pub mod tools;
pub mod util;

/// Test utilities and fakes for monokube unit tests.
///
/// This module is only available when compiling with `--cfg test`. It
/// provides recording fakes for the external tools and fixture builders
/// for monorepo layouts.
#[cfg(test)]
pub mod test_support;

pub use core::{Manifest, Package, PackageConfig, Stage};
pub use ops::{deploy, RunReport};
pub use tools::Toolbox;
pub use util::config::RunConfig;

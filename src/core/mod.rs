//! Core data structures for monokube.
//!
//! This module contains the foundational types used throughout monokube:
//! - Pipeline stages
//! - Package configuration and the packages built from it
//! - Rendered manifests
//! - Package discovery

pub mod manifest;
pub mod package;
pub mod package_config;
pub mod stage;
pub mod workspace;

pub use manifest::{Manifest, ResourceRef};
pub use package::{Environment, Package};
pub use package_config::PackageConfig;
pub use stage::Stage;
pub use workspace::discover;

//! High-level operations.
//!
//! A run flows through these in order: package paths are assembled into
//! [`Package`](crate::core::Package)s (with their manifests rendered), then
//! the [`Pipeline`] drives them through the selected stages.

pub mod assemble;
pub mod deploy;
pub mod pipeline;
pub mod render;

pub use assemble::Assembler;
pub use deploy::deploy;
pub use pipeline::{Pipeline, RunReport, StageHalt, StageOutcome, StageReport};
pub use render::{render_manifests, Rendered, SkippedTemplate};

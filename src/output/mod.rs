//! Output sinks for a mirroring run
//!
//! This module handles:
//! - Materializing pages and resources into the mirrored tree
//! - The discovered-URL manifest
//! - The single-document markdown export
//! - Run statistics and the end-of-run summary

pub mod manifest;
pub mod markdown;
pub mod mirror;
pub mod stats;

pub use manifest::ManifestWriter;
pub use markdown::{render_markdown, ImageStore, MarkdownDocument};
pub use mirror::MirrorWriter;
pub use stats::RunStats;

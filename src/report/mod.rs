//! Report renderers for scan results.
//!
//! - [`markdown`]: the pull-request comment (certification banner, risky table,
//!   collapsible per-ecosystem sections, legend, timestamp).
//! - [`terminal`]: colored, tabular output with summary box; respects `--verbose` / `--quiet`.
//!
//! JSON output is the serde serialization of [`crate::models::ScanReport`].

pub mod markdown;
pub mod terminal;

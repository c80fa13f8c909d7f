//! License identifier normalization and risk classification.
//!
//! - [`spdx`]: the built-in Safe / HighRisk / Risky identifier sets, alias
//!   normalization and compound-expression splitting.
//! - [`classifier`]: maps identifiers to a [`RiskTier`](crate::models::RiskTier)
//!   and renders the `"{license} {glyph}"` display string.

pub mod classifier;
pub mod spdx;

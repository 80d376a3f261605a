//! Error types for textflow
//!
//! The layout core itself never fails: malformed markup degrades to a best
//! effort layout, unknown escape codes are ignored, and characters without a
//! glyph fall back to a replacement glyph. Errors therefore only surface at
//! the collaborator seams, chiefly font lookup.
//!
//! All errors use the `thiserror` crate for minimal boilerplate and proper
//! error trait implementations.

use thiserror::Error;

/// Result type alias for textflow operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Top-level error type for textflow.
#[derive(Error, Debug)]
pub enum Error {
  /// Font catalog error
  #[error("Font error: {0}")]
  Font(#[from] FontError),
}

/// Errors raised by the font-metrics collaborator.
///
/// During layout a missing font is not propagated as an error; the affected
/// leaf is simply left without glyphs. This type exists for callers that want
/// to validate a style name up front.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FontError {
  /// No font is registered under the requested style name
  #[error("Unknown text style '{style}'")]
  UnknownStyle { style: String },
}

//! Error types for the badgepress library.
//!
//! Two distinct error types reflect two distinct failure modes:
//!
//! * [`BadgePressError`]: **Fatal**: the run cannot produce a document at
//!   all (spreadsheet missing or undecodable, font unusable, a badge image
//!   could not be embedded). Returned as `Err(BadgePressError)` from the
//!   top-level `generate*` functions.
//!
//! * [`BadgeError`]: **Non-fatal**: a single badge could not be written to
//!   disk. Stored inside [`crate::output::BadgeResult`]; the run continues
//!   and the document simply holds fewer badges than there were records.

use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors returned by the badgepress library.
#[derive(Debug, Error)]
pub enum BadgePressError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// Spreadsheet was not found at the given path.
    #[error("Spreadsheet not found: '{path}'\nCheck the path exists and is readable.")]
    SpreadsheetNotFound { path: PathBuf },

    /// The file exists but could not be opened or decoded as a workbook.
    #[error("Could not read spreadsheet '{path}': {detail}")]
    SpreadsheetUnreadable { path: PathBuf, detail: String },

    // ── Rendering errors ──────────────────────────────────────────────────
    /// A font file could not be read or is not a usable TrueType/OpenType font.
    #[error("Failed to load font '{path}': {detail}\nPass --font / --bold-font to choose another file.")]
    FontLoadFailed { path: PathBuf, detail: String },

    // ── Output errors ─────────────────────────────────────────────────────
    /// Could not create (or clean) an output directory.
    #[error("Failed to prepare output directory '{path}': {source}")]
    OutputDirFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A badge image could not be loaded or embedded into the document.
    #[error("Failed to embed image '{path}' into the document: {detail}")]
    ImageEmbedFailed { path: PathBuf, detail: String },

    /// The document could not be serialised or written.
    #[error("Failed to write document '{path}': {detail}")]
    DocumentWriteFailed { path: PathBuf, detail: String },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed or geometry cannot hold a single badge.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// A non-fatal error for a single badge.
#[derive(Debug, Clone, Error, serde::Serialize, serde::Deserialize)]
pub enum BadgeError {
    /// The rendered badge could not be encoded or written to disk.
    #[error("Badge {index}: failed to write '{path}': {detail}")]
    WriteFailed {
        index: usize,
        path: PathBuf,
        detail: String,
    },
}

impl BadgeError {
    /// 1-based index of the badge this error belongs to.
    pub fn index(&self) -> usize {
        match self {
            BadgeError::WriteFailed { index, .. } => *index,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_display_names_path() {
        let e = BadgePressError::SpreadsheetNotFound {
            path: PathBuf::from("attendees.xlsx"),
        };
        assert!(e.to_string().contains("attendees.xlsx"));
    }

    #[test]
    fn invalid_config_display() {
        let e = BadgePressError::InvalidConfig("badge does not fit".into());
        assert_eq!(e.to_string(), "Invalid configuration: badge does not fit");
    }

    #[test]
    fn badge_error_display_and_index() {
        let e = BadgeError::WriteFailed {
            index: 7,
            path: PathBuf::from("/out/images/image007.png"),
            detail: "disk full".into(),
        };
        let msg = e.to_string();
        assert!(msg.contains("Badge 7"), "got: {msg}");
        assert!(msg.contains("disk full"), "got: {msg}");
        assert_eq!(e.index(), 7);
    }

    #[test]
    fn output_dir_error_keeps_source() {
        use std::error::Error as _;
        let e = BadgePressError::OutputDirFailed {
            path: PathBuf::from("/read-only"),
            source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        };
        assert!(e.source().is_some());
    }
}

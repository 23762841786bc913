//! Error types for docstitch.
//!
//! Library crates use [`DocstitchError`] via `thiserror`.
//! The CLI wraps this with `color-eyre` for rich diagnostics.

use std::path::PathBuf;

use crate::types::MismatchReport;

/// Top-level error type for all docstitch operations.
#[derive(Debug, thiserror::Error)]
pub enum DocstitchError {
    /// Configuration loading or validation error.
    #[error("config error: {message}")]
    Config { message: String },

    /// Network/HTTP error talking to the extraction provider.
    #[error("network error: {0}")]
    Network(String),

    /// The provider could not process a page. Fatal for the whole batch;
    /// carries the upstream message and nothing else.
    #[error("extraction failed: {message}")]
    Extraction { message: String },

    /// Pages disagreed on identifier fields beyond the profile threshold.
    /// Client-fault: the report tells the caller which upload to fix.
    #[error("pages do not belong to the same document: {0}")]
    Mismatch(MismatchReport),

    /// A page had an extension outside the accepted set. Rejected before
    /// any provider call.
    #[error("unsupported file type '{extension}' for '{filename}'")]
    UnsupportedFileType { filename: String, extension: String },

    /// No pages were supplied.
    #[error("no pages supplied")]
    EmptyBatch,

    /// Filesystem I/O error.
    #[error("I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Convenience alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, DocstitchError>;

impl DocstitchError {
    /// Create a config error from any displayable message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    /// Create an extraction error carrying only the upstream message.
    pub fn extraction(msg: impl Into<String>) -> Self {
        Self::Extraction {
            message: msg.into(),
        }
    }

    /// Create an unsupported-file-type error from a filename and extension.
    pub fn unsupported_file_type(filename: impl Into<String>, extension: impl Into<String>) -> Self {
        Self::UnsupportedFileType {
            filename: filename.into(),
            extension: extension.into(),
        }
    }

    /// Wrap a `std::io::Error` with a path for context.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// True for errors caused by the caller's input rather than by us or
    /// the provider. These must carry structured diagnostic detail.
    pub fn is_client_fault(&self) -> bool {
        matches!(
            self,
            Self::Mismatch(_) | Self::UnsupportedFileType { .. } | Self::EmptyBatch
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_formatting() {
        let err = DocstitchError::config("missing provider endpoint");
        assert_eq!(err.to_string(), "config error: missing provider endpoint");

        let err = DocstitchError::unsupported_file_type("notes.docx", "docx");
        assert_eq!(
            err.to_string(),
            "unsupported file type 'docx' for 'notes.docx'"
        );
    }

    #[test]
    fn extraction_error_carries_upstream_message_only() {
        let err = DocstitchError::extraction("model 'final' not found");
        assert_eq!(err.to_string(), "extraction failed: model 'final' not found");
    }

    #[test]
    fn client_fault_classification() {
        assert!(DocstitchError::EmptyBatch.is_client_fault());
        assert!(DocstitchError::unsupported_file_type("a.exe", "exe").is_client_fault());
        assert!(!DocstitchError::extraction("boom").is_client_fault());
        assert!(!DocstitchError::Network("timeout".into()).is_client_fault());
    }
}

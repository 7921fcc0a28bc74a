//! Error types for the PDF batch library

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the PDF batch library
#[derive(Error, Debug)]
pub enum Error {
    /// PDF processing error
    #[error("PDF error: {0}")]
    Pdf(#[from] lopdf::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// File not found
    #[error("File not found: {}", .0.display())]
    FileNotFound(PathBuf),

    /// Invalid PDF (no pages)
    #[error("PDF has no pages: {}", .0.display())]
    EmptyPdf(PathBuf),

    /// Page selection could not be parsed
    #[error("Invalid page selection: {0}")]
    InvalidPageSelection(String),

    /// Text edit could not be parsed
    #[error("Invalid text edit: {0}")]
    InvalidTextEdit(String),

    /// Encrypting the output failed
    #[error("Encryption error: {0}")]
    Encryption(String),

    /// Handing the output to the share target failed
    #[error("Share failed: {0}")]
    Share(String),

    /// General error
    #[error("{0}")]
    General(String),
}

/// Failures surfaced to the user through the session's error slot.
///
/// The `Display` text is the message shown to the user; the underlying
/// cause is only logged.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserError {
    #[error("Error selecting file")]
    PickerFailed,

    #[error("Error selecting directory")]
    DirectoryPickFailed,

    #[error("Storage permission denied")]
    PermissionDenied,

    #[error("Error processing PDF")]
    ProcessingFailed,
}

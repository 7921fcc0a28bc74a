//! PDF Batch Library
//!
//! A cross-platform library for processing a batch of PDFs in one pass.
//! This library provides functionality to:
//! - Merge multiple PDF files, optionally keeping only selected pages
//! - Draw text annotations on individual output pages
//! - Stamp a diagonal, semi-transparent watermark on every page
//! - Compress and password-protect the result
//! - Write the result to a timestamped file and hand it to a share target
//!
//! # Example
//!
//! ```no_run
//! use pdf_batch::platform::{AlwaysGranted, DocumentPicker, LocalFiles, NoShare, PathPicker};
//! use pdf_batch::session::{Collaborators, Session};
//! use std::path::PathBuf;
//!
//! let mut session = Session::new("out");
//! let picker = PathPicker::new(vec![
//!     PathBuf::from("1. intro.pdf"),
//!     PathBuf::from("2. advanced.pdf"),
//! ]);
//! session.add_documents(picker.pick_documents());
//! session.set_watermark("DRAFT");
//!
//! let with = Collaborators {
//!     permissions: &AlwaysGranted,
//!     files: &LocalFiles,
//!     share: &NoShare,
//! };
//! let output = session.process(&with).expect("processing failed");
//! println!("wrote {}", output.display());
//! ```

pub mod config;
pub mod error;
pub mod layout;
pub mod model;
pub mod naming;
pub mod pdf;
pub mod pipeline;
pub mod platform;
pub mod session;

// Re-export commonly used items
pub use error::{Error, Result, UserError};
pub use model::{OutputOptions, PageSelection, SourceDocument, TextEdit, WatermarkSpec};
pub use session::{Collaborators, Session};

//! The working state a user builds up before processing
//!
//! A [`Session`] owns the selected documents, page selection, text edits,
//! watermark, output options and output location. Failures are never
//! returned from its operations; they land in a single user-facing error
//! slot (see [`Session::last_error`]) and the underlying cause is logged.

use std::path::{Path, PathBuf};

use crate::config::DEFAULT_WATERMARK_OPACITY;
use crate::error::UserError;
use crate::model::{OutputOptions, PageSelection, PickedFile, SourceDocument, TextEdit, WatermarkSpec};
use crate::pipeline::{self, RunInput};
use crate::platform::{FileStore, Outcome, PermissionGate, ShareTarget};

/// The external services a run talks to
pub struct Collaborators<'a> {
    pub permissions: &'a dyn PermissionGate,
    pub files: &'a dyn FileStore,
    pub share: &'a dyn ShareTarget,
}

/// Single-writer working state
#[derive(Debug, Clone)]
pub struct Session {
    sources: Vec<SourceDocument>,
    selection: PageSelection,
    edits: Vec<TextEdit>,
    watermark: Option<WatermarkSpec>,
    options: OutputOptions,
    output_dir: PathBuf,
    last_error: Option<UserError>,
}

impl Session {
    /// Empty session writing to `output_dir` until another location is picked
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            sources: Vec::new(),
            selection: PageSelection::all(),
            edits: Vec::new(),
            watermark: None,
            options: OutputOptions::default(),
            output_dir: output_dir.into(),
            last_error: None,
        }
    }

    pub fn sources(&self) -> &[SourceDocument] {
        &self.sources
    }

    pub fn page_selection(&self) -> &PageSelection {
        &self.selection
    }

    pub fn text_edits(&self) -> &[TextEdit] {
        &self.edits
    }

    pub fn watermark(&self) -> Option<&WatermarkSpec> {
        self.watermark.as_ref()
    }

    pub fn output_options(&self) -> &OutputOptions {
        &self.options
    }

    pub fn output_location(&self) -> &Path {
        &self.output_dir
    }

    /// The message to show the user, if the last operation failed
    pub fn last_error(&self) -> Option<UserError> {
        self.last_error
    }

    // --- Input collector ---

    /// Append picked files after the ones already selected
    pub fn add_documents(&mut self, outcome: Outcome<Vec<PickedFile>>) {
        match outcome {
            Outcome::Ok(files) => {
                self.sources.extend(files.into_iter().map(SourceDocument::from));
                self.last_error = None;
            }
            Outcome::Cancelled => log::debug!("document pick cancelled"),
            Outcome::Failed(reason) => {
                log::error!("document pick failed: {}", reason);
                self.last_error = Some(UserError::PickerFailed);
            }
        }
    }

    /// Remove the document at `index`; out-of-range indices are ignored
    pub fn remove_document(&mut self, index: usize) {
        if index < self.sources.len() {
            self.sources.remove(index);
        }
    }

    /// Replace the output location with a picked directory
    pub fn set_output_location(&mut self, outcome: Outcome<PathBuf>) {
        match outcome {
            Outcome::Ok(dir) => self.output_dir = dir,
            Outcome::Cancelled => log::debug!("directory pick cancelled"),
            Outcome::Failed(reason) => {
                log::error!("directory pick failed: {}", reason);
                self.last_error = Some(UserError::DirectoryPickFailed);
            }
        }
    }

    pub fn set_page_selection(&mut self, selection: PageSelection) {
        self.selection = selection;
    }

    pub fn set_output_options(&mut self, options: OutputOptions) {
        self.options = options;
    }

    // --- Edit accumulator ---

    /// Append an empty edit at the default position on the first page
    ///
    /// Returns the index of the new edit.
    pub fn add_text_edit(&mut self) -> usize {
        self.edits.push(TextEdit::default());
        self.edits.len() - 1
    }

    /// Append a fully specified edit
    pub fn push_text_edit(&mut self, edit: TextEdit) -> usize {
        self.edits.push(edit);
        self.edits.len() - 1
    }

    /// Replace the text of the edit at `index`
    pub fn update_text(&mut self, index: usize, text: impl Into<String>) {
        if let Some(edit) = self.edits.get_mut(index) {
            edit.text = text.into();
        }
    }

    /// Point the edit at `index` to another output page
    pub fn set_text_edit_page(&mut self, index: usize, page_index: usize) {
        if let Some(edit) = self.edits.get_mut(index) {
            edit.page_index = page_index;
        }
    }

    /// Move the edit at `index`
    pub fn move_text_edit(&mut self, index: usize, x: f32, y: f32) {
        if let Some(edit) = self.edits.get_mut(index) {
            edit.x = x;
            edit.y = y;
        }
    }

    pub fn delete_text_edit(&mut self, index: usize) {
        if index < self.edits.len() {
            self.edits.remove(index);
        }
    }

    /// Set the watermark at the default opacity; empty text clears it
    pub fn set_watermark(&mut self, text: impl Into<String>) {
        self.set_watermark_with_opacity(text, DEFAULT_WATERMARK_OPACITY);
    }

    /// Set the watermark; empty text clears it and opacity is clamped to 0..=1
    pub fn set_watermark_with_opacity(&mut self, text: impl Into<String>, opacity: f32) {
        let text = text.into();
        if text.is_empty() {
            self.watermark = None;
            return;
        }

        let clamped = if opacity.is_nan() {
            DEFAULT_WATERMARK_OPACITY
        } else {
            opacity.clamp(0.0, 1.0)
        };
        if clamped != opacity {
            log::warn!("watermark opacity {} adjusted to {}", opacity, clamped);
        }

        self.watermark = Some(WatermarkSpec {
            text,
            opacity: clamped,
        });
    }

    // --- Orchestration ---

    /// Copy of the state a run works from
    pub fn snapshot(&self) -> RunInput {
        RunInput {
            sources: self.sources.clone(),
            selection: self.selection.clone(),
            edits: self.edits.clone(),
            watermark: self.watermark.clone(),
            options: self.options.clone(),
            output_dir: self.output_dir.clone(),
        }
    }

    /// Process the selected documents
    ///
    /// With no documents selected this does nothing. Otherwise storage access
    /// is requested first; on success the output path is returned and the
    /// documents, edits and page selection are cleared. On failure the state
    /// is left as it was and the error slot is set. Runs are exclusive
    /// because the session is borrowed mutably for the whole run.
    pub fn process(&mut self, with: &Collaborators<'_>) -> Option<PathBuf> {
        if self.sources.is_empty() {
            return None;
        }

        if !with.permissions.request_storage_access() {
            log::warn!("storage permission denied");
            self.last_error = Some(UserError::PermissionDenied);
            return None;
        }

        let input = self.snapshot();
        match pipeline::run(&input, with.files, with.share) {
            Ok(path) => {
                self.sources.clear();
                self.edits.clear();
                self.selection.clear();
                self.last_error = None;
                Some(path)
            }
            Err(e) => {
                log::error!("processing failed: {}", e);
                self.last_error = Some(UserError::ProcessingFailed);
                None
            }
        }
    }
}

//! The processing run: load, merge, annotate, watermark, serialize, write, share
//!
//! A run works on a [`RunInput`], an owned copy of the session state taken
//! when the run starts. Stages execute strictly in order and the first
//! failure aborts the rest.

use std::path::{Path, PathBuf};

use crate::config::{PDF_MIME_TYPE, SHARE_TITLE};
use crate::error::Result;
use crate::model::{OutputOptions, PageSelection, SourceDocument, TextEdit, WatermarkSpec};
use crate::naming::output_path;
use crate::pdf::{load_document, serialize, Assembler, Overlay};
use crate::platform::{FileStore, ShareRequest, ShareTarget};

/// Everything one run needs, detached from the session that produced it
#[derive(Debug, Clone, PartialEq)]
pub struct RunInput {
    pub sources: Vec<SourceDocument>,
    pub selection: PageSelection,
    pub edits: Vec<TextEdit>,
    pub watermark: Option<WatermarkSpec>,
    pub options: OutputOptions,
    pub output_dir: PathBuf,
}

/// Build the output document and return its serialized bytes
///
/// This covers every stage that does not touch the destination, so it can
/// be used on its own to process documents in memory.
pub fn build(input: &RunInput, files: &dyn FileStore) -> Result<Vec<u8>> {
    let mut assembler = Assembler::new();

    for source in &input.sources {
        let bytes = files.read_bytes(&source.handle)?;
        let doc = load_document(&bytes, None)?;
        let copied = assembler.append(doc, &input.selection)?;
        log::info!("{}: copied {} pages", source.display_name, copied);
    }

    let mut doc = assembler.finish()?;

    {
        let mut overlay = Overlay::new(&mut doc);
        let drawn = overlay.apply_text_edits(&input.edits)?;
        if drawn < input.edits.len() {
            log::debug!(
                "{} of {} text edits addressed missing pages",
                input.edits.len() - drawn,
                input.edits.len()
            );
        }
        if let Some(watermark) = &input.watermark {
            overlay.apply_watermark(watermark)?;
        }
    }

    serialize(doc, &input.options)
}

/// Execute a full run and return where the output was written
pub fn run(input: &RunInput, files: &dyn FileStore, share: &dyn ShareTarget) -> Result<PathBuf> {
    log::info!("processing {} source documents", input.sources.len());

    let bytes = build(input, files)?;

    let destination = output_path(&input.output_dir);
    files.write_bytes(&destination, &bytes)?;
    log::info!("wrote {} bytes to {}", bytes.len(), destination.display());

    share.share(&share_request(&destination))?;

    Ok(destination)
}

fn share_request(destination: &Path) -> ShareRequest {
    ShareRequest {
        url: destination.to_path_buf(),
        mime_type: PDF_MIME_TYPE.to_string(),
        title: SHARE_TITLE.to_string(),
    }
}

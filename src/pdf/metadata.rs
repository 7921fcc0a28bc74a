//! Loading PDFs and reading their metadata

use std::path::Path;

use lopdf::{Document, Object};

use crate::error::{Error, Result};

/// Count pages by reading the Count field from the Pages dictionary
fn count_pages_from_catalog(doc: &Document) -> Result<usize> {
    let catalog = doc
        .catalog()
        .map_err(|_| Error::General("No catalog in document".to_string()))?;

    let pages_id = catalog
        .get(b"Pages")
        .and_then(Object::as_reference)
        .map_err(|_| Error::General("No Pages reference in catalog".to_string()))?;

    let pages_dict = doc.get_dictionary(pages_id)?;

    match pages_dict.get(b"Count") {
        Ok(Object::Integer(n)) if *n >= 0 => Ok(*n as usize),
        _ => Err(Error::General("Count is not a valid integer".to_string())),
    }
}

/// PDF metadata
#[derive(Debug, Clone)]
pub struct PdfMetadata {
    /// Number of pages in the PDF
    pub page_count: usize,
    /// Document title (if present)
    pub title: Option<String>,
    /// Document author (if present)
    pub author: Option<String>,
    /// Whether the file is password protected
    pub encrypted: bool,
}

/// Parse PDF bytes, decrypting with `password` when one is given
///
/// A file that is still encrypted after loading must accept `password`,
/// otherwise this fails with [`Error::Encryption`]. Without a password an
/// encrypted file is returned as lopdf loaded it.
pub fn load_document(bytes: &[u8], password: Option<&str>) -> Result<Document> {
    let mut doc = Document::load_mem(bytes)?;

    if let Some(password) = password {
        if doc.is_encrypted() {
            doc.authenticate_password(password)
                .map_err(|_| Error::Encryption("incorrect password".to_string()))?;
            doc.decrypt(password)
                .map_err(|e| Error::Encryption(e.to_string()))?;
        }
    }

    Ok(doc)
}

/// Number of pages in a loaded document
pub fn page_count(doc: &Document) -> usize {
    doc.get_pages().len()
}

/// Extract metadata from a PDF file
pub fn extract_metadata(path: &Path, password: Option<&str>) -> Result<PdfMetadata> {
    if !path.exists() {
        return Err(Error::FileNotFound(path.to_path_buf()));
    }

    let bytes = std::fs::read(path)?;
    let encrypted = contains_encrypt_marker(&bytes);
    let doc = load_document(&bytes, password)?;

    // Prefer the catalog's Count; fall back to walking the tree
    let page_count = count_pages_from_catalog(&doc).unwrap_or_else(|_| page_count(&doc));

    // lopdf cannot always recover the page tree of a protected file
    if page_count == 0 && !encrypted {
        return Err(Error::EmptyPdf(path.to_path_buf()));
    }

    Ok(PdfMetadata {
        page_count,
        title: info_string(&doc, b"Title"),
        author: info_string(&doc, b"Author"),
        encrypted,
    })
}

/// Count the number of pages in a PDF file
pub fn count_pages(path: &Path) -> Result<usize> {
    extract_metadata(path, None).map(|meta| meta.page_count)
}

fn info_string(doc: &Document, key: &[u8]) -> Option<String> {
    let info_id = doc.trailer.get(b"Info").and_then(Object::as_reference).ok()?;
    let info = doc.get_dictionary(info_id).ok()?;
    let bytes = info.get(key).and_then(Object::as_str).ok()?;
    String::from_utf8(bytes.to_vec()).ok()
}

fn contains_encrypt_marker(bytes: &[u8]) -> bool {
    bytes.windows(b"/Encrypt".len()).any(|w| w == b"/Encrypt")
}

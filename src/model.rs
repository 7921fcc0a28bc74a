//! Data carried through a processing run

use std::collections::BTreeSet;
use std::path::PathBuf;

use crate::config::{DEFAULT_DOCUMENT_NAME, DEFAULT_TEXT_X, DEFAULT_TEXT_Y, MAX_PAGE_NUMBER};
use crate::error::{Error, Result};
use crate::naming::format_file_size;

/// A file as reported by a document picker
#[derive(Debug, Clone, PartialEq)]
pub struct PickedFile {
    /// Location of the file
    pub uri: PathBuf,
    /// Name reported by the picker, if any
    pub name: Option<String>,
    /// Size in bytes reported by the picker, if any
    pub size: Option<u64>,
}

/// A user-selected input PDF
#[derive(Debug, Clone, PartialEq)]
pub struct SourceDocument {
    /// Where to read the document from
    pub handle: PathBuf,
    /// Name shown to the user
    pub display_name: String,
    /// Size in bytes, when known
    pub size_bytes: Option<u64>,
}

impl SourceDocument {
    /// Human-readable size, e.g. `"12.5 KB"`
    pub fn size_label(&self) -> Option<String> {
        self.size_bytes.map(format_file_size)
    }
}

impl From<PickedFile> for SourceDocument {
    fn from(file: PickedFile) -> Self {
        Self {
            handle: file.uri,
            display_name: file
                .name
                .filter(|name| !name.is_empty())
                .unwrap_or_else(|| DEFAULT_DOCUMENT_NAME.to_string()),
            size_bytes: file.size,
        }
    }
}

/// Zero-based page indices shared by every source document in a run.
///
/// An empty selection means "all pages". Indices beyond a document's page
/// count are ignored for that document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageSelection(BTreeSet<usize>);

impl PageSelection {
    /// Selection that keeps every page
    pub fn all() -> Self {
        Self::default()
    }

    /// Parse a 1-based page list such as `"1,3-5"`
    pub fn parse(spec: &str) -> Result<Self> {
        let mut pages = BTreeSet::new();

        for part in spec.split(',').map(str::trim).filter(|p| !p.is_empty()) {
            let (start, end) = match part.split_once('-') {
                Some((a, b)) => (parse_page_number(a)?, parse_page_number(b)?),
                None => {
                    let page = parse_page_number(part)?;
                    (page, page)
                }
            };

            if start > end {
                return Err(Error::InvalidPageSelection(format!(
                    "range {} runs backwards",
                    part
                )));
            }

            pages.extend((start - 1)..end);
        }

        Ok(Self(pages))
    }

    /// Whether the selection keeps every page
    pub fn is_all(&self) -> bool {
        self.0.is_empty()
    }

    /// Add a zero-based page index
    pub fn insert(&mut self, index: usize) {
        self.0.insert(index);
    }

    /// Selected indices in ascending order
    pub fn indices(&self) -> impl Iterator<Item = usize> + '_ {
        self.0.iter().copied()
    }

    /// Indices to copy from a document with `page_count` pages, ascending
    pub fn pages_for(&self, page_count: usize) -> Vec<usize> {
        if self.is_all() {
            (0..page_count).collect()
        } else {
            self.0.range(..page_count).copied().collect()
        }
    }

    pub fn clear(&mut self) {
        self.0.clear();
    }
}

impl FromIterator<usize> for PageSelection {
    fn from_iter<I: IntoIterator<Item = usize>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

fn parse_page_number(s: &str) -> Result<usize> {
    let n: usize = s
        .trim()
        .parse()
        .map_err(|_| Error::InvalidPageSelection(format!("'{}' is not a page number", s.trim())))?;
    if n == 0 {
        return Err(Error::InvalidPageSelection(
            "page numbers start at 1".to_string(),
        ));
    }
    if n > MAX_PAGE_NUMBER {
        return Err(Error::InvalidPageSelection(format!(
            "page {} is beyond the last supported page {}",
            n, MAX_PAGE_NUMBER
        )));
    }
    Ok(n)
}

/// A literal string drawn on one output page
#[derive(Debug, Clone, PartialEq)]
pub struct TextEdit {
    /// Zero-based index into the assembled output document
    pub page_index: usize,
    pub x: f32,
    pub y: f32,
    pub text: String,
}

impl Default for TextEdit {
    fn default() -> Self {
        Self {
            page_index: 0,
            x: DEFAULT_TEXT_X,
            y: DEFAULT_TEXT_Y,
            text: String::new(),
        }
    }
}

impl TextEdit {
    /// Parse a CLI edit of the form `PAGE:X:Y:TEXT` (PAGE is 1-based)
    ///
    /// The text may itself contain colons.
    pub fn parse(spec: &str) -> Result<Self> {
        let mut parts = spec.splitn(4, ':');
        let (page, x, y, text) = match (parts.next(), parts.next(), parts.next(), parts.next()) {
            (Some(page), Some(x), Some(y), Some(text)) => (page, x, y, text),
            _ => {
                return Err(Error::InvalidTextEdit(format!(
                    "expected PAGE:X:Y:TEXT, got '{}'",
                    spec
                )))
            }
        };

        let page: usize = page
            .trim()
            .parse()
            .map_err(|_| Error::InvalidTextEdit(format!("'{}' is not a page number", page)))?;
        if page == 0 {
            return Err(Error::InvalidTextEdit("page numbers start at 1".to_string()));
        }
        let x: f32 = x
            .trim()
            .parse()
            .map_err(|_| Error::InvalidTextEdit(format!("'{}' is not a coordinate", x)))?;
        let y: f32 = y
            .trim()
            .parse()
            .map_err(|_| Error::InvalidTextEdit(format!("'{}' is not a coordinate", y)))?;

        Ok(Self {
            page_index: page - 1,
            x,
            y,
            text: text.to_string(),
        })
    }
}

/// Diagonal text stamped on every output page
#[derive(Debug, Clone, PartialEq)]
pub struct WatermarkSpec {
    pub text: String,
    /// Fill and stroke alpha, within `0.0..=1.0`
    pub opacity: f32,
}

/// Serialization settings for the output document
#[derive(Debug, Clone, PartialEq)]
pub struct OutputOptions {
    /// Compress content streams
    pub compress: bool,
    /// Pack objects into object streams with a cross-reference stream
    pub use_object_streams: bool,
    /// User and owner password; `None` or empty leaves the output unencrypted
    pub password: Option<String>,
}

impl Default for OutputOptions {
    fn default() -> Self {
        Self {
            compress: true,
            use_object_streams: true,
            password: None,
        }
    }
}

impl OutputOptions {
    /// The password to encrypt with, if a non-empty one was given
    pub fn effective_password(&self) -> Option<&str> {
        self.password.as_deref().filter(|p| !p.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_page_selection() {
        let selection = PageSelection::parse("1,3-5").unwrap();
        assert_eq!(selection.indices().collect::<Vec<_>>(), vec![0, 2, 3, 4]);
    }

    #[test]
    fn test_parse_page_selection_rejects_zero_and_backwards() {
        assert!(PageSelection::parse("0").is_err());
        assert!(PageSelection::parse("5-3").is_err());
        assert!(PageSelection::parse("abc").is_err());
    }

    #[test]
    fn test_parse_page_selection_rejects_huge_ranges() {
        let result = PageSelection::parse("1-50000000");
        assert!(matches!(result, Err(Error::InvalidPageSelection(_))));
        assert!(PageSelection::parse("100001").is_err());

        let selection = PageSelection::parse("99999-100000").unwrap();
        assert_eq!(selection.indices().collect::<Vec<_>>(), vec![99_998, 99_999]);
    }

    #[test]
    fn test_empty_selection_keeps_all_pages() {
        let selection = PageSelection::parse("").unwrap();
        assert!(selection.is_all());
        assert_eq!(selection.pages_for(3), vec![0, 1, 2]);
    }

    #[test]
    fn test_selection_filters_to_document_and_sorts() {
        let selection: PageSelection = [7, 2, 0].into_iter().collect();
        assert_eq!(selection.pages_for(3), vec![0, 2]);
        assert_eq!(selection.pages_for(10), vec![0, 2, 7]);
        assert!(selection.pages_for(0).is_empty());
    }

    #[test]
    fn test_picked_file_without_name_gets_default() {
        let doc = SourceDocument::from(PickedFile {
            uri: PathBuf::from("/tmp/a.pdf"),
            name: None,
            size: Some(2048),
        });
        assert_eq!(doc.display_name, "document.pdf");
        assert_eq!(doc.size_label().as_deref(), Some("2 KB"));
    }

    #[test]
    fn test_text_edit_defaults() {
        let edit = TextEdit::default();
        assert_eq!(edit.page_index, 0);
        assert_eq!((edit.x, edit.y), (50.0, 50.0));
        assert!(edit.text.is_empty());
    }

    #[test]
    fn test_parse_text_edit_keeps_colons_in_text() {
        let edit = TextEdit::parse("2:100:200:Note: see above").unwrap();
        assert_eq!(edit.page_index, 1);
        assert_eq!((edit.x, edit.y), (100.0, 200.0));
        assert_eq!(edit.text, "Note: see above");
    }

    #[test]
    fn test_parse_text_edit_errors() {
        assert!(TextEdit::parse("1:2:3").is_err());
        assert!(TextEdit::parse("0:2:3:x").is_err());
        assert!(TextEdit::parse("1:left:3:x").is_err());
    }

    #[test]
    fn test_effective_password_ignores_empty() {
        let mut options = OutputOptions::default();
        assert_eq!(options.effective_password(), None);
        options.password = Some(String::new());
        assert_eq!(options.effective_password(), None);
        options.password = Some("secret".to_string());
        assert_eq!(options.effective_password(), Some("secret"));
    }
}

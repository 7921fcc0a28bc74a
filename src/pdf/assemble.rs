//! Page-level assembly of several PDFs into one using lopdf
//!
//! Each source is renumbered past the objects already collected, the
//! selected pages are gathered in source order, and a fresh catalog and
//! page tree are built over them when assembly finishes.

use lopdf::{Dictionary, Document, Object, ObjectId};

use crate::config::OUTPUT_PDF_VERSION;
use crate::error::Result;
use crate::model::PageSelection;

/// Page attributes a page may inherit from its ancestors in the page tree
const INHERITABLE_ATTRIBUTES: [&[u8]; 4] = [b"Resources", b"MediaBox", b"CropBox", b"Rotate"];

/// Guard against cyclic /Parent chains in malformed files
const MAX_TREE_DEPTH: usize = 64;

/// Builds the output document one source at a time
///
/// # Example
///
/// ```no_run
/// use pdf_batch::model::PageSelection;
/// use pdf_batch::pdf::Assembler;
///
/// let mut assembler = Assembler::new();
/// let source = lopdf::Document::load("first.pdf").expect("load");
/// assembler.append(source, &PageSelection::all()).expect("append");
/// let output = assembler.finish().expect("finish");
/// assert!(!output.get_pages().is_empty());
/// ```
pub struct Assembler {
    doc: Document,
    page_ids: Vec<ObjectId>,
}

impl Default for Assembler {
    fn default() -> Self {
        Self::new()
    }
}

impl Assembler {
    /// Start an empty output document
    pub fn new() -> Self {
        Self {
            doc: Document::with_version(OUTPUT_PDF_VERSION),
            page_ids: Vec::new(),
        }
    }

    /// Number of pages collected so far
    pub fn page_count(&self) -> usize {
        self.page_ids.len()
    }

    /// Copy the selected pages of `source` onto the end of the output
    ///
    /// Returns the number of pages copied. Indices in `selection` beyond the
    /// source's page count are ignored.
    pub fn append(&mut self, mut source: Document, selection: &PageSelection) -> Result<usize> {
        // Renumber objects in this document to avoid conflicts
        source.renumber_objects_with(self.doc.max_id + 1);

        let source_pages: Vec<ObjectId> = source.get_pages().into_values().collect();
        let wanted = selection.pages_for(source_pages.len());

        let mut copied = Vec::with_capacity(wanted.len());
        for index in wanted {
            let page_id = source_pages[index];
            materialise_inherited_attributes(&mut source, page_id)?;
            copied.push(page_id);
        }

        log::debug!(
            "copying {} of {} pages (ids up to {})",
            copied.len(),
            source_pages.len(),
            source.max_id
        );

        // Unselected pages and the old page tree become unreachable and are
        // pruned in finish()
        self.doc.max_id = self.doc.max_id.max(source.max_id);
        self.doc.objects.extend(source.objects);

        let count = copied.len();
        self.page_ids.extend(copied);
        Ok(count)
    }

    /// Build the catalog and page tree and return the assembled document
    pub fn finish(self) -> Result<Document> {
        let Assembler { mut doc, page_ids } = self;

        // New IDs land above everything copied from the sources
        let pages_id = doc.new_object_id();

        let kids: Vec<Object> = page_ids.iter().map(|&id| Object::Reference(id)).collect();

        let mut pages_object = Dictionary::new();
        pages_object.set("Type", Object::Name(b"Pages".to_vec()));
        pages_object.set("Count", Object::Integer(page_ids.len() as i64));
        pages_object.set("Kids", Object::Array(kids));

        let catalog_id = doc.new_object_id();
        let mut catalog = Dictionary::new();
        catalog.set("Type", Object::Name(b"Catalog".to_vec()));
        catalog.set("Pages", Object::Reference(pages_id));

        doc.objects.insert(catalog_id, Object::Dictionary(catalog));
        doc.objects.insert(pages_id, Object::Dictionary(pages_object));
        doc.trailer.set("Root", Object::Reference(catalog_id));

        for &page_id in &page_ids {
            if let Ok(Object::Dictionary(dict)) = doc.get_object_mut(page_id) {
                dict.set("Parent", Object::Reference(pages_id));
            }
        }

        let pruned = doc.prune_objects();
        log::debug!("assembled {} pages, pruned {} objects", page_ids.len(), pruned.len());

        Ok(doc)
    }
}

/// Copy attributes the page inherits from its page-tree ancestors onto the
/// page itself, so it keeps them once re-parented under the new tree.
fn materialise_inherited_attributes(doc: &mut Document, page_id: ObjectId) -> Result<()> {
    let mut inherited: Vec<(Vec<u8>, Object)> = Vec::new();

    {
        let page = doc.get_dictionary(page_id)?;
        let mut missing: Vec<&[u8]> = INHERITABLE_ATTRIBUTES
            .iter()
            .copied()
            .filter(|key| !page.has(key))
            .collect();

        let mut parent = page.get(b"Parent").and_then(Object::as_reference).ok();
        let mut depth = 0;

        while let Some(parent_id) = parent {
            if missing.is_empty() || depth >= MAX_TREE_DEPTH {
                break;
            }
            let node = match doc.get_dictionary(parent_id) {
                Ok(node) => node,
                Err(_) => break,
            };

            missing.retain(|key| match node.get(key) {
                Ok(value) => {
                    inherited.push((key.to_vec(), value.clone()));
                    false
                }
                Err(_) => true,
            });

            parent = node.get(b"Parent").and_then(Object::as_reference).ok();
            depth += 1;
        }
    }

    if !inherited.is_empty() {
        let page = doc.get_dictionary_mut(page_id)?;
        for (key, value) in inherited {
            page.set(key, value);
        }
    }

    Ok(())
}

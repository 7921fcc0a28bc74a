//! Text edits and watermarks drawn directly onto assembled pages
//!
//! Every overlay is its own content stream appended to the page's Contents,
//! so later overlays paint over earlier ones. Before the first overlay lands
//! on a page, the page's original content is wrapped in `q`/`Q` so that any
//! transformation it leaves behind cannot displace what we draw.

use std::collections::HashSet;

use lopdf::content::{Content, Operation};
use lopdf::{Dictionary, Document, Object, ObjectId, Stream};

use crate::config::{TEXT_FONT_SIZE, WATERMARK_FONT_SIZE, WATERMARK_GRAY};
use crate::error::{Error, Result};
use crate::layout::{watermark_placement, PageSize, TextPlacement};
use crate::model::{TextEdit, WatermarkSpec};

/// Resource name of the overlay font
const FONT_RESOURCE: &str = "PdfBatchHelv";

/// Resource name of the watermark transparency state
const WATERMARK_GS_RESOURCE: &str = "PdfBatchWatermark";

/// Draws overlays onto the pages of one document
pub struct Overlay<'a> {
    doc: &'a mut Document,
    pages: Vec<ObjectId>,
    font_id: Option<ObjectId>,
    isolated: HashSet<ObjectId>,
}

impl<'a> Overlay<'a> {
    pub fn new(doc: &'a mut Document) -> Self {
        let pages = doc.get_pages().into_values().collect();
        Self {
            doc,
            pages,
            font_id: None,
            isolated: HashSet::new(),
        }
    }

    /// Draw each edit, in order, on the page it addresses
    ///
    /// Edits whose page index is past the last page are skipped. Returns the
    /// number of edits drawn.
    pub fn apply_text_edits(&mut self, edits: &[TextEdit]) -> Result<usize> {
        let mut drawn = 0;

        for (i, edit) in edits.iter().enumerate() {
            let Some(&page_id) = self.pages.get(edit.page_index) else {
                log::debug!(
                    "skipping text edit {}: page {} is out of range ({} pages)",
                    i,
                    edit.page_index,
                    self.pages.len()
                );
                continue;
            };

            let font = self.font()?;
            self.isolate(page_id)?;
            add_page_resource(self.doc, page_id, b"Font", FONT_RESOURCE, font)?;

            let ops = text_operations(
                &edit.text,
                TEXT_FONT_SIZE,
                &TextPlacement::at(edit.x, edit.y),
            );
            let mut content = vec![
                Operation::new("q", vec![]),
                Operation::new("g", vec![Object::Real(0.0)]),
            ];
            content.extend(ops);
            content.push(Operation::new("Q", vec![]));

            self.append_operations(page_id, content)?;
            drawn += 1;
        }

        Ok(drawn)
    }

    /// Stamp the watermark diagonally across every page
    pub fn apply_watermark(&mut self, watermark: &WatermarkSpec) -> Result<()> {
        if self.pages.is_empty() {
            return Ok(());
        }

        let font = self.font()?;
        let gs_id = self.doc.add_object(transparency_state(watermark.opacity));

        for page_id in self.pages.clone() {
            self.isolate(page_id)?;
            add_page_resource(self.doc, page_id, b"Font", FONT_RESOURCE, font)?;
            add_page_resource(self.doc, page_id, b"ExtGState", WATERMARK_GS_RESOURCE, gs_id)?;

            let size = page_size(self.doc, page_id);
            let mut content = vec![
                Operation::new("q", vec![]),
                Operation::new("gs", vec![Object::Name(WATERMARK_GS_RESOURCE.as_bytes().to_vec())]),
                Operation::new("g", vec![Object::Real(WATERMARK_GRAY)]),
            ];
            content.extend(text_operations(
                &watermark.text,
                WATERMARK_FONT_SIZE,
                &watermark_placement(&size),
            ));
            content.push(Operation::new("Q", vec![]));

            self.append_operations(page_id, content)?;
        }

        log::debug!(
            "watermarked {} pages at opacity {}",
            self.pages.len(),
            watermark.opacity
        );
        Ok(())
    }

    /// The overlay font, added to the document on first use
    fn font(&mut self) -> Result<ObjectId> {
        if let Some(id) = self.font_id {
            return Ok(id);
        }
        let id = use_helvetica_font(self.doc);
        self.font_id = Some(id);
        Ok(id)
    }

    /// Wrap the page's original content in q/Q, once per page
    fn isolate(&mut self, page_id: ObjectId) -> Result<()> {
        if !self.isolated.insert(page_id) {
            return Ok(());
        }

        let has_content = self
            .doc
            .get_dictionary(page_id)?
            .get(b"Contents")
            .is_ok();
        if !has_content {
            return Ok(());
        }

        let save_id = self
            .doc
            .add_object(Stream::new(Dictionary::new(), b"q\n".to_vec()));
        let restore_id = self
            .doc
            .add_object(Stream::new(Dictionary::new(), b"\nQ\n".to_vec()));

        prepend_content_to_page(self.doc, page_id, save_id)?;
        append_content_to_page(self.doc, page_id, restore_id)
    }

    fn append_operations(&mut self, page_id: ObjectId, operations: Vec<Operation>) -> Result<()> {
        let bytes = Content { operations }.encode()?;
        let stream_id = self.doc.add_object(Stream::new(Dictionary::new(), bytes));
        append_content_to_page(self.doc, page_id, stream_id)
    }
}

/// `BT … ET` block drawing `text` with the overlay font
fn text_operations(text: &str, font_size: f32, placement: &TextPlacement) -> Vec<Operation> {
    let matrix = placement.text_matrix();
    vec![
        Operation::new("BT", vec![]),
        Operation::new(
            "Tf",
            vec![
                Object::Name(FONT_RESOURCE.as_bytes().to_vec()),
                Object::Real(font_size),
            ],
        ),
        Operation::new("Tm", matrix.iter().map(|&v| Object::Real(v)).collect()),
        Operation::new("Tj", vec![Object::string_literal(encode_win_ansi(text))]),
        Operation::new("ET", vec![]),
    ]
}

/// Use Helvetica (one of the 14 standard PDF fonts, so nothing is embedded)
fn use_helvetica_font(doc: &mut Document) -> ObjectId {
    let mut font = Dictionary::new();
    font.set("Type", Object::Name(b"Font".to_vec()));
    font.set("Subtype", Object::Name(b"Type1".to_vec()));
    font.set("BaseFont", Object::Name(b"Helvetica".to_vec()));
    font.set("Encoding", Object::Name(b"WinAnsiEncoding".to_vec()));

    doc.add_object(Object::Dictionary(font))
}

/// Graphics state applying `opacity` to both fill and stroke
fn transparency_state(opacity: f32) -> Object {
    let mut state = Dictionary::new();
    state.set("Type", Object::Name(b"ExtGState".to_vec()));
    state.set("ca", Object::Real(opacity));
    state.set("CA", Object::Real(opacity));
    Object::Dictionary(state)
}

/// Encode text for a WinAnsi font; unmapped characters become `?`
fn encode_win_ansi(text: &str) -> Vec<u8> {
    text.chars()
        .map(|c| match c as u32 {
            code @ (0x20..=0x7E | 0xA0..=0xFF) => code as u8,
            _ => win_ansi_extra(c).unwrap_or(b'?'),
        })
        .collect()
}

/// The 0x80-0x9F block, where WinAnsi departs from Latin-1
fn win_ansi_extra(c: char) -> Option<u8> {
    let code = match c {
        '\u{20AC}' => 0x80, // €
        '\u{201A}' => 0x82,
        '\u{0192}' => 0x83,
        '\u{201E}' => 0x84,
        '\u{2026}' => 0x85, // …
        '\u{2020}' => 0x86,
        '\u{2021}' => 0x87,
        '\u{02C6}' => 0x88,
        '\u{2030}' => 0x89,
        '\u{0160}' => 0x8A,
        '\u{2039}' => 0x8B,
        '\u{0152}' => 0x8C,
        '\u{017D}' => 0x8E,
        '\u{2018}' => 0x91,
        '\u{2019}' => 0x92,
        '\u{201C}' => 0x93,
        '\u{201D}' => 0x94,
        '\u{2022}' => 0x95, // •
        '\u{2013}' => 0x96, // –
        '\u{2014}' => 0x97, // —
        '\u{02DC}' => 0x98,
        '\u{2122}' => 0x99, // ™
        '\u{0161}' => 0x9A,
        '\u{203A}' => 0x9B,
        '\u{0153}' => 0x9C,
        '\u{017E}' => 0x9E,
        '\u{0178}' => 0x9F,
        _ => return None,
    };
    Some(code)
}

/// Visible size of a page, falling back to US Letter
fn page_size(doc: &Document, page_id: ObjectId) -> PageSize {
    let media_box = doc
        .get_dictionary(page_id)
        .and_then(|page| page.get(b"MediaBox"))
        .and_then(|obj| match obj {
            Object::Reference(id) => doc.get_object(*id),
            other => Ok(other),
        })
        .and_then(Object::as_array);

    let rect = match media_box {
        Ok(values) if values.len() == 4 => {
            let nums: Vec<f32> = values.iter().filter_map(|v| v.as_float().ok()).collect();
            if nums.len() == 4 {
                Some([nums[0], nums[1], nums[2], nums[3]])
            } else {
                None
            }
        }
        _ => None,
    };

    rect.and_then(PageSize::from_box).unwrap_or_else(PageSize::letter)
}

/// Register `resource_id` under `/category/name` in the page's Resources
///
/// Shared (referenced) Resources are copied onto the page so the change
/// stays local to it.
fn add_page_resource(
    doc: &mut Document,
    page_id: ObjectId,
    category: &[u8],
    name: &str,
    resource_id: ObjectId,
) -> Result<()> {
    let mut resources = {
        let page_dict = doc.get_dictionary(page_id)?;
        match page_dict.get(b"Resources") {
            Ok(Object::Dictionary(dict)) => dict.clone(),
            Ok(Object::Reference(res_id)) => match doc.get_object(*res_id) {
                Ok(Object::Dictionary(dict)) => dict.clone(),
                _ => Dictionary::new(),
            },
            _ => Dictionary::new(),
        }
    };

    let mut entries = match resources.get(category) {
        Ok(Object::Dictionary(dict)) => dict.clone(),
        Ok(Object::Reference(id)) => match doc.get_object(*id) {
            Ok(Object::Dictionary(dict)) => dict.clone(),
            _ => Dictionary::new(),
        },
        _ => Dictionary::new(),
    };

    entries.set(name, Object::Reference(resource_id));
    resources.set(category.to_vec(), Object::Dictionary(entries));

    match doc.get_object_mut(page_id)? {
        Object::Dictionary(page_dict) => {
            page_dict.set("Resources", Object::Dictionary(resources));
            Ok(())
        }
        _ => Err(Error::General(format!(
            "page object {} {} is not a dictionary",
            page_id.0, page_id.1
        ))),
    }
}

/// Prepend a content stream to a page's Contents
fn prepend_content_to_page(doc: &mut Document, page_id: ObjectId, new_content_id: ObjectId) -> Result<()> {
    let page_dict = doc.get_dictionary_mut(page_id)?;
    let existing_content = page_dict.get(b"Contents").ok().cloned();

    match existing_content {
        Some(Object::Reference(content_id)) => {
            let new_contents = vec![
                Object::Reference(new_content_id),
                Object::Reference(content_id),
            ];
            page_dict.set("Contents", Object::Array(new_contents));
        }
        Some(Object::Array(mut content_array)) => {
            content_array.insert(0, Object::Reference(new_content_id));
            page_dict.set("Contents", Object::Array(content_array));
        }
        _ => {
            page_dict.set("Contents", Object::Array(vec![Object::Reference(new_content_id)]));
        }
    }

    Ok(())
}

/// Append a content stream to a page's Contents, so it paints last
fn append_content_to_page(doc: &mut Document, page_id: ObjectId, new_content_id: ObjectId) -> Result<()> {
    let page_dict = doc.get_dictionary_mut(page_id)?;
    let existing_content = page_dict.get(b"Contents").ok().cloned();

    match existing_content {
        Some(Object::Reference(content_id)) => {
            let new_contents = vec![
                Object::Reference(content_id),
                Object::Reference(new_content_id),
            ];
            page_dict.set("Contents", Object::Array(new_contents));
        }
        Some(Object::Array(mut content_array)) => {
            content_array.push(Object::Reference(new_content_id));
            page_dict.set("Contents", Object::Array(content_array));
        }
        _ => {
            page_dict.set("Contents", Object::Array(vec![Object::Reference(new_content_id)]));
        }
    }

    Ok(())
}

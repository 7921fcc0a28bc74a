//! PDF manipulation module

pub mod assemble;
pub mod metadata;
pub mod overlay;
pub mod serialize;

// Re-export commonly used items
pub use assemble::Assembler;
pub use metadata::{count_pages, extract_metadata, load_document, page_count, PdfMetadata};
pub use overlay::Overlay;
pub use serialize::serialize;

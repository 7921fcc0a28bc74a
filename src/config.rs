//! Fixed defaults for edits, watermarks and output files

/// Default x position of a newly added text edit, in points
pub const DEFAULT_TEXT_X: f32 = 50.0;

/// Default y position of a newly added text edit, in points
pub const DEFAULT_TEXT_Y: f32 = 50.0;

/// Font size used for text edits
pub const TEXT_FONT_SIZE: f32 = 12.0;

/// Opacity used when a watermark is set without one
pub const DEFAULT_WATERMARK_OPACITY: f32 = 0.3;

/// Font size used for the watermark
pub const WATERMARK_FONT_SIZE: f32 = 50.0;

/// Distance the watermark origin is shifted left of the page centre
pub const WATERMARK_LEFT_OFFSET: f32 = 150.0;

/// Watermark rotation in degrees (counter-clockwise)
pub const WATERMARK_ANGLE_DEGREES: f32 = 45.0;

/// Gray level of the watermark fill (0 = black, 1 = white)
pub const WATERMARK_GRAY: f32 = 0.5;

/// Highest page number accepted in a page selection
pub const MAX_PAGE_NUMBER: usize = 100_000;

/// Display name used when a picked file has none
pub const DEFAULT_DOCUMENT_NAME: &str = "document.pdf";

/// MIME type handed to the share target
pub const PDF_MIME_TYPE: &str = "application/pdf";

/// Title handed to the share target
pub const SHARE_TITLE: &str = "Share PDF";

/// Prefix of every output file name
pub const OUTPUT_FILE_PREFIX: &str = "processed_";

/// PDF version of the assembled output document
pub const OUTPUT_PDF_VERSION: &str = "1.5";

/// Key length (bits) used when a password is supplied
pub const ENCRYPTION_KEY_BITS: usize = 128;

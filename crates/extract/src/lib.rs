#![forbid(unsafe_code)]

//! Text extraction for uploaded documents.
//!
//! Every extractor implements [`TextExtractor`]; [`DocumentExtractor`] picks
//! one by file extension and falls back to an external OCR command when one
//! is configured.

pub mod bin_detect;
mod command;
mod document;
mod error;
mod pdf;
mod plain;

pub use command::CommandExtractor;
pub use document::DocumentExtractor;
pub use error::ExtractError;
pub use pdf::PdfExtractor;
pub use plain::PlainTextExtractor;

use std::path::Path;

pub trait TextExtractor: Send + Sync {
    fn extract(&self, path: &Path) -> Result<String, ExtractError>;
}

impl<T: TextExtractor + ?Sized> TextExtractor for Box<T> {
    fn extract(&self, path: &Path) -> Result<String, ExtractError> {
        (**self).extract(path)
    }
}

impl<T: TextExtractor + ?Sized> TextExtractor for std::sync::Arc<T> {
    fn extract(&self, path: &Path) -> Result<String, ExtractError> {
        (**self).extract(path)
    }
}

/// Lowercased extension without the dot.
pub(crate) fn extension_of(path: &Path) -> String {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_ascii_lowercase())
        .unwrap_or_default()
}

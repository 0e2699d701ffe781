#![forbid(unsafe_code)]

use crate::{ExtractError, TextExtractor};
use std::path::Path;

pub(crate) const PLAIN_EXTENSIONS: &[&str] = &["txt", "text", "md", "csv"];

#[derive(Clone, Copy, Debug, Default)]
pub struct PlainTextExtractor;

impl TextExtractor for PlainTextExtractor {
    fn extract(&self, path: &Path) -> Result<String, ExtractError> {
        let bytes = std::fs::read(path)?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_utf8_is_replaced_not_rejected() {
        let path = std::env::temp_dir().join(format!(
            "it_extract_plain_{}_{}.txt",
            std::process::id(),
            line!()
        ));
        std::fs::write(&path, b"Offer Letter \xff ok").expect("write sample");
        let text = PlainTextExtractor.extract(&path).expect("extract");
        assert!(text.starts_with("Offer Letter "));
        assert!(text.ends_with(" ok"));
        let _ = std::fs::remove_file(&path);
    }
}

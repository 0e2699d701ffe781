#![forbid(unsafe_code)]

use crate::{ExtractError, TextExtractor};
use lopdf::Document;
use std::path::Path;

/// In-process text layer extraction. Scanned PDFs without a text layer
/// yield an empty string.
#[derive(Clone, Copy, Debug, Default)]
pub struct PdfExtractor;

impl TextExtractor for PdfExtractor {
    fn extract(&self, path: &Path) -> Result<String, ExtractError> {
        let document = Document::load(path)?;
        let pages = document.get_pages().keys().copied().collect::<Vec<u32>>();
        if pages.is_empty() {
            return Ok(String::new());
        }
        Ok(document.extract_text(&pages)?)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::bin_detect::tests::temp_dir;
    use lopdf::content::{Content, Operation};
    use lopdf::{Object, Stream, dictionary};

    /// Writes a one-page PDF; `text` becomes a Helvetica text run, `None`
    /// leaves the page without a text layer.
    pub(crate) fn write_pdf(path: &Path, text: Option<&str>) {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        let font_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Helvetica",
            "Encoding" => "WinAnsiEncoding",
        });
        let resources_id = doc.add_object(dictionary! {
            "Font" => dictionary! { "F1" => font_id },
        });
        let operations = match text {
            Some(text) => vec![
                Operation::new("BT", vec![]),
                Operation::new("Tf", vec!["F1".into(), 18.into()]),
                Operation::new("Td", vec![72.into(), 720.into()]),
                Operation::new("Tj", vec![Object::string_literal(text)]),
                Operation::new("ET", vec![]),
            ],
            None => Vec::new(),
        };
        let content = Content { operations };
        let content_id = doc.add_object(Stream::new(
            dictionary! {},
            content.encode().expect("encode content"),
        ));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
            "Resources" => resources_id,
            "MediaBox" => vec![0.into(), 0.into(), 595.into(), 842.into()],
        });
        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => vec![page_id.into()],
                "Count" => 1,
            }),
        );
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);
        doc.save(path).expect("save pdf");
    }

    #[test]
    fn text_layer_is_extracted() {
        let dir = temp_dir("it_extract_pdf_text");
        let path = dir.join("offer.pdf");
        write_pdf(&path, Some("Offer Letter"));

        let text = PdfExtractor.extract(&path).expect("extract");
        assert!(text.contains("Offer Letter"), "{text:?}");

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn page_without_text_yields_blank_text() {
        let dir = temp_dir("it_extract_pdf_blank");
        let path = dir.join("scan.pdf");
        write_pdf(&path, None);

        let text = PdfExtractor.extract(&path).expect("extract");
        assert!(text.trim().is_empty(), "{text:?}");

        let _ = std::fs::remove_dir_all(&dir);
    }
}

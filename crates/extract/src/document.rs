#![forbid(unsafe_code)]

use crate::plain::PLAIN_EXTENSIONS;
use crate::{
    CommandExtractor, ExtractError, PdfExtractor, PlainTextExtractor, TextExtractor, extension_of,
};
use std::path::Path;
use tracing::{debug, warn};

const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "tif", "tiff", "bmp", "gif", "webp"];

/// Extension-dispatching extractor used by the upload pipeline.
#[derive(Clone, Debug, Default)]
pub struct DocumentExtractor {
    pdf: PdfExtractor,
    plain: PlainTextExtractor,
    ocr: Option<CommandExtractor>,
}

impl DocumentExtractor {
    pub fn new(ocr: Option<CommandExtractor>) -> Self {
        Self {
            ocr,
            ..Self::default()
        }
    }

    pub fn has_ocr(&self) -> bool {
        self.ocr.is_some()
    }

    fn ocr_or_unsupported(&self, path: &Path, ext: &str) -> Result<String, ExtractError> {
        match &self.ocr {
            Some(ocr) => ocr.extract(path),
            None => Err(ExtractError::Unsupported(ext.to_string())),
        }
    }

    fn extract_pdf(&self, path: &Path) -> Result<String, ExtractError> {
        let text = match self.pdf.extract(path) {
            Ok(text) => text,
            Err(err) if self.ocr.is_some() => {
                warn!(path = %path.display(), error = %err, "pdf parse failed; trying ocr");
                String::new()
            }
            Err(err) => return Err(err),
        };
        if !text.trim().is_empty() {
            return Ok(text);
        }
        match &self.ocr {
            Some(ocr) => {
                debug!(path = %path.display(), "pdf has no text layer; running ocr");
                ocr.extract(path)
            }
            None => Ok(text),
        }
    }
}

impl TextExtractor for DocumentExtractor {
    fn extract(&self, path: &Path) -> Result<String, ExtractError> {
        let ext = extension_of(path);
        match ext.as_str() {
            "pdf" => self.extract_pdf(path),
            e if PLAIN_EXTENSIONS.contains(&e) => self.plain.extract(path),
            e if IMAGE_EXTENSIONS.contains(&e) => self.ocr_or_unsupported(path, e),
            e => Err(ExtractError::Unsupported(e.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bin_detect::tests::temp_dir;

    #[test]
    fn text_files_are_read_directly() {
        let dir = temp_dir("it_extract_doc_txt");
        let path = dir.join("Offer.TXT");
        std::fs::write(&path, "Offer Letter from Acme").expect("write");

        let text = DocumentExtractor::new(None).extract(&path).expect("extract");
        assert_eq!(text, "Offer Letter from Acme");

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn images_without_ocr_are_unsupported() {
        let extractor = DocumentExtractor::new(None);
        assert!(!extractor.has_ocr());
        assert!(matches!(
            extractor.extract(Path::new("scan.jpg")),
            Err(ExtractError::Unsupported(ext)) if ext == "jpg"
        ));
        assert!(matches!(
            extractor.extract(Path::new("archive.zip")),
            Err(ExtractError::Unsupported(_))
        ));
    }

    #[test]
    fn broken_pdf_without_ocr_is_an_error() {
        let dir = temp_dir("it_extract_doc_pdf");
        let path = dir.join("broken.pdf");
        std::fs::write(&path, b"not really a pdf").expect("write");

        assert!(DocumentExtractor::new(None).extract(&path).is_err());

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[cfg(unix)]
    #[test]
    fn broken_pdf_falls_back_to_ocr() {
        use crate::bin_detect::tests::write_stub;
        use std::time::Duration;

        let dir = temp_dir("it_extract_doc_ocr");
        let stub = write_stub(&dir, "ocr", "#!/bin/sh\necho 'Completion Certificate'\n");
        let path = dir.join("scan.pdf");
        std::fs::write(&path, b"%PDF-garbage").expect("write");

        let ocr = CommandExtractor::new(stub.to_string_lossy(), Duration::from_secs(5));
        let text = DocumentExtractor::new(Some(ocr))
            .extract(&path)
            .expect("extract");
        assert_eq!(text.trim(), "Completion Certificate");

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[cfg(unix)]
    fn marking_ocr_stub(dir: &Path) -> CommandExtractor {
        use crate::bin_detect::tests::write_stub;
        use std::time::Duration;

        let marker = dir.join("ocr-ran");
        let script = format!(
            "#!/bin/sh\ntouch '{}'\necho 'Internship Report'\n",
            marker.display()
        );
        let stub = write_stub(dir, "ocr", &script);
        CommandExtractor::new(stub.to_string_lossy(), Duration::from_secs(5))
    }

    #[cfg(unix)]
    #[test]
    fn pdf_without_text_layer_goes_to_ocr() {
        use crate::pdf::tests::write_pdf;

        let dir = temp_dir("it_extract_doc_blank_pdf");
        let path = dir.join("scan.pdf");
        write_pdf(&path, None);

        let extractor = DocumentExtractor::new(Some(marking_ocr_stub(&dir)));
        let text = extractor.extract(&path).expect("extract");
        assert_eq!(text.trim(), "Internship Report");
        assert!(dir.join("ocr-ran").exists());

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[cfg(unix)]
    #[test]
    fn pdf_with_text_layer_skips_ocr() {
        use crate::pdf::tests::write_pdf;

        let dir = temp_dir("it_extract_doc_text_pdf");
        let path = dir.join("offer.pdf");
        write_pdf(&path, Some("Offer Letter"));

        let extractor = DocumentExtractor::new(Some(marking_ocr_stub(&dir)));
        let text = extractor.extract(&path).expect("extract");
        assert!(text.contains("Offer Letter"), "{text:?}");
        assert!(!dir.join("ocr-ran").exists());

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn pdf_without_text_and_without_ocr_is_blank() {
        use crate::pdf::tests::write_pdf;

        let dir = temp_dir("it_extract_doc_blank_no_ocr");
        let path = dir.join("scan.pdf");
        write_pdf(&path, None);

        let text = DocumentExtractor::new(None).extract(&path).expect("extract");
        assert!(text.trim().is_empty());

        let _ = std::fs::remove_dir_all(&dir);
    }
}

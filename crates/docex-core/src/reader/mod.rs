//! Turning uploaded files into document text.
//!
//! PDFs are read from their text layer, images go through OCR on a
//! vision-capable language model, and anything else is rejected.

mod ocr;

use std::sync::Arc;

use docex_llm::LanguageModel;
use tracing::{debug, info};

use crate::error::ReaderError;
use crate::models::{FileKind, ReaderConfig};
use crate::pdf::{PdfExtractor, PdfProcessor};

pub use ocr::{API_KEY_REQUIRED, OcrOutcome, run_ocr};

/// Image extensions accepted for OCR.
pub const IMAGE_EXTENSIONS: [&str; 5] = ["jpg", "jpeg", "png", "bmp", "gif"];

/// Result type for reader operations.
pub type Result<T> = std::result::Result<T, ReaderError>;

/// Lower-cased text after the last `.` of a file name.
///
/// A name without a dot yields the whole name.
pub fn file_extension(filename: &str) -> String {
    filename
        .rsplit('.')
        .next()
        .unwrap_or_default()
        .to_lowercase()
}

/// Whether a file name has an extension the reader accepts.
pub fn is_supported(filename: &str) -> bool {
    let ext = file_extension(filename);
    ext == "pdf" || IMAGE_EXTENSIONS.contains(&ext.as_str())
}

/// Extract text and file kind from an uploaded file.
///
/// Without a vision model, images yield [`API_KEY_REQUIRED`] as their text.
/// OCR failures are returned inline as `[<backend> OCR Error: ...]`.
pub fn get_text_and_type(
    bytes: &[u8],
    filename: &str,
    vision: Option<&dyn LanguageModel>,
) -> Result<(String, FileKind)> {
    read_with(bytes, filename, vision, false)
}

/// Reader holding the vision model and reading policy.
#[derive(Clone, Default)]
pub struct DocumentReader {
    vision: Option<Arc<dyn LanguageModel>>,
    config: ReaderConfig,
}

impl DocumentReader {
    /// Create a reader without a vision model.
    pub fn new(config: ReaderConfig) -> Self {
        Self {
            vision: None,
            config,
        }
    }

    /// Use `model` for image OCR.
    pub fn with_vision_model(mut self, model: Arc<dyn LanguageModel>) -> Self {
        self.vision = Some(model);
        self
    }

    pub fn has_vision_model(&self) -> bool {
        self.vision.is_some()
    }

    /// Extract text and file kind from an uploaded file.
    pub fn read(&self, bytes: &[u8], filename: &str) -> Result<(String, FileKind)> {
        read_with(bytes, filename, self.vision.as_deref(), self.config.strict_ocr)
    }
}

fn read_with(
    bytes: &[u8],
    filename: &str,
    vision: Option<&dyn LanguageModel>,
    strict_ocr: bool,
) -> Result<(String, FileKind)> {
    let ext = file_extension(filename);
    info!("Reading {} ({} bytes)", filename, bytes.len());

    match ext.as_str() {
        "pdf" => {
            let extractor = PdfExtractor::from_bytes(bytes)?;
            let text = extractor.extract_text()?;
            debug!("PDF text: {} chars", text.chars().count());
            Ok((text, FileKind::Pdf))
        }
        e if IMAGE_EXTENSIONS.contains(&e) => {
            let text = match run_ocr(bytes, vision) {
                OcrOutcome::Text(text) => text,
                OcrOutcome::Failed(failure) if strict_ocr => {
                    return Err(ReaderError::Ocr(failure.message));
                }
                OcrOutcome::Failed(failure) => failure.inline_text(),
            };
            Ok((text, FileKind::Image))
        }
        _ => Err(ReaderError::UnsupportedFileType(ext)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pdf::{build_pdf, build_pdf_with_font};
    use crate::testing::{PNG_BYTES, ScriptedModel};
    use pretty_assertions::assert_eq;

    #[test]
    fn test_file_extension() {
        assert_eq!(file_extension("scan.PNG"), "png");
        assert_eq!(file_extension("archive.tar.pdf"), "pdf");
        assert_eq!(file_extension("README"), "readme");
        assert!(is_supported("bill.JPEG"));
        assert!(!is_supported("notes.txt"));
    }

    #[test]
    fn test_unsupported_extension() {
        let result = get_text_and_type(b"hello", "notes.txt", None);
        match result {
            Err(ReaderError::UnsupportedFileType(ext)) => assert_eq!(ext, "txt"),
            other => panic!("expected unsupported file type, got {:?}", other),
        }
    }

    #[test]
    fn test_image_without_model() {
        let (text, kind) = get_text_and_type(PNG_BYTES, "scan.png", None).unwrap();
        assert_eq!(text, "[Error: API key required for image processing]");
        assert_eq!(kind, FileKind::Image);
    }

    #[test]
    fn test_image_ocr() {
        let model = ScriptedModel::default().with_ocr("INVOICE INV-7");
        let (text, kind) = get_text_and_type(PNG_BYTES, "scan.png", Some(&model)).unwrap();
        assert_eq!(text, "INVOICE INV-7");
        assert_eq!(kind, FileKind::Image);
        assert!(model.prompts()[0].contains("Extract all text from this image."));
    }

    #[test]
    fn test_ocr_failure_is_inline() {
        let model = ScriptedModel::default();
        let (text, _) = get_text_and_type(PNG_BYTES, "scan.jpg", Some(&model)).unwrap();
        assert_eq!(text, "[Scripted OCR Error: request timed out: scripted timeout]");
    }

    #[test]
    fn test_strict_ocr_propagates() {
        let reader = DocumentReader::new(ReaderConfig { strict_ocr: true });
        assert!(matches!(
            reader.read(PNG_BYTES, "scan.png"),
            Err(ReaderError::Ocr(_))
        ));

        let reader = reader.with_vision_model(Arc::new(ScriptedModel::default()));
        assert!(matches!(
            reader.read(b"GIF89a....", "scan.gif"),
            Err(ReaderError::Ocr(_))
        ));
    }

    #[test]
    fn test_pdf_is_read() {
        let data = build_pdf(&["Prescription for Jane"]);
        let (text, kind) = get_text_and_type(&data, "rx.pdf", None).unwrap();
        assert_eq!(kind, FileKind::Pdf);
        assert!(text.starts_with("\n--- Page 1 ---\n"));
    }

    #[test]
    fn test_pdf_with_undeclared_font() {
        let data = build_pdf_with_font(&["Invoice INV-9"], "F9");
        let (text, kind) = get_text_and_type(&data, "odd.pdf", None).unwrap();
        assert_eq!(kind, FileKind::Pdf);
        assert!(text.starts_with("\n--- Page 1 ---\n"));
    }

    #[test]
    fn test_broken_pdf_is_fatal() {
        assert!(matches!(
            get_text_and_type(b"%PDF-broken", "x.pdf", None),
            Err(ReaderError::Pdf(_))
        ));
    }
}

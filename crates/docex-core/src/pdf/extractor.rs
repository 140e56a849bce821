//! PDF text extraction using lopdf and pdf-extract.

use std::panic::{self, AssertUnwindSafe};

use lopdf::Document;
use tracing::{debug, warn};

use super::{PdfProcessor, Result};
use crate::error::PdfError;

/// PDF text extractor using lopdf for loading and pdf-extract for layout-aware text.
pub struct PdfExtractor {
    document: Option<Document>,
    raw_data: Vec<u8>,
}

/// Text from a single PDF page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PdfPage {
    /// Page number (1-indexed).
    pub number: u32,
    /// Extracted text from this page (may be empty).
    pub text: String,
}

impl PdfExtractor {
    /// Create a new PDF extractor.
    pub fn new() -> Self {
        Self {
            document: None,
            raw_data: Vec::new(),
        }
    }

    /// Load a PDF from bytes in one step.
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        let mut extractor = Self::new();
        extractor.load(data)?;
        Ok(extractor)
    }

    fn document(&self) -> Result<&Document> {
        self.document
            .as_ref()
            .ok_or(PdfError::Parse("No document loaded".to_string()))
    }

    /// Per-page text straight from the lopdf content streams.
    fn lopdf_page_text(&self, page: u32) -> Result<String> {
        let doc = self.document()?;
        if !doc.get_pages().contains_key(&page) {
            return Err(PdfError::InvalidPage(page));
        }
        doc.extract_text(&[page])
            .map_err(|e| PdfError::TextExtraction(e.to_string()))
    }

    fn lopdf_pages(&self, page_count: u32) -> Vec<String> {
        (1..=page_count)
            .map(|p| self.lopdf_page_text(p).unwrap_or_default())
            .collect()
    }
}

impl Default for PdfExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl PdfProcessor for PdfExtractor {
    fn load(&mut self, data: &[u8]) -> Result<()> {
        let mut doc = Document::load_mem(data).map_err(|e| PdfError::Parse(e.to_string()))?;

        // Handle PDFs with empty password encryption
        if doc.is_encrypted() {
            if doc.decrypt("").is_err() {
                return Err(PdfError::Encrypted);
            }
            debug!("Decrypted PDF with empty password");

            // pdf-extract needs the decrypted bytes
            let mut decrypted_data = Vec::new();
            doc.save_to(&mut decrypted_data)
                .map_err(|e| PdfError::Parse(format!("Failed to save decrypted PDF: {}", e)))?;
            self.raw_data = decrypted_data;
        } else {
            self.raw_data = data.to_vec();
        }

        let page_count = doc.get_pages().len();
        if page_count == 0 {
            return Err(PdfError::NoPages);
        }

        debug!("Loaded PDF with {} pages", page_count);
        self.document = Some(doc);
        Ok(())
    }

    fn page_count(&self) -> u32 {
        self.document
            .as_ref()
            .map(|doc| doc.get_pages().len() as u32)
            .unwrap_or(0)
    }

    fn extract_pages(&self) -> Result<Vec<PdfPage>> {
        let page_count = self.page_count();
        if page_count == 0 {
            return Err(PdfError::NoPages);
        }

        // pdf-extract can panic on fonts or encodings lopdf accepts
        let layout = panic::catch_unwind(AssertUnwindSafe(|| {
            pdf_extract::extract_text_from_mem_by_pages(&self.raw_data)
        }));

        let texts = match layout {
            Ok(Ok(texts)) if texts.len() == page_count as usize => texts,
            Ok(Ok(texts)) => {
                warn!(
                    "pdf-extract returned {} pages, expected {}; using lopdf text",
                    texts.len(),
                    page_count
                );
                self.lopdf_pages(page_count)
            }
            Ok(Err(e)) => {
                warn!("pdf-extract failed ({}), using lopdf text", e);
                self.lopdf_pages(page_count)
            }
            Err(_) => {
                warn!("pdf-extract panicked, using lopdf text");
                self.lopdf_pages(page_count)
            }
        };

        let pages: Vec<PdfPage> = texts
            .into_iter()
            .zip(1..)
            .map(|(text, number)| PdfPage { number, text })
            .collect();

        let total_chars: usize = pages.iter().map(|p| p.text.chars().count()).sum();
        debug!("Extracted {} chars from {} pages", total_chars, pages.len());
        if total_chars == 0 {
            warn!("PDF has no text layer; scanned PDFs are not OCR'd");
        }

        Ok(pages)
    }

    fn extract_page_text(&self, page: u32) -> Result<String> {
        if page == 0 || page > self.page_count() {
            return Err(PdfError::InvalidPage(page));
        }
        let pages = self.extract_pages()?;
        Ok(pages
            .into_iter()
            .find(|p| p.number == page)
            .map(|p| p.text)
            .unwrap_or_default())
    }
}

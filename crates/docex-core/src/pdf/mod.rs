//! PDF text extraction module.

mod extractor;

pub use extractor::{PdfExtractor, PdfPage};

#[cfg(test)]
pub(crate) use extractor::tests::{build_pdf, build_pdf_with_font};

use crate::error::PdfError;

/// Result type for PDF operations.
pub type Result<T> = std::result::Result<T, PdfError>;

/// Trait for PDF processing implementations.
pub trait PdfProcessor {
    /// Load a PDF from bytes.
    fn load(&mut self, data: &[u8]) -> Result<()>;

    /// Get the number of pages in the PDF.
    fn page_count(&self) -> u32;

    /// Extract text from every page, in page order.
    fn extract_pages(&self) -> Result<Vec<PdfPage>>;

    /// Extract text from a specific page (1-indexed).
    fn extract_page_text(&self, page: u32) -> Result<String>;

    /// Extract the whole document with a `--- Page N ---` header before each page.
    fn extract_text(&self) -> Result<String> {
        let pages = self.extract_pages()?;
        Ok(join_pages(&pages))
    }
}

/// Concatenate pages, each introduced by a `--- Page N ---` header line.
pub fn join_pages(pages: &[PdfPage]) -> String {
    pages
        .iter()
        .map(|p| format!("\n--- Page {} ---\n{}\n", p.number, p.text))
        .collect()
}

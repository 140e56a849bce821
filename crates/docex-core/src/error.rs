//! Error types for the docex-core library.

use thiserror::Error;

/// Main error type for the docex library.
#[derive(Error, Debug)]
pub enum DocexError {
    /// The document could not be turned into text.
    #[error("reader error: {0}")]
    Reader(#[from] ReaderError),

    /// Language model error surfaced outside the graceful-degradation path.
    #[error("language model error: {0}")]
    Llm(#[from] docex_llm::LlmError),
}

/// Errors raised while turning an uploaded file into text.
#[derive(Error, Debug)]
pub enum ReaderError {
    /// The file extension is not one we can read.
    #[error("unsupported file type: {0}")]
    UnsupportedFileType(String),

    /// PDF text extraction failed.
    #[error("PDF error: {0}")]
    Pdf(#[from] PdfError),

    /// OCR failed and the reader is configured to propagate OCR failures.
    #[error("OCR failed: {0}")]
    Ocr(String),
}

/// Errors related to PDF processing.
#[derive(Error, Debug)]
pub enum PdfError {
    /// Failed to open/parse the PDF file.
    #[error("failed to parse PDF: {0}")]
    Parse(String),

    /// Failed to extract text from PDF.
    #[error("failed to extract text: {0}")]
    TextExtraction(String),

    /// The PDF is encrypted and cannot be processed.
    #[error("PDF is encrypted")]
    Encrypted,

    /// The PDF is empty or has no pages.
    #[error("PDF has no pages")]
    NoPages,

    /// Invalid page number requested.
    #[error("invalid page number: {0}")]
    InvalidPage(u32),
}

/// Result type for the docex library.
pub type Result<T> = std::result::Result<T, DocexError>;

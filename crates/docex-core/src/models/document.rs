//! Document and file classification types.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Kind of document recognised by the classifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocType {
    /// Commercial invoice.
    Invoice,
    /// Bill from a medical provider.
    MedicalBill,
    /// Medical prescription.
    Prescription,
}

impl DocType {
    /// All document types, in classification-prompt order.
    pub const ALL: [DocType; 3] = [DocType::Invoice, DocType::MedicalBill, DocType::Prescription];

    /// Parse a label such as `"medical_bill"`.
    ///
    /// Surrounding whitespace and case are ignored; anything other than an
    /// exact label yields `None`.
    pub fn from_label(label: &str) -> Option<Self> {
        match label.trim().to_lowercase().as_str() {
            "invoice" => Some(Self::Invoice),
            "medical_bill" => Some(Self::MedicalBill),
            "prescription" => Some(Self::Prescription),
            _ => None,
        }
    }

    /// Canonical lower-case label.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Invoice => "invoice",
            Self::MedicalBill => "medical_bill",
            Self::Prescription => "prescription",
        }
    }
}

impl Default for DocType {
    fn default() -> Self {
        Self::Invoice
    }
}

impl fmt::Display for DocType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Kind of file the reader produced text from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FileKind {
    /// PDF with an embedded text layer.
    Pdf,
    /// Raster image sent through OCR.
    Image,
}

impl FileKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pdf => "pdf",
            Self::Image => "image",
        }
    }
}

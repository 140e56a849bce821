//! Prompt templates sent to the language model.

use crate::models::DocType;

/// Classification prompt; `{doc_text}` is replaced with the document text.
pub const DOC_TYPE_PROMPT: &str = "
Classify this document as one of these types: invoice, medical_bill, or prescription.
Look for key indicators:
- Invoice: invoice number, vendor, billing address, line items, totals
- Medical_bill: patient name, provider, medical procedures, charges, insurance
- Prescription: patient, prescriber, medications, dosage, pharmacy

Document text:
{doc_text}

Respond with ONLY the document type: invoice, medical_bill, or prescription
";

/// Field extraction prompt; `{doc_type}`, `{fields}` and `{doc_text}` are substituted.
pub const EXTRACTION_PROMPT: &str = r#"Extract these fields from this {doc_type} document: {fields}

Document text:
{doc_text}

Return only a JSON array like this:
[{"name":"patient_name","value":"Sarah Johnson","confidence":0.9}]

Extract the actual values you see in the document. Use "NOT_FOUND" as the value for fields that are not present. Use confidence 0.8-0.9 for clear values."#;

/// Prompt sent together with an image for OCR.
pub const OCR_PROMPT: &str = "
Extract all text from this image.
Preserve formatting, numbers, dates, and structure.
If this appears to be an invoice, medical bill, or prescription,
focus on key fields like names, dates, amounts, and addresses.
";

/// Build the classification prompt for an already-truncated document text.
pub fn classification_prompt(doc_text: &str) -> String {
    render(DOC_TYPE_PROMPT, &[("doc_text", doc_text)])
}

/// Build the extraction prompt for an already-truncated document text.
pub fn extraction_prompt(doc_type: DocType, doc_text: &str, fields: &[String]) -> String {
    let fields = fields.join(", ");
    render(
        EXTRACTION_PROMPT,
        &[
            ("doc_type", doc_type.as_str()),
            ("fields", fields.as_str()),
            ("doc_text", doc_text),
        ],
    )
}

/// Substitute `{name}` placeholders in a single pass over `template`.
/// Substituted values are never rescanned; unknown braces are copied as-is.
fn render(template: &str, vars: &[(&str, &str)]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(start) = rest.find('{') {
        out.push_str(&rest[..start]);
        let inner = &rest[start + 1..];
        let var = vars.iter().find(|(name, _)| {
            inner.starts_with(name) && inner[name.len()..].starts_with('}')
        });
        match var {
            Some((name, value)) => {
                out.push_str(value);
                rest = &inner[name.len() + 1..];
            }
            None => {
                out.push('{');
                rest = inner;
            }
        }
    }
    out.push_str(rest);
    out
}

/// First `max_chars` characters of `text`, never splitting a code point.
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

//! PDF parsing: per-page text extraction and document metadata

use lopdf::{Document, Object};

use crate::error::{Error, Result};

/// Document-level PDF metadata.
///
/// Extraction is best-effort: a malformed info dictionary degrades to all
/// fields absent without failing ingestion.
#[derive(Debug, Clone, Default)]
pub struct PdfInfo {
    pub producer: Option<String>,
    pub creator: Option<String>,
    pub creation_date: Option<String>,
    pub mod_date: Option<String>,
}

/// Extracted text of one page
#[derive(Debug, Clone)]
pub struct PageText {
    /// Zero-based page index
    pub page: u32,
    /// Human-readable page label, 1-based
    pub label: String,
    /// Page text
    pub content: String,
}

/// A parsed PDF: one logical unit per page plus document metadata.
#[derive(Debug, Clone)]
pub struct ParsedPdf {
    pub pages: Vec<PageText>,
    pub total_pages: u32,
    pub info: PdfInfo,
}

/// PDF parser over lopdf with a whole-document fallback.
pub struct PdfParser;

impl PdfParser {
    /// Parse a PDF into per-page text.
    pub fn parse(filename: &str, data: &[u8]) -> Result<ParsedPdf> {
        let doc = Document::load_mem(data)
            .map_err(|e| Error::pdf_parse(filename, format!("Failed to load PDF: {e}")))?;

        let info = Self::extract_info(&doc);

        let page_numbers: Vec<u32> = doc.get_pages().keys().copied().collect();
        let total_pages = page_numbers.len() as u32;

        let mut pages = Vec::with_capacity(page_numbers.len());
        for page_number in page_numbers {
            let content = match doc.extract_text(&[page_number]) {
                Ok(text) => clean_text(&text),
                Err(e) => {
                    tracing::warn!("Text extraction failed for page {page_number} of '{filename}': {e}");
                    String::new()
                }
            };
            pages.push(PageText {
                page: page_number.saturating_sub(1),
                label: page_number.to_string(),
                content,
            });
        }

        // Some PDFs defeat per-page extraction entirely; fall back to a
        // whole-document pass treated as a single page.
        if pages.iter().all(|p| p.content.is_empty()) {
            tracing::warn!("Per-page extraction yielded nothing for '{filename}', trying whole-document pass");
            let content = pdf_extract::extract_text_from_mem(data)
                .map(|t| clean_text(&t))
                .map_err(|e| Error::pdf_parse(filename, format!("No text could be extracted: {e}")))?;

            if content.is_empty() {
                return Err(Error::pdf_parse(filename, "No text content could be extracted"));
            }

            pages = vec![PageText {
                page: 0,
                label: "1".to_string(),
                content,
            }];
        }

        Ok(ParsedPdf {
            pages,
            total_pages: total_pages.max(1),
            info,
        })
    }

    /// Read the document info dictionary. Any failure degrades to an empty
    /// metadata set.
    fn extract_info(doc: &Document) -> PdfInfo {
        let dict = doc
            .trailer
            .get(b"Info")
            .ok()
            .and_then(|obj| match obj {
                Object::Reference(id) => doc.get_dictionary(*id).ok(),
                Object::Dictionary(dict) => Some(dict),
                _ => None,
            });

        let Some(dict) = dict else {
            return PdfInfo::default();
        };

        let field = |key: &[u8]| -> Option<String> {
            dict.get(key).ok().and_then(|obj| match obj {
                Object::String(bytes, _) => {
                    let text = String::from_utf8_lossy(bytes).trim().to_string();
                    (!text.is_empty()).then_some(text)
                }
                _ => None,
            })
        };

        PdfInfo {
            producer: field(b"Producer"),
            creator: field(b"Creator"),
            creation_date: field(b"CreationDate"),
            mod_date: field(b"ModDate"),
        }
    }
}

/// Strip null bytes and collapse blank lines left behind by extraction.
fn clean_text(text: &str) -> String {
    text.replace('\0', "")
        .lines()
        .map(|l| l.trim_end())
        .filter(|l| !l.trim().is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clean_text_strips_nulls_and_blank_lines() {
        let raw = "First line\0\n\n   \nSecond line   \n";
        assert_eq!(clean_text(raw), "First line\nSecond line");
    }

    #[test]
    fn garbage_input_is_a_parse_error() {
        let err = PdfParser::parse("junk.pdf", b"not a pdf at all").unwrap_err();
        assert!(matches!(err, Error::PdfParse { .. }));
    }
}

//! Text extraction providers. A document is a list of logical pages; the
//! chunker consumes their concatenation.

use std::fs;
use std::path::Path;

use tracing::info;

use crate::error::{Error, Result, Stage};

const PAGE_BREAK: char = '\u{c}';
const PAGE_SEPARATOR: &str = "\n\n";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtractedDocument {
    pub pages: Vec<String>,
}

impl ExtractedDocument {
    pub fn from_text(text: impl Into<String>) -> Self {
        Self { pages: vec![text.into()] }
    }

    /// Split on form feeds, the page break emitted by most PDF-to-text tools.
    pub fn from_paged_text(text: &str) -> Self {
        Self { pages: text.split(PAGE_BREAK).map(str::to_string).collect() }
    }

    /// Pages joined by a blank line.
    pub fn text(&self) -> String {
        self.pages.join(PAGE_SEPARATOR)
    }

    /// Character offset of each page inside `text()`.
    pub fn page_starts(&self) -> Vec<usize> {
        let sep = PAGE_SEPARATOR.chars().count();
        let mut starts = Vec::with_capacity(self.pages.len());
        let mut offset = 0;
        for page in &self.pages {
            starts.push(offset);
            offset += page.chars().count() + sep;
        }
        starts
    }

    pub fn is_blank(&self) -> bool {
        self.pages.iter().all(|p| p.trim().is_empty())
    }
}

pub trait TextExtractor {
    fn extract(&self, path: &Path) -> Result<ExtractedDocument>;
}

/// Reads UTF-8 text, replacing invalid bytes rather than failing.
#[derive(Debug, Default)]
pub struct PlainTextExtractor;

impl TextExtractor for PlainTextExtractor {
    fn extract(&self, path: &Path) -> Result<ExtractedDocument> {
        let bytes = fs::read(path)
            .map_err(|e| Error::Ingestion(format!("cannot read {}: {}", path.display(), e)))?;
        let text = match String::from_utf8(bytes) {
            Ok(text) => text,
            Err(e) => String::from_utf8_lossy(e.as_bytes()).into_owned(),
        };
        Ok(ExtractedDocument::from_paged_text(&text))
    }
}

#[cfg(feature = "pdf")]
#[derive(Debug, Default)]
pub struct PdfExtractor;

#[cfg(feature = "pdf")]
impl TextExtractor for PdfExtractor {
    fn extract(&self, path: &Path) -> Result<ExtractedDocument> {
        if !path.is_file() {
            return Err(Error::Ingestion(format!("{} is not a readable file", path.display())));
        }
        let pages = pdf_extract::extract_text_by_pages(path).map_err(|e| Error::backend(Stage::Extraction, e))?;
        Ok(ExtractedDocument { pages })
    }
}

/// Pick an extractor by file extension.
pub fn extract_file(path: &Path) -> Result<ExtractedDocument> {
    let is_pdf = path.extension().is_some_and(|ext| ext.eq_ignore_ascii_case("pdf"));
    let doc = if is_pdf { extract_pdf(path)? } else { PlainTextExtractor.extract(path)? };
    info!(path = %path.display(), pages = doc.pages.len(), "extracted document");
    Ok(doc)
}

#[cfg(feature = "pdf")]
fn extract_pdf(path: &Path) -> Result<ExtractedDocument> {
    PdfExtractor.extract(path)
}

#[cfg(not(feature = "pdf"))]
fn extract_pdf(path: &Path) -> Result<ExtractedDocument> {
    Err(Error::backend(
        Stage::Extraction,
        anyhow::anyhow!("PDF support not enabled for {}, rebuild with --features pdf", path.display()),
    ))
}

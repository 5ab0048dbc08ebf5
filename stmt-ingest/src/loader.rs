//! PDF loading: pdf-extract for layout-ordered lines, lopdf per-page text as
//! the second extractor.
//!
//! pdf-extract places text by position, so table cells printed as separate
//! text objects still land on one line per row. lopdf emits each text object
//! on its own line, which splits rows apart, but it keeps page boundaries and
//! copes with some files pdf-extract rejects.

use std::path::Path;

use tracing::{debug, info, warn};

use crate::error::{IngestError, Result};

/// Text extraction backend
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Extractor {
    PdfExtract,
    Lopdf,
}

impl Extractor {
    pub fn name(&self) -> &'static str {
        match self {
            Extractor::PdfExtract => "pdf-extract",
            Extractor::Lopdf => "lopdf",
        }
    }

    /// The backend to try when this one's text is unusable.
    pub fn other(&self) -> Extractor {
        match self {
            Extractor::PdfExtract => Extractor::Lopdf,
            Extractor::Lopdf => Extractor::PdfExtract,
        }
    }
}

/// Extracted text of a statement, one entry per page
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Document {
    pages: Vec<String>,
    source: Option<Extractor>,
}

impl Document {
    /// Build a document from already-extracted page text.
    pub fn from_pages(pages: Vec<String>) -> Self {
        Self { pages, source: None }
    }

    /// Single-page document, handy for text fixtures.
    pub fn from_text(text: impl Into<String>) -> Self {
        Self::from_pages(vec![text.into()])
    }

    pub fn pages(&self) -> &[String] {
        &self.pages
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// Which backend produced the text; `None` for text fixtures.
    pub fn source(&self) -> Option<Extractor> {
        self.source
    }

    /// All pages joined by newlines.
    pub fn text(&self) -> String {
        self.pages.join("\n")
    }

    /// Text of the first `n` pages, where headers and account details live.
    pub fn head_text(&self, n: usize) -> String {
        self.pages
            .iter()
            .take(n)
            .map(String::as_str)
            .collect::<Vec<_>>()
            .join("\n")
    }

    pub fn is_blank(&self) -> bool {
        self.pages.iter().all(|p| p.trim().is_empty())
    }
}

/// Open a statement PDF and extract its text, pdf-extract first.
pub fn load_pdf(path: &Path) -> Result<Document> {
    let bytes = read_pdf_bytes(path)?;
    let primary = Extractor::PdfExtract;

    let doc = match extract(path, &bytes, primary) {
        Ok(doc) if !doc.is_blank() => doc,
        Ok(_) => {
            debug!("{} found no text in {}, trying {}", primary.name(), path.display(), primary.other().name());
            extract(path, &bytes, primary.other())?
        }
        Err(e) => {
            warn!("{e}; trying {}", primary.other().name());
            extract(path, &bytes, primary.other())?
        }
    };

    if doc.is_blank() {
        return Err(IngestError::NoText { path: path.to_path_buf() });
    }
    info!("{} extracted {} pages from {}", doc.source.map_or("?", |s| s.name()), doc.page_count(), path.display());
    Ok(doc)
}

/// Extract with one specific backend, no fallback.
pub fn load_pdf_with(path: &Path, extractor: Extractor) -> Result<Document> {
    let bytes = read_pdf_bytes(path)?;
    let doc = extract(path, &bytes, extractor)?;
    if doc.is_blank() {
        return Err(IngestError::NoText { path: path.to_path_buf() });
    }
    Ok(doc)
}

fn read_pdf_bytes(path: &Path) -> Result<Vec<u8>> {
    if !path.exists() {
        return Err(IngestError::FileNotFound { path: path.to_path_buf() });
    }
    let bytes = std::fs::read(path).map_err(|source| IngestError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    if !looks_like_pdf(&bytes) {
        return Err(IngestError::NotAPdf {
            path: path.to_path_buf(),
            magic: bytes.iter().take(4).copied().collect(),
        });
    }
    Ok(bytes)
}

fn looks_like_pdf(bytes: &[u8]) -> bool {
    // The header may follow a few junk bytes; readers accept it within 1 KiB.
    let head = &bytes[..bytes.len().min(1024)];
    head.windows(5).any(|w| w == b"%PDF-")
}

fn extract(path: &Path, bytes: &[u8], extractor: Extractor) -> Result<Document> {
    let pages = match extractor {
        Extractor::PdfExtract => extract_with_pdf_extract(bytes),
        Extractor::Lopdf => extract_with_lopdf(bytes),
    }
    .map_err(|detail| IngestError::CorruptPdf {
        path: path.to_path_buf(),
        detail: format!("{}: {detail}", extractor.name()),
    })?;
    Ok(Document {
        pages,
        source: Some(extractor),
    })
}

fn extract_with_pdf_extract(bytes: &[u8]) -> std::result::Result<Vec<String>, String> {
    let text = pdf_extract::extract_text_from_mem(bytes).map_err(|e| e.to_string())?;
    // pdf-extract separates pages with form feeds when it can tell them apart.
    Ok(text.split('\u{c}').map(str::to_string).collect())
}

fn extract_with_lopdf(bytes: &[u8]) -> std::result::Result<Vec<String>, String> {
    let pdf = lopdf::Document::load_mem(bytes).map_err(|e| e.to_string())?;
    let mut pages = Vec::new();
    for (page_num, _page_id) in pdf.get_pages() {
        match pdf.extract_text(&[page_num]) {
            Ok(text) => pages.push(text),
            Err(e) => {
                warn!("page {page_num}: text extraction failed: {e}");
                pages.push(String::new());
            }
        }
    }
    Ok(pages)
}

#[cfg(test)]
mod tests {
    use super::*;
    use lopdf::content::{Content, Operation};
    use lopdf::{dictionary, Object, Stream, StringFormat};
    use std::io::Write;

    /// One text object per `(x, y, text)` cell, Helvetica 9pt.
    fn write_pdf(path: &Path, pages: &[Vec<(i64, i64, &str)>]) {
        let mut doc = lopdf::Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        let font_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Helvetica",
            "Encoding" => "WinAnsiEncoding",
        });
        let resources_id = doc.add_object(dictionary! { "Font" => dictionary! { "F1" => font_id } });
        let mut kids = Vec::new();
        for cells in pages {
            let mut operations = Vec::new();
            for &(x, y, text) in cells {
                operations.extend([
                    Operation::new("BT", vec![]),
                    Operation::new("Tf", vec!["F1".into(), 9i64.into()]),
                    Operation::new("Td", vec![x.into(), y.into()]),
                    Operation::new("Tj", vec![Object::String(text.as_bytes().to_vec(), StringFormat::Literal)]),
                    Operation::new("ET", vec![]),
                ]);
            }
            let content = Content { operations }.encode().unwrap();
            let content_id = doc.add_object(Stream::new(dictionary! {}, content));
            let page_id = doc.add_object(dictionary! {
                "Type" => "Page",
                "Parent" => pages_id,
                "Contents" => content_id,
                "Resources" => resources_id,
                "MediaBox" => vec![0i64.into(), 0i64.into(), 595i64.into(), 842i64.into()],
            });
            kids.push(Object::from(page_id));
        }
        let count = kids.len() as i64;
        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! { "Type" => "Pages", "Kids" => kids, "Count" => count }),
        );
        let catalog_id = doc.add_object(dictionary! { "Type" => "Catalog", "Pages" => pages_id });
        doc.trailer.set("Root", catalog_id);
        doc.save(path).unwrap();
    }

    #[test]
    fn test_missing_file() {
        let err = load_pdf(Path::new("/definitely/not/here.pdf")).unwrap_err();
        assert!(matches!(err, IngestError::FileNotFound { .. }));
    }

    #[test]
    fn test_rejects_non_pdf() {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        f.write_all(b"Date,Description,Amount\n").unwrap();
        let err = load_pdf(f.path()).unwrap_err();
        assert!(matches!(err, IngestError::NotAPdf { .. }));
    }

    #[test]
    fn test_head_text_limits_pages() {
        let doc = Document::from_pages(vec!["one".into(), "two".into(), "three".into()]);
        assert_eq!(doc.head_text(2), "one\ntwo");
        assert_eq!(doc.page_count(), 3);
        assert!(!doc.is_blank());
        assert!(Document::from_pages(vec!["  ".into()]).is_blank());
        assert_eq!(doc.source(), None);
    }

    #[test]
    fn test_blank_pdf_has_no_text() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("blank.pdf");
        write_pdf(&path, &[vec![]]);
        let err = load_pdf(&path).unwrap_err();
        assert!(matches!(err, IngestError::NoText { .. }), "{err}");
    }

    #[test]
    fn test_cells_on_one_row_share_a_line() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("row.pdf");
        write_pdf(
            &path,
            &[vec![(40, 700, "01/04/23"), (100, 700, "ATM WDL"), (300, 700, "1,000.00"), (400, 700, "49,000.00")]],
        );
        let doc = load_pdf(&path).unwrap();
        assert_eq!(doc.source(), Some(Extractor::PdfExtract));
        let line = doc.text().lines().find(|l| l.contains("ATM WDL")).unwrap().to_string();
        assert!(line.contains("01/04/23"), "{line:?}");
        assert!(line.contains("49,000.00"), "{line:?}");
    }

    #[test]
    fn test_lopdf_keeps_pages_apart() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("two.pdf");
        write_pdf(&path, &[vec![(40, 700, "FIRST PAGE")], vec![(40, 700, "SECOND PAGE")]]);
        let doc = load_pdf_with(&path, Extractor::Lopdf).unwrap();
        assert_eq!(doc.source(), Some(Extractor::Lopdf));
        assert_eq!(doc.page_count(), 2);
        assert!(doc.pages()[0].contains("FIRST PAGE"));
        assert!(doc.pages()[1].contains("SECOND PAGE"));
    }
}

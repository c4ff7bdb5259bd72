//! Resume document text extraction: PDF, DOCX and plain text.

use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use regex::Regex;
use tracing::info;

use crate::errors::ScoutError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    Pdf,
    Docx,
    PlainText,
}

impl DocumentKind {
    /// Detects the document kind from the file extension. Unknown extensions are read as text.
    pub fn from_path(path: &Path) -> Self {
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase());
        match extension.as_deref() {
            Some("pdf") => DocumentKind::Pdf,
            Some("docx") => DocumentKind::Docx,
            _ => DocumentKind::PlainText,
        }
    }
}

/// Reads a resume file and returns its text, rejecting documents with no usable text.
pub fn extract_resume_text(path: &Path) -> Result<String, ScoutError> {
    let kind = DocumentKind::from_path(path);
    let text = match kind {
        DocumentKind::Pdf => pdf_extract::extract_text(path).map_err(|e| {
            ScoutError::ExtractionInput(format!("cannot read PDF {}: {e}", path.display()))
        })?,
        DocumentKind::Docx => docx_text(path)?,
        DocumentKind::PlainText => std::fs::read_to_string(path).map_err(|e| {
            ScoutError::ExtractionInput(format!("cannot read {}: {e}", path.display()))
        })?,
    };

    let text = ensure_usable(&text)?;
    info!("Extracted {} characters from {:?} resume", text.chars().count(), kind);
    Ok(text)
}

/// Extracts the resume on the blocking pool. A panic inside a document parser
/// is reported as an extraction error instead of unwinding through the caller.
pub async fn load_resume(path: PathBuf) -> Result<String, ScoutError> {
    let display = path.display().to_string();
    off_runtime(&display, move || extract_resume_text(&path)).await
}

async fn off_runtime<F>(display: &str, extract: F) -> Result<String, ScoutError>
where
    F: FnOnce() -> Result<String, ScoutError> + Send + 'static,
{
    tokio::task::spawn_blocking(extract).await.map_err(|e| {
        ScoutError::ExtractionInput(format!("document parser aborted on {display}: {e}"))
    })?
}

/// Normalises extracted text; empty or whitespace-only text is an extraction error.
pub fn ensure_usable(text: &str) -> Result<String, ScoutError> {
    let lines: Vec<&str> = text.lines().map(str::trim_end).collect();
    let normalised = lines.join("\n").trim().to_string();
    if normalised.is_empty() {
        return Err(ScoutError::ExtractionInput(
            "no text could be extracted from the resume".to_string(),
        ));
    }
    Ok(normalised)
}

fn docx_text(path: &Path) -> Result<String, ScoutError> {
    let unreadable =
        |e: &dyn std::fmt::Display| ScoutError::ExtractionInput(format!("cannot read DOCX {}: {e}", path.display()));

    let file = File::open(path).map_err(|e| unreadable(&e))?;
    let mut archive = zip::ZipArchive::new(file).map_err(|e| unreadable(&e))?;
    let mut xml = String::new();
    archive
        .by_name("word/document.xml")
        .map_err(|e| unreadable(&e))?
        .read_to_string(&mut xml)
        .map_err(|e| unreadable(&e))?;
    Ok(document_xml_text(&xml))
}

/// Flattens WordprocessingML to text: one line per paragraph, tags dropped, entities decoded.
pub fn document_xml_text(xml: &str) -> String {
    static BREAKS: OnceLock<Regex> = OnceLock::new();
    static TABS: OnceLock<Regex> = OnceLock::new();
    static TAGS: OnceLock<Regex> = OnceLock::new();

    let breaks = BREAKS
        .get_or_init(|| Regex::new(r"</w:p>|<w:br\s*/>|<w:cr\s*/>").expect("break regex is valid"));
    let tabs = TABS.get_or_init(|| Regex::new(r"<w:tab\s*/>").expect("tab regex is valid"));
    let tags = TAGS.get_or_init(|| Regex::new(r"<[^>]*>").expect("tag regex is valid"));

    let text = breaks.replace_all(xml, "\n");
    let text = tabs.replace_all(&text, "\t");
    let text = tags.replace_all(&text, "");
    decode_entities(&text)
}

fn decode_entities(text: &str) -> String {
    text.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&apos;", "'")
        .replace("&amp;", "&")
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    fn write_docx(dir: &Path, body: &str) -> std::path::PathBuf {
        let path = dir.join("resume.docx");
        let file = File::create(&path).unwrap();
        let mut zip = zip::ZipWriter::new(file);
        zip.start_file("word/document.xml", zip::write::FileOptions::default())
            .unwrap();
        zip.write_all(body.as_bytes()).unwrap();
        zip.finish().unwrap();
        path
    }

    #[test]
    fn test_document_kind_from_extension() {
        assert_eq!(DocumentKind::from_path(Path::new("cv.PDF")), DocumentKind::Pdf);
        assert_eq!(DocumentKind::from_path(Path::new("cv.docx")), DocumentKind::Docx);
        assert_eq!(DocumentKind::from_path(Path::new("cv.md")), DocumentKind::PlainText);
        assert_eq!(DocumentKind::from_path(Path::new("cv")), DocumentKind::PlainText);
    }

    #[test]
    fn test_plain_text_resume_is_read() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("resume.txt");
        std::fs::write(&path, "Jane Doe\nGo, PostgreSQL   \n\n").unwrap();
        assert_eq!(extract_resume_text(&path).unwrap(), "Jane Doe\nGo, PostgreSQL");
    }

    #[test]
    fn test_blank_resume_is_an_extraction_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("resume.txt");
        std::fs::write(&path, " \n\t\n").unwrap();
        assert!(matches!(extract_resume_text(&path), Err(ScoutError::ExtractionInput(_))));
    }

    #[test]
    fn test_missing_file_is_an_extraction_error() {
        let err = extract_resume_text(Path::new("/nonexistent/resume.txt")).unwrap_err();
        assert!(matches!(err, ScoutError::ExtractionInput(m) if m.contains("cannot read")));
    }

    #[test]
    fn test_docx_paragraphs_become_lines() {
        let dir = tempfile::tempdir().unwrap();
        let xml = r#"<w:document><w:body><w:p><w:r><w:t>Jane Doe</w:t></w:r></w:p><w:p><w:r><w:t>Go &amp; PostgreSQL</w:t></w:r></w:p></w:body></w:document>"#;
        let path = write_docx(dir.path(), xml);
        assert_eq!(extract_resume_text(&path).unwrap(), "Jane Doe\nGo & PostgreSQL");
    }

    #[test]
    fn test_docx_without_document_part_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.docx");
        std::fs::write(&path, b"not a zip archive").unwrap();
        assert!(matches!(extract_resume_text(&path), Err(ScoutError::ExtractionInput(_))));
    }

    #[tokio::test]
    async fn test_load_resume_reads_off_runtime() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("resume.txt");
        std::fs::write(&path, "Jane Doe\nGo").unwrap();
        assert_eq!(load_resume(path).await.unwrap(), "Jane Doe\nGo");
    }

    #[tokio::test]
    async fn test_parser_panic_becomes_extraction_error() {
        let err = off_runtime("cv.pdf", || panic!("malformed xref table"))
            .await
            .unwrap_err();
        assert!(matches!(err, ScoutError::ExtractionInput(m) if m.contains("cv.pdf")));
    }

    #[test]
    fn test_entities_decode_without_double_unescaping() {
        assert_eq!(decode_entities("&amp;lt;b&amp;gt;"), "&lt;b&gt;");
    }
}

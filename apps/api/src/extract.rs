//! Raw text extraction from uploaded documents.
//!
//! PDF and DOCX only. Legacy binary `.doc` is rejected outright rather than
//! half-parsed, and a document that yields no text at all is an error the
//! caller can present, not an empty pipeline run.

use std::io::Read;

use quick_xml::events::Event;
use quick_xml::Reader;
use thiserror::Error;
use tracing::debug;

pub const PDF_MIME: &str = "application/pdf";
pub const DOCX_MIME: &str =
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document";
const LEGACY_DOC_MIME: &str = "application/msword";

#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("unsupported document format: {0}")]
    UnsupportedFormat(String),
    #[error("document contains no extractable text")]
    EmptyDocument,
    #[error("document does not permit text extraction")]
    ExtractionDenied,
    #[error("document could not be parsed: {0}")]
    Malformed(String),
}

/// Dispatches on the declared content type, falling back to the filename
/// extension when the client sent a generic type.
pub fn extract_text(
    bytes: &[u8],
    content_type: Option<&str>,
    filename: Option<&str>,
) -> Result<String, ExtractError> {
    let kind = detect(content_type, filename)?;
    debug!(?kind, size = bytes.len(), "extracting document text");
    let text = match kind {
        DocumentKind::Pdf => pdf_text(bytes)?,
        DocumentKind::Docx => docx_text(bytes)?,
    };
    if text.trim().is_empty() {
        return Err(ExtractError::EmptyDocument);
    }
    Ok(text)
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum DocumentKind {
    Pdf,
    Docx,
}

fn detect(
    content_type: Option<&str>,
    filename: Option<&str>,
) -> Result<DocumentKind, ExtractError> {
    let declared = content_type.unwrap_or("").to_ascii_lowercase();
    let declared = declared.split(';').next().unwrap_or("").trim().to_string();
    let extension = filename
        .and_then(|f| f.rsplit('.').next())
        .unwrap_or("")
        .to_ascii_lowercase();

    if declared == PDF_MIME || extension == "pdf" {
        return Ok(DocumentKind::Pdf);
    }
    if declared == DOCX_MIME || extension == "docx" {
        return Ok(DocumentKind::Docx);
    }
    if declared == LEGACY_DOC_MIME || extension == "doc" {
        return Err(ExtractError::UnsupportedFormat(
            "legacy .doc is not supported, convert to .docx or PDF".into(),
        ));
    }
    Err(ExtractError::UnsupportedFormat(if declared.is_empty() {
        "unknown".into()
    } else {
        declared
    }))
}

fn pdf_text(bytes: &[u8]) -> Result<String, ExtractError> {
    pdf_extract::extract_text_from_mem(bytes).map_err(|e| {
        let message = e.to_string();
        if message.to_ascii_lowercase().contains("encrypt") {
            ExtractError::ExtractionDenied
        } else {
            ExtractError::Malformed(message)
        }
    })
}

/// A DOCX is a zip; the body text lives in `word/document.xml`. Text nodes
/// are concatenated, with a newline per closed paragraph.
fn docx_text(bytes: &[u8]) -> Result<String, ExtractError> {
    let cursor = std::io::Cursor::new(bytes);
    let mut archive =
        zip::ZipArchive::new(cursor).map_err(|e| ExtractError::Malformed(e.to_string()))?;
    let mut xml = String::new();
    archive
        .by_name("word/document.xml")
        .map_err(|e| ExtractError::Malformed(e.to_string()))?
        .read_to_string(&mut xml)
        .map_err(|e| ExtractError::Malformed(e.to_string()))?;

    let mut reader = Reader::from_str(&xml);
    let mut text = String::new();
    loop {
        match reader.read_event() {
            Ok(Event::Text(t)) => {
                let chunk = t
                    .unescape()
                    .map_err(|e| ExtractError::Malformed(e.to_string()))?;
                text.push_str(&chunk);
            }
            Ok(Event::End(end)) if end.name().as_ref() == b"w:p" => text.push('\n'),
            Ok(Event::Eof) => break,
            Ok(_) => {}
            Err(e) => return Err(ExtractError::Malformed(e.to_string())),
        }
    }
    Ok(text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn docx_with_body(xml_body: &str) -> Vec<u8> {
        let mut buf = std::io::Cursor::new(Vec::new());
        {
            let mut writer = zip::ZipWriter::new(&mut buf);
            let options = zip::write::FileOptions::default();
            writer.start_file("word/document.xml", options).unwrap();
            writer
                .write_all(
                    format!(
                        "<?xml version=\"1.0\"?><w:document><w:body>{xml_body}</w:body></w:document>"
                    )
                    .as_bytes(),
                )
                .unwrap();
            writer.finish().unwrap();
        }
        buf.into_inner()
    }

    #[test]
    fn test_docx_paragraphs_become_lines() {
        let bytes = docx_with_body(
            "<w:p><w:r><w:t>Ada Lovelace</w:t></w:r></w:p><w:p><w:r><w:t>Engineer</w:t></w:r></w:p>",
        );
        let text = extract_text(&bytes, Some(DOCX_MIME), None).unwrap();
        assert_eq!(text, "Ada Lovelace\nEngineer\n");
    }

    #[test]
    fn test_docx_entities_unescaped() {
        let bytes = docx_with_body("<w:p><w:r><w:t>R&amp;D lead</w:t></w:r></w:p>");
        let text = extract_text(&bytes, None, Some("resume.docx")).unwrap();
        assert_eq!(text.trim(), "R&D lead");
    }

    #[test]
    fn test_empty_docx_is_empty_document() {
        let bytes = docx_with_body("<w:p></w:p>");
        let err = extract_text(&bytes, Some(DOCX_MIME), None).unwrap_err();
        assert!(matches!(err, ExtractError::EmptyDocument));
    }

    #[test]
    fn test_legacy_doc_rejected() {
        let err = extract_text(b"\xd0\xcf\x11\xe0", Some("application/msword"), None).unwrap_err();
        assert!(matches!(err, ExtractError::UnsupportedFormat(_)));
        let err = extract_text(b"x", None, Some("resume.doc")).unwrap_err();
        assert!(matches!(err, ExtractError::UnsupportedFormat(_)));
    }

    #[test]
    fn test_unknown_mime_rejected() {
        let err = extract_text(b"hello", Some("text/plain"), Some("resume.txt")).unwrap_err();
        assert!(matches!(err, ExtractError::UnsupportedFormat(_)));
    }

    #[test]
    fn test_content_type_parameters_ignored() {
        let bytes = docx_with_body("<w:p><w:r><w:t>x y z text</w:t></w:r></w:p>");
        let mime = format!("{DOCX_MIME}; charset=utf-8");
        assert!(extract_text(&bytes, Some(&mime), None).is_ok());
    }

    #[test]
    fn test_garbage_pdf_is_malformed_not_panic() {
        let err = extract_text(b"not a pdf at all", Some(PDF_MIME), None).unwrap_err();
        assert!(matches!(
            err,
            ExtractError::Malformed(_) | ExtractError::EmptyDocument
        ));
    }
}

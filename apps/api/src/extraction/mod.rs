//! Resume text extraction from uploaded PDF / DOCX bytes.
//!
//! Every failure degrades to an empty string; callers decide how to report it.

use std::io::{Cursor, Read};
use std::panic;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentFormat {
    Pdf,
    Docx,
    Unknown,
}

impl DocumentFormat {
    /// Format implied by the file extension, if it is one we accept.
    pub fn from_filename(filename: &str) -> Option<Self> {
        let lower = filename.to_lowercase();
        if lower.ends_with(".pdf") {
            Some(DocumentFormat::Pdf)
        } else if lower.ends_with(".docx") {
            Some(DocumentFormat::Docx)
        } else {
            None
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DocumentFormat::Pdf => "pdf",
            DocumentFormat::Docx => "docx",
            DocumentFormat::Unknown => "unknown",
        }
    }
}

/// Extracts text, dispatching on the filename extension. Unknown extensions try
/// PDF first, then DOCX.
pub fn extract_text(bytes: &[u8], filename: &str) -> (String, DocumentFormat) {
    match DocumentFormat::from_filename(filename) {
        Some(DocumentFormat::Pdf) => (extract_pdf_text(bytes), DocumentFormat::Pdf),
        Some(DocumentFormat::Docx) => (extract_docx_text(bytes), DocumentFormat::Docx),
        _ => {
            let text = extract_pdf_text(bytes);
            if !text.is_empty() {
                return (text, DocumentFormat::Pdf);
            }
            let text = extract_docx_text(bytes);
            if !text.is_empty() {
                return (text, DocumentFormat::Docx);
            }
            (String::new(), DocumentFormat::Unknown)
        }
    }
}

pub fn extract_pdf_text(bytes: &[u8]) -> String {
    // pdf-extract panics on some malformed inputs
    match panic::catch_unwind(|| pdf_extract::extract_text_from_mem(bytes)) {
        Ok(Ok(text)) => clean_text(&text),
        Ok(Err(e)) => {
            warn!("PDF extraction failed: {e}");
            String::new()
        }
        Err(_) => {
            warn!("PDF extraction panicked");
            String::new()
        }
    }
}

static PARAGRAPH_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)<w:p[ >].*?</w:p>|<w:p/>").unwrap());
static RUN_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?s)<w:t(?:\s[^>]*)?>(.*?)</w:t>|<w:tab/>|<w:br/>"#).unwrap()
});

pub fn extract_docx_text(bytes: &[u8]) -> String {
    match read_docx_paragraphs(bytes) {
        Ok(paragraphs) => {
            debug!(paragraphs = paragraphs.len(), "DOCX parsed");
            clean_text(&paragraphs.join("\n"))
        }
        Err(e) => {
            warn!("DOCX extraction failed: {e}");
            String::new()
        }
    }
}

fn read_docx_paragraphs(bytes: &[u8]) -> anyhow::Result<Vec<String>> {
    let mut archive = zip::ZipArchive::new(Cursor::new(bytes))?;
    let mut xml = String::new();
    archive.by_name("word/document.xml")?.read_to_string(&mut xml)?;

    let paragraphs = PARAGRAPH_RE
        .find_iter(&xml)
        .map(|para| {
            RUN_RE
                .captures_iter(para.as_str())
                .map(|caps| match caps.get(1) {
                    Some(text) => unescape_xml(text.as_str()),
                    None => " ".to_string(),
                })
                .collect::<String>()
        })
        .filter(|text| !text.trim().is_empty())
        .collect();

    Ok(paragraphs)
}

static NUMERIC_ENTITY_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"&#(?:[xX]([0-9a-fA-F]+)|([0-9]+));").unwrap());

fn unescape_xml(text: &str) -> String {
    // numeric references first so an escaped `&amp;#38;` stays literal
    let text = NUMERIC_ENTITY_RE.replace_all(text, |caps: &regex::Captures| {
        let code = match (caps.get(1), caps.get(2)) {
            (Some(hex), _) => u32::from_str_radix(hex.as_str(), 16).ok(),
            (_, Some(dec)) => dec.as_str().parse::<u32>().ok(),
            _ => None,
        };
        match code.and_then(char::from_u32) {
            Some(c) => c.to_string(),
            None => caps[0].to_string(),
        }
    });
    text.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&apos;", "'")
        .replace("&amp;", "&")
}

static BLANK_LINES_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\n\s*\n").unwrap());
static SPACES_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r" +").unwrap());

/// Collapses blank-line runs and space runs, then trims.
pub fn clean_text(text: &str) -> String {
    let text = BLANK_LINES_RE.replace_all(text, " ");
    let text = SPACES_RE.replace_all(&text, " ");
    text.trim().to_string()
}

#[cfg(test)]
pub(crate) mod fixtures {
    use std::io::{Cursor, Write};

    use zip::write::SimpleFileOptions;

    /// Builds a minimal DOCX archive containing the given paragraphs.
    pub fn docx_with_paragraphs(paragraphs: &[&str]) -> Vec<u8> {
        let body: String = paragraphs
            .iter()
            .map(|p| format!(r#"<w:p><w:r><w:t xml:space="preserve">{p}</w:t></w:r></w:p>"#))
            .collect();
        let xml = format!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main"><w:body>{body}</w:body></w:document>"#
        );

        let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
        let options =
            SimpleFileOptions::default().compression_method(zip::CompressionMethod::Stored);
        writer.start_file("word/document.xml", options).unwrap();
        writer.write_all(xml.as_bytes()).unwrap();
        writer.finish().unwrap().into_inner()
    }
}

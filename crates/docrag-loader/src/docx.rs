//! Plain-text extraction for Word documents.
//!
//! A `.docx` file is a zip archive whose body lives in
//! `word/document.xml`. Paragraph closings become newlines, remaining
//! markup is stripped, and the basic XML entities are unescaped.

use anyhow::{Context, Result};
use regex::Regex;
use std::fs::File;
use std::io::Read;
use std::path::Path;

pub fn extract_text(path: &Path) -> Result<String> {
    let file = File::open(path)
        .with_context(|| format!("failed to open {}", path.display()))?;
    let mut archive = zip::ZipArchive::new(file)
        .with_context(|| format!("{} is not a valid docx archive", path.display()))?;
    let mut xml = String::new();
    archive
        .by_name("word/document.xml")
        .context("docx archive has no word/document.xml")?
        .read_to_string(&mut xml)
        .context("word/document.xml is not valid UTF-8")?;
    plaintext_from_document_xml(&xml)
}

/// Reduce WordprocessingML to the paragraph text, one line per
/// paragraph, matching what a plain-text export of the document reads.
pub fn plaintext_from_document_xml(xml: &str) -> Result<String> {
    let breaks = Regex::new(r"</w:p>|<w:br\s*/>")?;
    let tags = Regex::new(r"<[^>]*>")?;

    let with_newlines = breaks.replace_all(xml, "\n");
    let stripped = tags.replace_all(&with_newlines, "");
    let unescaped = stripped
        .replace("&amp;", "&")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&apos;", "'");

    Ok(unescaped.trim_end().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn paragraphs_become_lines() {
        let xml = r#"<?xml version="1.0"?><w:document><w:body>
<w:p><w:r><w:t>First paragraph.</w:t></w:r></w:p>
<w:p><w:r><w:t>Second </w:t></w:r><w:r><w:t>paragraph.</w:t></w:r></w:p>
</w:body></w:document>"#;
        let text = plaintext_from_document_xml(xml).expect("extract");
        assert!(text.contains("First paragraph."));
        assert!(text.contains("Second paragraph."));
        let first = text.lines().position(|l| l.contains("First"));
        let second = text.lines().position(|l| l.contains("Second"));
        assert!(first < second);
    }

    #[test]
    fn entities_are_unescaped() {
        let xml = "<w:p><w:t>Tom &amp; Jerry &lt;3</w:t></w:p>";
        let text = plaintext_from_document_xml(xml).expect("extract");
        assert_eq!(text, "Tom & Jerry <3");
    }
}

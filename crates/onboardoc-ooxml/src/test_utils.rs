//! Shared test fixtures for onboardoc crates
//!
//! [`DocxFixture`] builds small but well-formed DOCX packages in memory, with
//! optional header and footer parts wired through the document
//! relationships the way Word writes them.

use std::io::{Cursor, Write};

use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::archive::OoxmlArchive;
use crate::error::{OoxmlError, Result};

/// WordprocessingML main namespace
pub const W_NS: &str = "http://schemas.openxmlformats.org/wordprocessingml/2006/main";
/// Office document relationships namespace
pub const R_NS: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships";

const STYLES_XML: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:styles xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main"><w:style w:type="paragraph" w:default="1" w:styleId="Normal"><w:name w:val="Normal"/></w:style></w:styles>"#;

/// In-memory DOCX builder
///
/// # Example
/// ```
/// use onboardoc_ooxml::test_utils::DocxFixture;
///
/// let docx = DocxFixture::new()
///     .paragraph("Welcome {{GREETING}}")
///     .footer("<w:p><w:r><w:t>{{GMAIL}}</w:t></w:r></w:p>")
///     .build()?;
/// assert!(!docx.is_empty());
/// # Ok::<(), onboardoc_ooxml::OoxmlError>(())
/// ```
#[derive(Debug, Clone, Default)]
pub struct DocxFixture {
    body: String,
    headers: Vec<String>,
    footers: Vec<String>,
    extra: Vec<(String, Vec<u8>)>,
}

impl DocxFixture {
    /// Empty document
    pub fn new() -> Self {
        Self::default()
    }

    /// Append raw body XML (paragraphs, tables)
    pub fn body(mut self, xml: &str) -> Self {
        self.body.push_str(xml);
        self
    }

    /// Append a single-run paragraph holding `text`
    pub fn paragraph(self, text: &str) -> Self {
        let xml = paragraph(text);
        self.body(&xml)
    }

    /// Add a header part with the given inner XML
    pub fn header(mut self, xml: &str) -> Self {
        self.headers.push(xml.to_string());
        self
    }

    /// Add a footer part with the given inner XML
    pub fn footer(mut self, xml: &str) -> Self {
        self.footers.push(xml.to_string());
        self
    }

    /// Add an arbitrary extra entry
    pub fn part(mut self, path: &str, contents: impl Into<Vec<u8>>) -> Self {
        self.extra.push((path.to_string(), contents.into()));
        self
    }

    /// Zip the package
    pub fn build(&self) -> Result<Vec<u8>> {
        let mut buffer = Cursor::new(Vec::new());
        let mut zip = ZipWriter::new(&mut buffer);
        let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

        let mut entries: Vec<(String, Vec<u8>)> = vec![
            ("[Content_Types].xml".to_string(), self.content_types().into_bytes()),
            ("_rels/.rels".to_string(), package_rels().into_bytes()),
            (
                "word/_rels/document.xml.rels".to_string(),
                self.document_rels().into_bytes(),
            ),
            ("word/document.xml".to_string(), self.document_xml().into_bytes()),
            ("word/styles.xml".to_string(), STYLES_XML.as_bytes().to_vec()),
        ];

        for (i, inner) in self.headers.iter().enumerate() {
            entries.push((
                format!("word/header{}.xml", i + 1),
                story_part("w:hdr", inner).into_bytes(),
            ));
        }
        for (i, inner) in self.footers.iter().enumerate() {
            entries.push((
                format!("word/footer{}.xml", i + 1),
                story_part("w:ftr", inner).into_bytes(),
            ));
        }
        entries.extend(self.extra.iter().cloned());

        for (path, contents) in entries {
            zip.start_file(path, options)?;
            zip.write_all(&contents)?;
        }

        zip.finish()?;
        Ok(buffer.into_inner())
    }

    fn content_types(&self) -> String {
        let mut overrides = String::from(
            r#"<Override PartName="/word/document.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml"/><Override PartName="/word/styles.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.styles+xml"/>"#,
        );
        for i in 1..=self.headers.len() {
            overrides.push_str(&format!(
                r#"<Override PartName="/word/header{}.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.header+xml"/>"#,
                i
            ));
        }
        for i in 1..=self.footers.len() {
            overrides.push_str(&format!(
                r#"<Override PartName="/word/footer{}.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.footer+xml"/>"#,
                i
            ));
        }

        format!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/><Default Extension="xml" ContentType="application/xml"/>{}</Types>"#,
            overrides
        )
    }

    fn document_rels(&self) -> String {
        let mut rels = String::from(
            r#"<Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/styles" Target="styles.xml"/>"#,
        );
        for (id, target, kind) in self.story_relationships() {
            rels.push_str(&format!(
                r#"<Relationship Id="{}" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/{}" Target="{}"/>"#,
                id, kind, target
            ));
        }

        format!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">{}</Relationships>"#,
            rels
        )
    }

    fn document_xml(&self) -> String {
        let mut sect = String::new();
        for (id, _, kind) in self.story_relationships() {
            sect.push_str(&format!(
                r#"<w:{}Reference w:type="default" r:id="{}"/>"#,
                kind, id
            ));
        }

        format!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:document xmlns:w="{}" xmlns:r="{}"><w:body>{}<w:sectPr>{}</w:sectPr></w:body></w:document>"#,
            W_NS, R_NS, self.body, sect
        )
    }

    /// (relationship id, target, kind) for every header and footer
    fn story_relationships(&self) -> Vec<(String, String, &'static str)> {
        let headers = (1..=self.headers.len()).map(|i| ("header", i));
        let footers = (1..=self.footers.len()).map(|i| ("footer", i));

        headers
            .chain(footers)
            .enumerate()
            .map(|(n, (kind, i))| {
                (
                    format!("rId{}", n + 10),
                    format!("{}{}.xml", kind, i),
                    kind,
                )
            })
            .collect()
    }
}

/// A single-run paragraph holding `text` (escaped)
pub fn paragraph(text: &str) -> String {
    let space = if text.starts_with(' ') || text.ends_with(' ') {
        r#" xml:space="preserve""#
    } else {
        ""
    };
    format!("<w:p><w:r><w:t{}>{}</w:t></w:r></w:p>", space, escape(text))
}

/// Read one entry of a DOCX as UTF-8 text
pub fn extract_part(docx: &[u8], path: &str) -> Result<String> {
    OoxmlArchive::from_bytes(docx)?
        .get_string(path)
        .ok_or_else(|| OoxmlError::MissingFile(path.to_string()))
}

fn package_rels() -> String {
    r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="word/document.xml"/></Relationships>"#
        .to_string()
}

fn story_part(root: &str, inner: &str) -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<{} xmlns:w="{}" xmlns:r="{}">{}</{}>"#,
        root, W_NS, R_NS, inner, root
    )
}

fn escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

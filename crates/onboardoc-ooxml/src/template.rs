//! Template documents and placeholder filling
//!
//! A [`TemplateDocument`] is a decoded working copy of a DOCX template. It
//! exposes every text-bearing part of the package (the main document,
//! every header and every footer) as a [`Region`], and fills placeholder
//! tokens across all of them.
//!
//! # Example
//!
//! ```no_run
//! use onboardoc_ooxml::{PlaceholderMap, TemplateDocument};
//!
//! let template = std::fs::read("designer.docx")?;
//! let mut doc = TemplateDocument::from_bytes(&template)?;
//!
//! let map = PlaceholderMap::new().with("{{GREETING}}", "Mat,");
//! let report = doc.fill(&map);
//! println!("{} paragraphs rewritten", report.paragraphs_rewritten);
//!
//! let filled = doc.to_bytes()?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

use std::fmt;
use std::path::Path;

use serde::Serialize;
use tracing::debug;

use crate::archive::{OoxmlArchive, DEFAULT_DOCUMENT_PATH, PACKAGE_RELS_PATH};
use crate::error::{OoxmlError, Result};
use crate::paragraph::{fill_paragraph, paragraph_text};
use crate::placeholder::{find_placeholders, PlaceholderMap};
use crate::relationships::{rels_path_for, resolve_target, Relationships};
use crate::xml::{self, XmlElement, XmlNode};

/// Kind of text-bearing part
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RegionKind {
    /// Main document body
    Body,
    /// A header part
    Header,
    /// A footer part
    Footer,
}

impl fmt::Display for RegionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RegionKind::Body => "body",
            RegionKind::Header => "header",
            RegionKind::Footer => "footer",
        };
        f.write_str(name)
    }
}

/// One parsed part of the document
#[derive(Debug, Clone)]
pub struct Region {
    kind: RegionKind,
    path: String,
    nodes: Vec<XmlNode>,
    modified: bool,
}

/// Text of one table: rows of cells, each cell's paragraphs joined by `\n`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TableText {
    /// Rows of cell texts
    pub rows: Vec<Vec<String>>,
}

/// A placeholder-shaped token found in a region
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlaceholderHit {
    /// Region kind
    pub region: RegionKind,
    /// Part path within the package
    pub path: String,
    /// The token, delimiters included
    pub token: String,
}

/// Outcome of a fill pass
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FillReport {
    /// Paragraphs rebuilt because they contained at least one token
    pub paragraphs_rewritten: usize,
    /// Replacement count per token, in the map's declaration order
    pub replacements: Vec<(String, usize)>,
}

impl FillReport {
    fn new(map: &PlaceholderMap) -> Self {
        Self {
            paragraphs_rewritten: 0,
            replacements: map.tokens().map(|t| (t.to_string(), 0)).collect(),
        }
    }

    /// Number of times a token was replaced
    pub fn count(&self, token: &str) -> usize {
        self.replacements
            .iter()
            .find(|(t, _)| t == token)
            .map(|(_, n)| *n)
            .unwrap_or(0)
    }

    /// Total replacements across all tokens
    pub fn total(&self) -> usize {
        self.replacements.iter().map(|(_, n)| n).sum()
    }

    /// Tokens that were never found
    pub fn unused_tokens(&self) -> impl Iterator<Item = &str> {
        self.replacements
            .iter()
            .filter(|(_, n)| *n == 0)
            .map(|(t, _)| t.as_str())
    }
}

impl Region {
    fn load(archive: &OoxmlArchive, kind: RegionKind, path: String) -> Result<Self> {
        let nodes = xml::parse(archive.require(&path)?)?;
        Ok(Self {
            kind,
            path,
            nodes,
            modified: false,
        })
    }

    /// Region kind
    pub fn kind(&self) -> RegionKind {
        self.kind
    }

    /// Part path within the package
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Whether a fill pass rewrote anything in this region
    pub fn is_modified(&self) -> bool {
        self.modified
    }

    /// Logical text of every paragraph, in document order
    pub fn paragraph_texts(&self) -> Vec<String> {
        let mut texts = Vec::new();
        visit_paragraphs(&self.nodes, &mut |p| texts.push(paragraph_text(p)));
        texts
    }

    /// Tables in document order; nested tables are folded into their cell's text
    pub fn tables(&self) -> Vec<TableText> {
        let mut tables = Vec::new();
        collect_tables(&self.nodes, &mut tables);
        tables
    }

    /// Serialized XML of the region
    pub fn to_xml(&self) -> Result<Vec<u8>> {
        xml::write(&self.nodes)
    }

    fn fill(&mut self, map: &PlaceholderMap, report: &mut FillReport) {
        let mut rewritten = 0;
        visit_paragraphs_mut(&mut self.nodes, &mut |p| {
            if let Some(substitution) = fill_paragraph(p, map) {
                rewritten += 1;
                for (slot, n) in report.replacements.iter_mut().zip(&substitution.counts) {
                    slot.1 += n;
                }
            }
        });

        if rewritten > 0 {
            debug!(
                part = %self.path,
                region = %self.kind,
                paragraphs = rewritten,
                "rewrote paragraphs"
            );
            self.modified = true;
            report.paragraphs_rewritten += rewritten;
        }
    }
}

/// A decoded working copy of a DOCX template
#[derive(Debug, Clone)]
pub struct TemplateDocument {
    archive: OoxmlArchive,
    regions: Vec<Region>,
}

impl TemplateDocument {
    /// Open a template from a file path
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::from_archive(OoxmlArchive::open(path)?)
    }

    /// Decode a template from bytes; the input is never modified
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        Self::from_archive(OoxmlArchive::from_bytes(bytes)?)
    }

    /// Build from an unpacked archive
    pub fn from_archive(archive: OoxmlArchive) -> Result<Self> {
        let main = main_document_path(&archive)?;
        let mut regions = vec![Region::load(&archive, RegionKind::Body, main.clone())?];

        if let Some(rels_xml) = archive.get(&rels_path_for(&main)) {
            let rels = Relationships::parse(rels_xml)?;
            let kinds = [
                (RegionKind::Header, Relationships::TYPE_HEADER),
                (RegionKind::Footer, Relationships::TYPE_FOOTER),
            ];

            for (kind, rel_type) in kinds {
                for target in rels.targets_of_type(rel_type) {
                    let path = resolve_target(&main, target);
                    // Several sections may share one header part
                    if regions.iter().any(|r| r.path == path) {
                        continue;
                    }
                    regions.push(Region::load(&archive, kind, path)?);
                }
            }
        }

        debug!(
            main = %main,
            regions = regions.len(),
            "loaded template document"
        );

        Ok(Self { archive, regions })
    }

    /// All regions: the body first, then headers, then footers
    pub fn regions(&self) -> &[Region] {
        &self.regions
    }

    /// The main document region
    pub fn body(&self) -> &Region {
        &self.regions[0]
    }

    /// Regions of one kind
    pub fn regions_of(&self, kind: RegionKind) -> impl Iterator<Item = &Region> {
        self.regions.iter().filter(move |r| r.kind == kind)
    }

    /// Paragraph texts of every region of one kind
    pub fn paragraph_texts(&self, kind: RegionKind) -> Vec<String> {
        self.regions_of(kind)
            .flat_map(|r| r.paragraph_texts())
            .collect()
    }

    /// Plain text of the whole document, one paragraph per line
    pub fn plain_text(&self) -> String {
        self.regions
            .iter()
            .flat_map(|r| r.paragraph_texts())
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Placeholder-shaped tokens present anywhere in the document
    pub fn find_placeholders(&self, open: &str, close: &str) -> Vec<PlaceholderHit> {
        let mut hits = Vec::new();
        for region in &self.regions {
            for text in region.paragraph_texts() {
                for token in find_placeholders(&text, open, close) {
                    hits.push(PlaceholderHit {
                        region: region.kind,
                        path: region.path.clone(),
                        token,
                    });
                }
            }
        }
        hits
    }

    /// Replace every token of `map` in every region
    ///
    /// Paragraphs that contain no token are left exactly as they were.
    pub fn fill(&mut self, map: &PlaceholderMap) -> FillReport {
        let mut report = FillReport::new(map);
        for region in &mut self.regions {
            region.fill(map, &mut report);
        }
        report
    }

    /// Serialize the document
    ///
    /// Only modified parts are re-encoded; every other entry keeps its
    /// original bytes.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut archive = self.archive.clone();
        for region in self.regions.iter().filter(|r| r.modified) {
            archive.set(region.path.clone(), region.to_xml()?);
        }
        archive.to_bytes()
    }

    /// Access the underlying archive (original template entries)
    pub fn archive(&self) -> &OoxmlArchive {
        &self.archive
    }
}

/// Locate the main document part through the package relationships
fn main_document_path(archive: &OoxmlArchive) -> Result<String> {
    let from_rels = match archive.get(PACKAGE_RELS_PATH) {
        Some(xml) => Relationships::parse(xml)?
            .targets_of_type(Relationships::TYPE_OFFICE_DOCUMENT)
            .next()
            .map(|target| resolve_target("", target)),
        None => None,
    };

    let path = from_rels.unwrap_or_else(|| DEFAULT_DOCUMENT_PATH.to_string());
    if !archive.contains(&path) {
        return Err(OoxmlError::MissingFile(path));
    }
    Ok(path)
}

/// Visit every paragraph, then the paragraphs nested inside it (text boxes)
fn visit_paragraphs(nodes: &[XmlNode], f: &mut dyn FnMut(&XmlElement)) {
    for el in nodes.iter().filter_map(XmlNode::as_element) {
        if el.is(b"w:p") {
            f(el);
        }
        visit_paragraphs(&el.children, f);
    }
}

/// Mutable [`visit_paragraphs`]; a rebuilt paragraph has nothing nested left
fn visit_paragraphs_mut(nodes: &mut [XmlNode], f: &mut dyn FnMut(&mut XmlElement)) {
    for node in nodes.iter_mut() {
        if let XmlNode::Element(el) = node {
            if el.is(b"w:p") {
                f(el);
            }
            visit_paragraphs_mut(&mut el.children, f);
        }
    }
}

fn collect_tables(nodes: &[XmlNode], out: &mut Vec<TableText>) {
    for el in nodes.iter().filter_map(XmlNode::as_element) {
        match el.name() {
            b"w:tbl" => out.push(table_text(el)),
            b"w:p" => {}
            _ => collect_tables(&el.children, out),
        }
    }
}

fn table_text(table: &XmlElement) -> TableText {
    let rows: Vec<Vec<String>> = table
        .child_elements()
        .filter(|el| el.is(b"w:tr"))
        .map(|row| {
            row.child_elements()
                .filter(|el| el.is(b"w:tc"))
                .map(|cell| {
                    let mut texts = Vec::new();
                    visit_paragraphs(&cell.children, &mut |p| texts.push(paragraph_text(p)));
                    texts.join("\n")
                })
                .collect::<Vec<String>>()
        })
        .collect();

    TableText { rows }
}

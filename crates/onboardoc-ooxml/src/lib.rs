//! # onboardoc-ooxml
//!
//! DOCX template handling for onboardoc.
//!
//! This crate provides functionality to:
//! - Read a DOCX package losslessly, keeping entry order and untouched bytes
//! - Locate the main document, header and footer parts
//! - Replace placeholder tokens that Word split across runs
//! - Inspect a template's paragraphs, tables and tokens
//!
//! ## Example: Filling a Template
//!
//! ```no_run
//! use onboardoc_ooxml::{PlaceholderMap, TemplateDocument};
//!
//! let mut doc = TemplateDocument::open("installer.docx")?;
//! let map = PlaceholderMap::new()
//!     .with("{{GREETING}}", "Mat,")
//!     .with("{{GMAIL}}", "mobrien@artofdrawers.com");
//!
//! let report = doc.fill(&map);
//! std::fs::write("filled.docx", doc.to_bytes()?)?;
//! println!("replaced {} tokens", report.total());
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod archive;
pub mod error;
pub mod paragraph;
pub mod placeholder;
pub mod relationships;
pub mod template;
pub mod test_utils;
pub mod xml;

pub use archive::OoxmlArchive;
pub use error::{OoxmlError, Result};
pub use paragraph::{paragraph_text, RunFormat};
pub use placeholder::{find_placeholders, PlaceholderMap, Substitution};
pub use relationships::Relationships;
pub use template::{FillReport, PlaceholderHit, Region, RegionKind, TableText, TemplateDocument};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

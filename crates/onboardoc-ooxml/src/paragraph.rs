//! Paragraph-level text extraction and rewriting
//!
//! Word splits a paragraph's text across runs wherever formatting, spell
//! checking or editing history changes, so a token such as `{{GMAIL}}` can
//! end up as `{{GM` + `AIL}}` in two runs. Matching therefore works on the
//! paragraph's concatenated text, and a paragraph that needs substitution
//! is rebuilt as a single run.

use crate::placeholder::{PlaceholderMap, Substitution};
use crate::xml::{XmlElement, XmlNode};

/// Character formatting carried over to a rewritten paragraph
///
/// Toggles are tri-state: `Some(true)` on, `Some(false)` explicitly off,
/// `None` inherited from the style.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunFormat {
    /// Font name (`w:rFonts/@w:ascii`)
    pub font: Option<String>,
    /// Size in half-points (`w:sz/@w:val`)
    pub size: Option<u32>,
    /// Bold toggle
    pub bold: Option<bool>,
    /// Italic toggle
    pub italic: Option<bool>,
}

impl RunFormat {
    /// Read the formatting of a `w:r` element
    pub fn from_run(run: &XmlElement) -> Self {
        let Some(rpr) = run.child(b"w:rPr") else {
            return Self::default();
        };

        Self {
            font: rpr.child(b"w:rFonts").and_then(|f| f.attr(b"w:ascii")),
            size: rpr
                .child(b"w:sz")
                .and_then(|s| s.attr(b"w:val"))
                .and_then(|v| v.parse().ok()),
            bold: rpr.child(b"w:b").map(toggle_value),
            italic: rpr.child(b"w:i").map(toggle_value),
        }
    }

    /// Check whether nothing is set
    pub fn is_empty(&self) -> bool {
        self.font.is_none() && self.size.is_none() && self.bold.is_none() && self.italic.is_none()
    }

    /// Build a `w:rPr` element, in schema order, if anything is set
    fn to_rpr(&self) -> Option<XmlElement> {
        if self.is_empty() {
            return None;
        }

        let mut rpr = XmlElement::new("w:rPr");
        if let Some(font) = &self.font {
            rpr = rpr.with_child(
                XmlElement::empty("w:rFonts")
                    .with_attr("w:ascii", font)
                    .with_attr("w:hAnsi", font),
            );
        }
        if let Some(bold) = self.bold {
            rpr = rpr.with_child(toggle_element("w:b", bold));
        }
        if let Some(italic) = self.italic {
            rpr = rpr.with_child(toggle_element("w:i", italic));
        }
        if let Some(size) = self.size {
            rpr = rpr.with_child(XmlElement::empty("w:sz").with_attr("w:val", &size.to_string()));
        }
        Some(rpr)
    }
}

/// Concatenated logical text of a paragraph
///
/// Text of paragraphs nested inside this one (text boxes) is not included.
pub fn paragraph_text(paragraph: &XmlElement) -> String {
    let mut out = String::new();
    collect_text(&paragraph.children, false, &mut out);
    out
}

/// First run of a paragraph in document order, hyperlinks included
pub fn first_run(paragraph: &XmlElement) -> Option<&XmlElement> {
    find_first_run(&paragraph.children)
}

/// Substitute tokens in a paragraph, rebuilding it if any token occurs
///
/// Returns `None` and leaves the paragraph untouched when no token occurs
/// in its text.
pub fn fill_paragraph(paragraph: &mut XmlElement, map: &PlaceholderMap) -> Option<Substitution> {
    let text = paragraph_text(paragraph);
    if !map.occurs_in(&text) {
        return None;
    }

    let substitution = map.substitute(&text);
    let format = first_run(paragraph)
        .map(RunFormat::from_run)
        .unwrap_or_default();

    // Fresh child list: paragraph properties, then the single new run
    let mut children = Vec::with_capacity(2);
    if let Some(ppr) = paragraph.child(b"w:pPr") {
        children.push(XmlNode::Element(ppr.clone()));
    }
    children.push(XmlNode::Element(build_run(&substitution.text, &format)));
    paragraph.children = children;

    Some(substitution)
}

/// Build a `w:r` carrying `text` with the given formatting
///
/// Tabs and line breaks become `w:tab` and `w:br` elements.
pub fn build_run(text: &str, format: &RunFormat) -> XmlElement {
    let mut run = XmlElement::new("w:r");
    if let Some(rpr) = format.to_rpr() {
        run = run.with_child(rpr);
    }

    let mut segment = String::new();
    for ch in text.chars() {
        match ch {
            '\t' => {
                flush_segment(&mut run, &mut segment);
                run.children.push(XmlElement::empty("w:tab").into());
            }
            '\n' | '\r' => {
                flush_segment(&mut run, &mut segment);
                run.children.push(XmlElement::empty("w:br").into());
            }
            c => segment.push(c),
        }
    }
    flush_segment(&mut run, &mut segment);

    run
}

fn flush_segment(run: &mut XmlElement, segment: &mut String) {
    if segment.is_empty() {
        return;
    }

    let mut t = XmlElement::new("w:t");
    if segment.starts_with(char::is_whitespace) || segment.ends_with(char::is_whitespace) {
        t = t.with_attr("xml:space", "preserve");
    }
    run.children.push(t.with_child(XmlNode::text(segment)).into());
    segment.clear();
}

fn collect_text(nodes: &[XmlNode], in_run: bool, out: &mut String) {
    for el in nodes.iter().filter_map(XmlNode::as_element) {
        match el.name() {
            b"w:p" | b"w:pPr" | b"w:rPr" | b"w:delText" | b"w:instrText" => {}
            b"w:r" => collect_text(&el.children, true, out),
            b"w:t" if in_run => out.push_str(&el.text_content()),
            b"w:tab" if in_run => out.push('\t'),
            b"w:br" | b"w:cr" if in_run => out.push('\n'),
            b"w:noBreakHyphen" if in_run => out.push('-'),
            _ => collect_text(&el.children, in_run, out),
        }
    }
}

fn find_first_run(nodes: &[XmlNode]) -> Option<&XmlElement> {
    for el in nodes.iter().filter_map(XmlNode::as_element) {
        match el.name() {
            b"w:p" | b"w:pPr" => {}
            b"w:r" => return Some(el),
            _ => {
                if let Some(run) = find_first_run(&el.children) {
                    return Some(run);
                }
            }
        }
    }
    None
}

fn toggle_value(el: &XmlElement) -> bool {
    !matches!(el.attr(b"w:val").as_deref(), Some("0" | "false" | "off"))
}

fn toggle_element(name: &str, on: bool) -> XmlElement {
    let el = XmlElement::empty(name);
    if on {
        el
    } else {
        el.with_attr("w:val", "0")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::xml::{self, write_element};

    const W_NS: &str = r#"xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main""#;

    fn parse_paragraph(inner: &str) -> XmlElement {
        let xml = format!("<w:p {}>{}</w:p>", W_NS, inner);
        let nodes = xml::parse(xml.as_bytes()).unwrap();
        nodes[0].as_element().unwrap().clone()
    }

    fn render(el: &XmlElement) -> String {
        String::from_utf8(write_element(el).unwrap()).unwrap()
    }

    fn map() -> PlaceholderMap {
        PlaceholderMap::new()
            .with("{{GREETING}}", "Mary-Jane,")
            .with("{{GMAIL}}", "mobrien@artofdrawers.com")
    }

    #[test]
    fn test_text_joins_split_runs() {
        let p = parse_paragraph(
            r#"<w:r><w:t>Email: {{GM</w:t></w:r><w:r><w:rPr><w:b/></w:rPr><w:t>AIL}}</w:t></w:r>"#,
        );
        assert_eq!(paragraph_text(&p), "Email: {{GMAIL}}");
    }

    #[test]
    fn test_text_includes_hyperlinks_tabs_and_breaks() {
        let p = parse_paragraph(
            r#"<w:pPr><w:tabs><w:tab w:val="left" w:pos="720"/></w:tabs></w:pPr><w:r><w:t>a</w:t><w:tab/><w:t>b</w:t><w:br/></w:r><w:hyperlink r:id="rId1" xmlns:r="r"><w:r><w:t>link</w:t></w:r></w:hyperlink>"#,
        );
        assert_eq!(paragraph_text(&p), "a\tb\nlink");
    }

    #[test]
    fn test_text_skips_deleted_and_field_codes() {
        let p = parse_paragraph(
            r#"<w:r><w:instrText> PAGE </w:instrText></w:r><w:del><w:r><w:delText>gone</w:delText></w:r></w:del><w:ins><w:r><w:t>kept</w:t></w:r></w:ins>"#,
        );
        assert_eq!(paragraph_text(&p), "kept");
    }

    #[test]
    fn test_text_skips_nested_textbox_paragraphs() {
        let p = parse_paragraph(
            r#"<w:r><w:t>outer</w:t><w:drawing><w:txbxContent><w:p><w:r><w:t>inner</w:t></w:r></w:p></w:txbxContent></w:drawing></w:r>"#,
        );
        assert_eq!(paragraph_text(&p), "outer");
    }

    #[test]
    fn test_run_format_reads_first_run() {
        let p = parse_paragraph(
            r#"<w:r><w:rPr><w:rFonts w:ascii="Georgia" w:hAnsi="Georgia"/><w:b/><w:i w:val="0"/><w:sz w:val="28"/><w:color w:val="FF0000"/></w:rPr><w:t>x</w:t></w:r><w:r><w:t>y</w:t></w:r>"#,
        );
        let format = RunFormat::from_run(first_run(&p).unwrap());
        assert_eq!(
            format,
            RunFormat {
                font: Some("Georgia".to_string()),
                size: Some(28),
                bold: Some(true),
                italic: Some(false),
            }
        );
    }

    #[test]
    fn test_run_format_defaults_to_inherited() {
        let p = parse_paragraph(r#"<w:r><w:t>plain</w:t></w:r>"#);
        let format = RunFormat::from_run(first_run(&p).unwrap());
        assert!(format.is_empty());
    }

    #[test]
    fn test_fill_rebuilds_single_run_with_first_run_format() {
        let mut p = parse_paragraph(
            r#"<w:pPr><w:jc w:val="center"/></w:pPr><w:r><w:rPr><w:rFonts w:ascii="Arial"/><w:b/><w:sz w:val="24"/><w:u w:val="single"/></w:rPr><w:t xml:space="preserve">Hello </w:t></w:r><w:r><w:rPr><w:i/></w:rPr><w:t>{{GREE</w:t></w:r><w:r><w:t>TING}}</w:t></w:r>"#,
        );

        let substitution = fill_paragraph(&mut p, &map()).unwrap();
        assert_eq!(substitution.text, "Hello Mary-Jane,");
        assert_eq!(substitution.counts, vec![1, 0]);

        let xml = render(&p);
        assert_eq!(
            xml,
            format!(
                r#"<w:p {}><w:pPr><w:jc w:val="center"/></w:pPr><w:r><w:rPr><w:rFonts w:ascii="Arial" w:hAnsi="Arial"/><w:b/><w:sz w:val="24"/></w:rPr><w:t>Hello Mary-Jane,</w:t></w:r></w:p>"#,
                W_NS
            )
        );
    }

    #[test]
    fn test_fill_leaves_untouched_paragraph_alone() {
        let inner = r#"<w:r><w:rPr><w:color w:val="00FF00"/></w:rPr><w:t>No tokens {{UNKNOWN}}</w:t></w:r><w:r><w:t>here</w:t></w:r>"#;
        let mut p = parse_paragraph(inner);
        let before = render(&p);

        assert!(fill_paragraph(&mut p, &map()).is_none());
        assert_eq!(render(&p), before);
    }

    #[test]
    fn test_fill_without_runs_produces_plain_run() {
        let mut p = parse_paragraph(r#"<w:hyperlink><w:r><w:t>{{GMAIL}}</w:t></w:r></w:hyperlink>"#);
        fill_paragraph(&mut p, &map()).unwrap();

        let xml = render(&p);
        assert!(xml.contains("<w:r><w:t>mobrien@artofdrawers.com</w:t></w:r>"));
        assert!(!xml.contains("w:hyperlink"));
    }

    #[test]
    fn test_build_run_maps_tabs_and_breaks() {
        let run = build_run("a\tb\nc ", &RunFormat::default());
        assert_eq!(
            render(&run),
            r#"<w:r><w:t>a</w:t><w:tab/><w:t>b</w:t><w:br/><w:t xml:space="preserve">c </w:t></w:r>"#
        );
    }

    #[test]
    fn test_build_run_escapes_text() {
        let run = build_run("Tom & <Jerry>", &RunFormat::default());
        assert_eq!(
            render(&run),
            r#"<w:r><w:t>Tom &amp; &lt;Jerry&gt;</w:t></w:r>"#
        );
    }

    #[test]
    fn test_build_run_explicit_off_toggles() {
        let format = RunFormat {
            bold: Some(false),
            italic: Some(true),
            ..RunFormat::default()
        };
        let run = build_run("x", &format);
        assert_eq!(
            render(&run),
            r#"<w:r><w:rPr><w:b w:val="0"/><w:i/></w:rPr><w:t>x</w:t></w:r>"#
        );
    }
}

//! Lossless XML node tree
//!
//! Parts are parsed into a tree of raw quick-xml events. Nothing is
//! normalized on the way in: tags keep their original attribute text,
//! text keeps its original escaping, so an untouched subtree serializes
//! back to the bytes it came from.

use std::borrow::Cow;

use quick_xml::events::{BytesEnd, BytesStart, BytesText, Event};
use quick_xml::{Reader, Writer};

use crate::error::{OoxmlError, Result};

/// A node in a parsed part
#[derive(Debug, Clone)]
pub enum XmlNode {
    /// An element with its children
    Element(XmlElement),
    /// Anything else: text, comments, declarations, processing instructions
    Leaf(Event<'static>),
}

/// An element and its subtree
#[derive(Debug, Clone)]
pub struct XmlElement {
    /// Opening tag, attributes included
    pub start: BytesStart<'static>,
    /// Child nodes in document order
    pub children: Vec<XmlNode>,
    /// Closing tag; `None` for self-closing elements
    end: Option<BytesEnd<'static>>,
}

impl XmlNode {
    /// Borrow the element, if this node is one
    pub fn as_element(&self) -> Option<&XmlElement> {
        match self {
            XmlNode::Element(el) => Some(el),
            XmlNode::Leaf(_) => None,
        }
    }

    /// Text leaf holding `text`, escaped on output
    pub fn text(text: &str) -> Self {
        XmlNode::Leaf(Event::Text(BytesText::new(text).into_owned()))
    }
}

impl XmlElement {
    /// Element with an opening and closing tag
    pub fn new(name: &str) -> Self {
        Self {
            start: BytesStart::new(name.to_string()),
            children: Vec::new(),
            end: Some(BytesEnd::new(name.to_string())),
        }
    }

    /// Self-closing element (`<w:b/>`)
    pub fn empty(name: &str) -> Self {
        Self {
            start: BytesStart::new(name.to_string()),
            children: Vec::new(),
            end: None,
        }
    }

    /// Add an attribute (value is escaped)
    pub fn with_attr(mut self, key: &str, value: &str) -> Self {
        self.start.push_attribute((key, value));
        self
    }

    /// Append a child node
    pub fn with_child(mut self, child: impl Into<XmlNode>) -> Self {
        self.children.push(child.into());
        self
    }

    /// Qualified name as raw bytes (`b"w:p"`)
    pub fn name(&self) -> &[u8] {
        self.start.name().into_inner()
    }

    /// Whether this element has the given qualified name
    pub fn is(&self, name: &[u8]) -> bool {
        self.name() == name
    }

    /// Unescaped value of an attribute, matched on its qualified name
    pub fn attr(&self, key: &[u8]) -> Option<String> {
        self.start
            .attributes()
            .filter_map(|a| a.ok())
            .find(|a| a.key.as_ref() == key)
            .and_then(|a| a.unescape_value().ok().map(Cow::into_owned))
    }

    /// Child elements, skipping leaves
    pub fn child_elements(&self) -> impl Iterator<Item = &XmlElement> {
        self.children.iter().filter_map(XmlNode::as_element)
    }

    /// First child element with the given name
    pub fn child(&self, name: &[u8]) -> Option<&XmlElement> {
        self.child_elements().find(|el| el.is(name))
    }

    /// Concatenated character data of the direct text children
    pub fn text_content(&self) -> String {
        let mut out = String::new();
        for child in &self.children {
            match child {
                XmlNode::Leaf(Event::Text(text)) => out.push_str(&unescape_text(text)),
                XmlNode::Leaf(Event::CData(data)) => {
                    out.push_str(&String::from_utf8_lossy(data));
                }
                _ => {}
            }
        }
        out
    }

    fn write_into(&self, writer: &mut Writer<Vec<u8>>) -> Result<()> {
        if self.children.is_empty() && self.end.is_none() {
            writer.write_event(Event::Empty(self.start.borrow()))?;
            return Ok(());
        }

        writer.write_event(Event::Start(self.start.borrow()))?;
        for child in &self.children {
            write_node(writer, child)?;
        }
        let end = match &self.end {
            Some(end) => end.clone(),
            None => self.start.to_end().into_owned(),
        };
        writer.write_event(Event::End(end))?;
        Ok(())
    }
}

impl From<XmlElement> for XmlNode {
    fn from(el: XmlElement) -> Self {
        XmlNode::Element(el)
    }
}

/// Parse XML bytes into a node list (prolog, root element, trailing misc)
pub fn parse(xml: &[u8]) -> Result<Vec<XmlNode>> {
    let mut reader = Reader::from_reader(xml);
    // Whitespace is content here; keep it so output matches input
    reader.config_mut().trim_text(false);

    let mut roots = Vec::new();
    let mut stack: Vec<XmlElement> = Vec::new();
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) => stack.push(XmlElement {
                start: e.into_owned(),
                children: Vec::new(),
                end: None,
            }),
            Ok(Event::End(e)) => {
                let mut el = stack.pop().ok_or_else(|| {
                    OoxmlError::InvalidStructure("closing tag without opening tag".to_string())
                })?;
                el.end = Some(e.into_owned());
                attach(&mut stack, &mut roots, XmlNode::Element(el));
            }
            Ok(Event::Empty(e)) => {
                let el = XmlElement {
                    start: e.into_owned(),
                    children: Vec::new(),
                    end: None,
                };
                attach(&mut stack, &mut roots, XmlNode::Element(el));
            }
            Ok(Event::Eof) => break,
            Ok(other) => attach(&mut stack, &mut roots, XmlNode::Leaf(other.into_owned())),
            Err(e) => return Err(OoxmlError::Xml(e)),
        }
        buf.clear();
    }

    if let Some(open) = stack.last() {
        return Err(OoxmlError::InvalidStructure(format!(
            "unclosed element <{}>",
            String::from_utf8_lossy(open.name())
        )));
    }

    Ok(roots)
}

/// Serialize a node list back to bytes
pub fn write(nodes: &[XmlNode]) -> Result<Vec<u8>> {
    let mut writer = Writer::new(Vec::new());
    for node in nodes {
        write_node(&mut writer, node)?;
    }
    Ok(writer.into_inner())
}

/// Serialize a single element and its subtree
pub fn write_element(element: &XmlElement) -> Result<Vec<u8>> {
    let mut writer = Writer::new(Vec::new());
    element.write_into(&mut writer)?;
    Ok(writer.into_inner())
}

fn write_node(writer: &mut Writer<Vec<u8>>, node: &XmlNode) -> Result<()> {
    match node {
        XmlNode::Element(el) => el.write_into(writer),
        XmlNode::Leaf(event) => {
            writer.write_event(event.borrow())?;
            Ok(())
        }
    }
}

fn attach(stack: &mut [XmlElement], roots: &mut Vec<XmlNode>, node: XmlNode) {
    match stack.last_mut() {
        Some(parent) => parent.children.push(node),
        None => roots.push(node),
    }
}

fn unescape_text(text: &BytesText) -> String {
    match text.unescape() {
        Ok(s) => s.into_owned(),
        Err(_) => String::from_utf8_lossy(text).into_owned(),
    }
}

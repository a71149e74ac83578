/*
 * parser.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Markup reader that builds a [`Document`].
//!
//! The input must be well-formed in the XML sense (every element closed,
//! attributes quoted), but may hold any number of top-level nodes. Text is
//! kept verbatim, whitespace included, so that writing the document back
//! reproduces the author's layout. Comments, processing instructions,
//! declarations and DOCTYPEs are dropped.

use crate::document::{Document, NodeId, NodeKind};
use crate::error::{DomError, Result};
use crate::host::HostTree;
use quick_xml::Reader;
use quick_xml::events::{BytesCData, BytesEnd, BytesStart, BytesText, Event};

/// Parse markup into a new [`Document`].
///
/// # Example
///
/// ```rust
/// use canopy_dom::{HostTree, parser::parse};
///
/// let doc = parse(r#"<each of="items"><li>{{item}}</li></each>"#).unwrap();
/// let each = doc.child_elements(doc.root())[0];
/// assert_eq!(doc.tag_name(each), Some("each"));
/// assert_eq!(doc.attribute(each, "of"), Some("items"));
/// ```
///
/// # Errors
///
/// Returns an error if the markup is malformed.
pub fn parse(content: &str) -> Result<Document> {
    let mut parser = MarkupParser::new(content);
    parser.parse()?;
    Ok(parser.doc)
}

/// An element that has been opened but not yet closed.
struct OpenElement {
    name: String,
    node: NodeId,
}

struct MarkupParser<'a> {
    reader: Reader<&'a [u8]>,
    doc: Document,
    stack: Vec<OpenElement>,
}

impl<'a> MarkupParser<'a> {
    fn new(source: &'a str) -> Self {
        let mut reader = Reader::from_str(source);
        reader.config_mut().trim_text_start = false;
        reader.config_mut().trim_text_end = false;
        // End-name checks are done here so mismatches get a dedicated error.
        reader.config_mut().check_end_names = false;

        Self {
            reader,
            doc: Document::new(),
            stack: Vec::new(),
        }
    }

    fn parse(&mut self) -> Result<()> {
        loop {
            let event_start = self.reader.buffer_position();

            match self.reader.read_event() {
                Ok(Event::Start(e)) => {
                    let node = self.handle_element(&e, event_start)?;
                    self.stack.push(OpenElement {
                        name: element_name(&e),
                        node,
                    });
                }
                Ok(Event::End(e)) => {
                    self.handle_end(&e)?;
                }
                Ok(Event::Empty(e)) => {
                    self.handle_element(&e, event_start)?;
                }
                Ok(Event::Text(e)) => {
                    self.handle_text(&e, event_start)?;
                }
                Ok(Event::CData(e)) => {
                    self.handle_cdata(&e)?;
                }
                Ok(Event::Comment(_) | Event::PI(_) | Event::Decl(_) | Event::DocType(_)) => {}
                Ok(Event::Eof) => break,
                Err(e) => {
                    return Err(DomError::Syntax {
                        message: e.to_string(),
                        position: Some(self.reader.error_position()),
                    });
                }
            }
        }

        if let Some(open) = self.stack.last() {
            return Err(DomError::UnexpectedEof {
                expected: open.name.clone(),
            });
        }

        Ok(())
    }

    fn current_parent(&self) -> NodeId {
        self.stack
            .last()
            .map_or_else(|| self.doc.root(), |open| open.node)
    }

    fn handle_element(&mut self, e: &BytesStart<'_>, event_start: u64) -> Result<NodeId> {
        let name = element_name(e);
        let node = self
            .doc
            .create_element(&name)
            .map_err(|err| DomError::Syntax {
                message: err.to_string(),
                position: Some(event_start),
            })?;

        for attr in e.attributes() {
            let attr = attr?;
            let key = String::from_utf8_lossy(attr.key.as_ref()).to_string();
            let value = attr.unescape_value().map_err(|err| DomError::Syntax {
                message: format!("Invalid attribute value: {}", err),
                position: Some(event_start),
            })?;
            self.doc.set_attribute(node, &key, &value)?;
        }

        let parent = self.current_parent();
        self.doc.append_child(parent, node)?;
        Ok(node)
    }

    fn handle_end(&mut self, e: &BytesEnd<'_>) -> Result<()> {
        let end_name = String::from_utf8_lossy(e.name().as_ref()).to_string();

        let open = self.stack.pop().ok_or_else(|| DomError::Syntax {
            message: format!("Unexpected closing tag </{}>", end_name),
            position: Some(self.reader.buffer_position()),
        })?;

        if open.name != end_name {
            return Err(DomError::MismatchedEndTag {
                expected: open.name,
                found: end_name,
            });
        }
        Ok(())
    }

    fn handle_text(&mut self, e: &BytesText<'_>, event_start: u64) -> Result<()> {
        let text = e.unescape().map_err(|err| DomError::Syntax {
            message: format!("Invalid text content: {}", err),
            position: Some(event_start),
        })?;
        self.push_text(&text)
    }

    fn handle_cdata(&mut self, e: &BytesCData<'_>) -> Result<()> {
        let text = String::from_utf8_lossy(e.as_ref()).to_string();
        self.push_text(&text)
    }

    fn push_text(&mut self, text: &str) -> Result<()> {
        if text.is_empty() {
            return Ok(());
        }
        let parent = self.current_parent();

        // Adjacent text and CDATA sections collapse into a single text node.
        if let Some(last) = self.doc.child_nodes(parent).last().copied() {
            if self.doc.text(last).is_some() {
                let merged = format!("{}{}", self.doc.text(last).unwrap_or_default(), text);
                let node = self.doc.alloc(NodeKind::Text(merged))?;
                self.doc.insert_before(parent, node, last)?;
                self.doc.remove(last)?;
                return Ok(());
            }
        }

        let node = self.doc.create_text(text)?;
        self.doc.append_child(parent, node)
    }
}

fn element_name(e: &BytesStart<'_>) -> String {
    String::from_utf8_lossy(e.name().as_ref()).to_string()
}

/*
 * writer.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Markup writer for [`Document`] trees.

use crate::document::{Document, NodeId, NodeKind};

impl Document {
    /// Serialize `node` and its subtree.
    ///
    /// Elements without children are written self-closing. Text and attribute
    /// values are escaped. The data bag is not written. Serializing the root
    /// container writes its children.
    pub fn serialize(&self, node: NodeId) -> String {
        let mut out = String::new();
        self.write_node(node, &mut out);
        out
    }

    /// Serialize only the children of `node`.
    pub fn serialize_children(&self, node: NodeId) -> String {
        let mut out = String::new();
        if let Some(data) = self.get(node) {
            for child in &data.children {
                self.write_node(*child, &mut out);
            }
        }
        out
    }

    fn write_node(&self, node: NodeId, out: &mut String) {
        let Some(data) = self.get(node) else {
            return;
        };
        match &data.kind {
            NodeKind::Root => {
                for child in &data.children {
                    self.write_node(*child, out);
                }
            }
            NodeKind::Text(text) => escape_into(text, false, out),
            NodeKind::Element { tag, attributes } => {
                out.push('<');
                out.push_str(tag);
                for (name, value) in attributes {
                    out.push(' ');
                    out.push_str(name);
                    out.push_str("=\"");
                    escape_into(value, true, out);
                    out.push('"');
                }
                if data.children.is_empty() {
                    out.push_str("/>");
                    return;
                }
                out.push('>');
                for child in &data.children {
                    self.write_node(*child, out);
                }
                out.push_str("</");
                out.push_str(tag);
                out.push('>');
            }
        }
    }
}

fn escape_into(text: &str, attribute: bool, out: &mut String) {
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' if attribute => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
}

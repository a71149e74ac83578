/*
 * template.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Compiled template shapes.
//!
//! A directive anchor in the host tree is compiled once into a
//! [`TemplateNode`] tree: tags, static attributes, text sources and child
//! structure. Nothing model-dependent is kept, so a compiled template can be
//! expanded against any model and scope.

use crate::config::{DirectiveKind, EngineConfig};
use canopy_dom::HostTree;
use std::rc::Rc;
use tracing::debug;

/// An immutable list of child templates, shared between the expansion cache
/// and the recursive template registry.
pub type Fragment = Rc<[TemplateNode]>;

/// A compiled template node.
#[derive(Debug, Clone, PartialEq)]
pub enum TemplateNode {
    /// A plain element, copied into the output.
    Element(ElementTemplate),

    /// REPEAT: expand the children once per element of a sequence.
    Repeat(RepeatTemplate),

    /// CONDITIONAL: expand the children when a path is truthy.
    Conditional(ConditionalTemplate),

    /// RECURSIVE-TEMPLATE: define and/or instantiate a named fragment.
    Recursive(RecursiveTemplate),
}

/// A plain element template.
#[derive(Debug, Clone, PartialEq)]
pub struct ElementTemplate {
    pub tag: String,

    /// Attributes in document order, uninterpolated.
    pub attributes: Vec<(String, String)>,

    /// Direct text of the element (trimmed, joined), uninterpolated.
    pub text: String,

    pub children: Fragment,
}

/// Where a REPEAT gets its sequence from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RepeatSource {
    /// `of="path"`.
    Path(String),

    /// `of-rec="name"`: the path a recursive template is currently
    /// iterating.
    Recursive(String),

    /// Neither attribute: always empty.
    Missing,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RepeatTemplate {
    pub source: RepeatSource,

    /// `as`; the configured default binding when absent.
    pub binding: Option<String>,

    pub children: Fragment,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ConditionalTemplate {
    /// `test`; a missing test is false.
    pub test: Option<String>,

    pub children: Fragment,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RecursiveTemplate {
    /// `name`: register the children under this name.
    pub name: Option<String>,

    /// `use`: instantiate the fragment registered under this name.
    pub reference: Option<String>,

    /// `of`: the source path recorded with a definition, or the override
    /// passed to an instantiation.
    pub of: Option<String>,

    pub children: Fragment,
}

impl TemplateNode {
    /// The children of any kind of template node.
    pub fn children(&self) -> &Fragment {
        match self {
            TemplateNode::Element(e) => &e.children,
            TemplateNode::Repeat(r) => &r.children,
            TemplateNode::Conditional(c) => &c.children,
            TemplateNode::Recursive(r) => &r.children,
        }
    }

    pub fn is_directive(&self) -> bool {
        !matches!(self, TemplateNode::Element(_))
    }
}

/// Compile the host subtree rooted at `node`.
///
/// Returns `None` for anything that is not an element.
pub fn compile<H: HostTree>(host: &H, node: H::Node, config: &EngineConfig) -> Option<TemplateNode> {
    let tag = host.tag_name(node)?;
    let attr = |name: &str| host.attribute(node, name).map(str::to_string);

    let template = match config.directive_kind(tag) {
        Some(kind) => {
            let children = compile_directive_children(host, node, config, tag);
            match kind {
                DirectiveKind::Repeat => {
                    let source = match (attr("of"), attr("of-rec")) {
                        (Some(path), _) => RepeatSource::Path(path),
                        (None, Some(name)) => RepeatSource::Recursive(name),
                        (None, None) => RepeatSource::Missing,
                    };
                    TemplateNode::Repeat(RepeatTemplate {
                        source,
                        binding: attr("as").filter(|s| !s.is_empty()),
                        children,
                    })
                }
                DirectiveKind::Conditional => TemplateNode::Conditional(ConditionalTemplate {
                    test: attr("test"),
                    children,
                }),
                DirectiveKind::RecursiveTemplate => {
                    TemplateNode::Recursive(RecursiveTemplate {
                        name: attr("name"),
                        reference: attr("use"),
                        of: attr("of"),
                        children,
                    })
                }
            }
        }
        None => TemplateNode::Element(ElementTemplate {
            tag: tag.to_string(),
            attributes: host.attributes(node),
            text: host.direct_text(node),
            children: compile_children(host, node, config),
        }),
    };
    Some(template)
}

fn compile_children<H: HostTree>(host: &H, node: H::Node, config: &EngineConfig) -> Fragment {
    host.child_elements(node)
        .into_iter()
        .filter_map(|child| compile(host, child, config))
        .collect()
}

/// Directives only expand element children; loose text directly inside a
/// directive produces nothing.
fn compile_directive_children<H: HostTree>(
    host: &H,
    node: H::Node,
    config: &EngineConfig,
    tag: &str,
) -> Fragment {
    let loose = host.direct_text(node);
    if !loose.is_empty() {
        debug!(directive = tag, text = %loose, "ignoring text directly inside directive");
    }
    compile_children(host, node, config)
}

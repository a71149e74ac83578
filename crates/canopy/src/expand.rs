/*
 * expand.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Template expansion.
//!
//! Expansion turns a compiled [`TemplateNode`] into detached output nodes in
//! the host tree. Element templates produce exactly one node each; directive
//! templates produce whatever their handler returns (see
//! [`directive`](crate::directive)) and are never materialized themselves.

use crate::engine::Engine;
use crate::error::EngineResult;
use crate::interpolate::{TEXT_SOURCE_KEY, apply_interpolations};
use crate::scope::Scope;
use crate::template::{ElementTemplate, TemplateNode, compile};
use crate::value::Value;
use canopy_dom::HostTree;
use std::fmt::Debug;
use std::hash::Hash;

impl<N: Copy + Eq + Hash + Debug> Engine<N> {
    /// Expand the template rooted at the host node `template`.
    ///
    /// The node is compiled on first use and the compiled shape is cached
    /// under the host's tree id and the node's handle; later calls reuse it.
    /// Text nodes expand to nothing.
    ///
    /// # Errors
    ///
    /// Propagates host tree failures.
    pub fn expand_node<H>(
        &mut self,
        host: &mut H,
        template: N,
        model: &Value,
        scope: &Scope<'_>,
    ) -> EngineResult<Vec<N>>
    where
        H: HostTree<Node = N>,
    {
        let config = &self.config;
        let tree = host.tree_id();
        let Some(compiled) = self
            .cache
            .get_or_compile(tree, template, || compile(host, template, config))
        else {
            return Ok(Vec::new());
        };
        self.expand(host, &compiled, model, scope)
    }

    /// Expand a compiled template into detached output nodes.
    ///
    /// # Errors
    ///
    /// Propagates host tree failures.
    pub fn expand<H>(
        &mut self,
        host: &mut H,
        template: &TemplateNode,
        model: &Value,
        scope: &Scope<'_>,
    ) -> EngineResult<Vec<N>>
    where
        H: HostTree<Node = N>,
    {
        match template {
            TemplateNode::Element(element) => {
                let node = self.expand_element(host, element, model, scope)?;
                Ok(vec![node])
            }
            TemplateNode::Repeat(repeat) => self.expand_repeat(host, repeat, model, scope),
            TemplateNode::Conditional(conditional) => {
                self.expand_conditional(host, conditional, model, scope)
            }
            TemplateNode::Recursive(recursive) => {
                self.expand_recursive(host, recursive, model, scope)
            }
        }
    }

    /// Expand each template in turn and concatenate the results.
    pub(crate) fn expand_fragment<H>(
        &mut self,
        host: &mut H,
        fragment: &[TemplateNode],
        model: &Value,
        scope: &Scope<'_>,
    ) -> EngineResult<Vec<N>>
    where
        H: HostTree<Node = N>,
    {
        let mut nodes = Vec::new();
        for template in fragment {
            nodes.extend(self.expand(host, template, model, scope)?);
        }
        Ok(nodes)
    }

    fn expand_element<H>(
        &mut self,
        host: &mut H,
        element: &ElementTemplate,
        model: &Value,
        scope: &Scope<'_>,
    ) -> EngineResult<N>
    where
        H: HostTree<Node = N>,
    {
        let node = host.create_element(&element.tag)?;

        if !element.text.is_empty() {
            host.set_direct_text(node, &element.text)?;
            host.set_data(node, TEXT_SOURCE_KEY, &element.text)?;
        }
        for (name, value) in &element.attributes {
            host.set_attribute(node, name, value)?;
        }
        // The marker goes on last; a template attribute of the same name
        // must not hide the node from the next sweep.
        host.set_attribute(node, &self.config.generated_attribute, "true")?;
        apply_interpolations(host, node, model, scope)?;

        for child in element.children.iter() {
            for output in self.expand(host, child, model, scope)? {
                host.append_child(node, output)?;
            }
        }
        Ok(node)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use canopy_dom::Document;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    /// Expand the first top-level node of `markup` and write the output
    /// nodes side by side.
    fn expand_first(markup: &str, model: serde_json::Value) -> String {
        let mut doc = Document::parse(markup).unwrap();
        let template = doc.child_nodes(doc.root())[0];
        let mut engine = Engine::default();
        let model = Value::from(model);
        let nodes = engine
            .expand_node(&mut doc, template, &model, &Scope::new())
            .unwrap();
        nodes.into_iter().map(|n| doc.serialize(n)).collect()
    }

    #[test]
    fn test_element_template_copies_attributes_and_text() {
        let out = expand_first(
            r#"<li class="row" data-id="{{id}}">Item {{id}}<b>!</b></li>"#,
            json!({"id": 4}),
        );
        assert_eq!(
            out,
            r#"<li class="row" data-id="4" data-generated="true">Item 4<b data-generated="true">!</b></li>"#
        );
    }

    #[test]
    fn test_output_keeps_text_source() {
        let mut doc = Document::parse("<p>Hello {{name}}</p>").unwrap();
        let template = doc.child_elements(doc.root())[0];
        let mut engine = Engine::default();
        let model = Value::from(json!({"name": "Ada"}));
        let nodes = engine
            .expand_node(&mut doc, template, &model, &Scope::new())
            .unwrap();
        assert_eq!(doc.data(nodes[0], TEXT_SOURCE_KEY), Some("Hello {{name}}"));
        assert_eq!(doc.parent(nodes[0]), None);
    }

    #[test]
    fn test_text_node_expands_to_nothing() {
        assert_eq!(expand_first("loose", json!({})), "");
    }

    #[test]
    fn test_nested_directives_expand_inline() {
        let out = expand_first(
            r#"<ul><each of="rows" as="r"><if test="r.show"><li>{{r.name}}</li></if></each></ul>"#,
            json!({"rows": [
                {"name": "a", "show": true},
                {"name": "b", "show": false},
                {"name": "c", "show": 1}
            ]}),
        );
        insta::assert_snapshot!(
            out,
            @r#"<ul data-generated="true"><li data-generated="true">a</li><li data-generated="true">c</li></ul>"#
        );
    }

    #[test]
    fn test_cache_is_keyed_by_template_node() {
        let mut doc = Document::parse("<p>{{x}}</p>").unwrap();
        let template = doc.child_elements(doc.root())[0];
        let mut engine = Engine::default();
        let scope = Scope::new();

        for x in 0..3 {
            let model = Value::from(json!({ "x": x }));
            let nodes = engine.expand_node(&mut doc, template, &model, &scope).unwrap();
            assert_eq!(doc.serialize(nodes[0]), format!(r#"<p data-generated="true">{}</p>"#, x));
        }
        let stats = engine.cache_stats();
        assert_eq!((stats.entries, stats.hits, stats.misses), (1, 2, 1));
    }
}

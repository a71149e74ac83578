/*
 * interpolate.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! `{{ path }}` interpolation in text and attributes.
//!
//! The first time a node is interpolated, its templated text and templated
//! attribute values are stashed in the node's data bag. Every later pass
//! reads the stashed source instead of the node's current (already
//! substituted) content, so rendering any number of times gives the same
//! result.

use crate::resolve::resolve;
use crate::scope::Scope;
use crate::value::Value;
use canopy_dom::{HostTree, Result};
use once_cell::sync::Lazy;
use regex::{Captures, Regex};

/// Data-bag key holding a node's templated direct text.
pub const TEXT_SOURCE_KEY: &str = "template-text";

/// Prefix of the data-bag keys holding templated attribute values.
pub const ATTRIBUTE_SOURCE_PREFIX: &str = "template-attr:";

/// One substitution token. Captures the path in group 1.
static TOKEN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\{\{\s*([A-Za-z0-9_.-]+)\s*\}\}").unwrap());

/// Anything that looks like a token, used to decide whether a string is a
/// template source at all.
static TOKEN_LIKE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\{\{.*?\}\}").unwrap());

/// Data-bag key for the templated value of attribute `name`.
pub fn attribute_source_key(name: &str) -> String {
    format!("{}{}", ATTRIBUTE_SOURCE_PREFIX, name)
}

/// Whether `text` contains something shaped like a `{{ ... }}` token.
pub fn has_tokens(text: &str) -> bool {
    TOKEN_LIKE.is_match(text)
}

/// Replace every token in `text` with the display form of the value its
/// path resolves to, or with nothing when the path does not resolve.
///
/// ```rust
/// use canopy::{Scope, Value, interpolate_text};
///
/// let model = Value::from(serde_json::json!({"name": "Ada", "age": 36}));
/// let text = interpolate_text("{{ name }} is {{age}}{{missing}}", &model, &Scope::new());
/// assert_eq!(text, "Ada is 36");
/// ```
pub fn interpolate_text(text: &str, model: &Value, scope: &Scope<'_>) -> String {
    TOKEN
        .replace_all(text, |caps: &Captures<'_>| {
            resolve(&caps[1], model, scope)
                .map(|value| value.to_string())
                .unwrap_or_default()
        })
        .into_owned()
}

/// Interpolate a node's direct text and attributes in place.
///
/// The template source for the direct text is the stashed source if there is
/// one, else the node's current direct text. Attributes are handled the same
/// way, each independently. Sources without tokens are left alone and never
/// stashed.
///
/// # Errors
///
/// Propagates host tree failures.
pub fn apply_interpolations<H: HostTree>(
    host: &mut H,
    node: H::Node,
    model: &Value,
    scope: &Scope<'_>,
) -> Result<()> {
    let text_source = match host.data(node, TEXT_SOURCE_KEY) {
        Some(stored) if !stored.is_empty() => stored.to_string(),
        _ => host.direct_text(node),
    };
    if has_tokens(&text_source) {
        host.set_data(node, TEXT_SOURCE_KEY, &text_source)?;
        let text = interpolate_text(&text_source, model, scope);
        host.set_direct_text(node, &text)?;
    }

    for (name, current) in host.attributes(node) {
        let key = attribute_source_key(&name);
        let source = match host.data(node, &key) {
            Some(stored) if !stored.is_empty() => stored.to_string(),
            _ => current,
        };
        if has_tokens(&source) {
            host.set_data(node, &key, &source)?;
            let value = interpolate_text(&source, model, scope);
            host.set_attribute(node, &name, &value)?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use canopy_dom::Document;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn first_element(doc: &Document) -> canopy_dom::NodeId {
        doc.child_elements(doc.root())[0]
    }

    #[test]
    fn test_interpolate_text_whitespace_and_paths() {
        let model = Value::from(json!({"user": {"first-name": "Ada"}, "n": 2}));
        let scope = Scope::new();
        assert_eq!(
            interpolate_text("Hi {{  user.first-name }}, {{n}}!", &model, &scope),
            "Hi Ada, 2!"
        );
    }

    #[test]
    fn test_non_token_braces_are_kept() {
        let model = Value::map();
        let scope = Scope::new();
        assert_eq!(interpolate_text("{{ a b }} {x}", &model, &scope), "{{ a b }} {x}");
        assert!(has_tokens("{{ a b }}"));
        assert!(!has_tokens("{ a }"));
    }

    #[test]
    fn test_text_is_rederived_from_stored_source() {
        let mut doc = Document::parse("<p>Hello {{name}}</p>").unwrap();
        let p = first_element(&doc);
        let scope = Scope::new();

        let ada = Value::from(json!({"name": "Ada"}));
        apply_interpolations(&mut doc, p, &ada, &scope).unwrap();
        assert_eq!(doc.to_markup(), "<p>Hello Ada</p>");
        assert_eq!(doc.data(p, TEXT_SOURCE_KEY), Some("Hello {{name}}"));

        let grace = Value::from(json!({"name": "Grace"}));
        apply_interpolations(&mut doc, p, &grace, &scope).unwrap();
        apply_interpolations(&mut doc, p, &grace, &scope).unwrap();
        assert_eq!(doc.to_markup(), "<p>Hello Grace</p>");
    }

    #[test]
    fn test_attributes_are_interpolated_independently() {
        let mut doc =
            Document::parse(r#"<a href="/users/{{id}}" class="link" title="{{name}}">x</a>"#)
                .unwrap();
        let a = first_element(&doc);
        let model = Value::from(json!({"id": 7, "name": "Ada"}));

        apply_interpolations(&mut doc, a, &model, &Scope::new()).unwrap();
        assert_eq!(
            doc.to_markup(),
            r#"<a href="/users/7" class="link" title="Ada">x</a>"#
        );
        assert_eq!(doc.data(a, &attribute_source_key("class")), None);

        let model = Value::from(json!({"id": 8}));
        apply_interpolations(&mut doc, a, &model, &Scope::new()).unwrap();
        assert_eq!(doc.to_markup(), r#"<a href="/users/8" class="link" title="">x</a>"#);
    }

    #[test]
    fn test_static_text_is_untouched() {
        let mut doc = Document::parse("<p>  plain <b>{{x}}</b> </p>").unwrap();
        let p = first_element(&doc);
        apply_interpolations(&mut doc, p, &Value::map(), &Scope::new()).unwrap();
        assert_eq!(doc.to_markup(), "<p>  plain <b>{{x}}</b> </p>");
        assert_eq!(doc.data(p, TEXT_SOURCE_KEY), None);
    }

    #[test]
    fn test_scope_value_wins() {
        let mut doc = Document::parse("<li>{{item.name}}</li>").unwrap();
        let li = first_element(&doc);
        let model = Value::from(json!({"item": {"name": "model"}}));
        let scope = Scope::new().with("item", Value::from(json!({"name": "scope"})));
        apply_interpolations(&mut doc, li, &model, &scope).unwrap();
        assert_eq!(doc.to_markup(), "<li>scope</li>");
    }
}

/*
 * render_tests.rs
 * Copyright (c) 2025 Posit, PBC
 *
 * End-to-end render tests against the in-memory document, using test
 * fixtures.
 */

use canopy::{Engine, Scope, Value, resolve};
use canopy_dom::{Document, HostTree, NodeId};
use pretty_assertions::assert_eq;
use serde_json::json;
use std::path::{Path, PathBuf};

/// Helper to get the path to test fixtures
fn fixture_path(name: &str) -> PathBuf {
    let manifest_dir = env!("CARGO_MANIFEST_DIR");
    Path::new(manifest_dir).join("test-fixtures").join(name)
}

/// Helper to load a template document from fixtures
fn load_document(name: &str) -> Document {
    let path = fixture_path(name);
    let markup = std::fs::read_to_string(&path)
        .unwrap_or_else(|_| panic!("Failed to read fixture: {}", name));
    Document::parse(&markup).unwrap_or_else(|e| panic!("Failed to parse {}: {}", name, e))
}

fn load_model(name: &str) -> Value {
    let text = std::fs::read_to_string(fixture_path(name)).unwrap();
    serde_json::from_str(&text).unwrap()
}

fn render(engine: &mut Engine, doc: &mut Document, model: &Value) {
    let root = doc.root();
    engine.render(doc, root, model, &Scope::new()).unwrap();
}

fn is_generated(doc: &Document, node: NodeId) -> bool {
    doc.attribute(node, "data-generated") == Some("true")
}

/// Direct text of the generated children of `parent`.
fn generated_texts(doc: &Document, parent: NodeId) -> Vec<String> {
    doc.child_elements(parent)
        .into_iter()
        .filter(|n| is_generated(doc, *n))
        .map(|n| doc.direct_text(n))
        .collect()
}

#[test]
fn test_render_is_idempotent() {
    let mut doc = load_document("todo.html");
    let model = load_model("todo.json");
    let mut engine = Engine::default();

    render(&mut engine, &mut doc, &model);
    let once = doc.to_markup();
    render(&mut engine, &mut doc, &model);
    render(&mut engine, &mut doc, &model);

    assert_eq!(doc.to_markup(), once);
}

#[test]
fn test_todo_fixture() {
    let mut doc = load_document("todo.html");
    let model = load_model("todo.json");
    let mut engine = Engine::default();
    render(&mut engine, &mut doc, &model);

    let title = doc.get_element_by_id("title").unwrap();
    assert_eq!(doc.direct_text(title), "Groceries");
    assert_eq!(doc.attribute(title, "title"), Some("Groceries"));

    let list = doc.get_element_by_id("list").unwrap();
    assert_eq!(generated_texts(&doc, list), vec!["milk", "eggs"]);

    let items: Vec<NodeId> = doc
        .child_elements(list)
        .into_iter()
        .filter(|n| is_generated(&doc, *n))
        .collect();
    assert_eq!(doc.attribute(items[0], "class"), Some("todo closed"));
    assert_eq!(doc.attribute(items[1], "class"), Some("todo open"));
    assert_eq!(
        doc.serialize(doc.child_elements(items[0])[0]),
        r#"<span class="done" data-generated="true">done</span>"#
    );
    assert!(doc.child_elements(items[1]).is_empty());

    let app = doc.get_element_by_id("app").unwrap();
    assert!(generated_texts(&doc, app).is_empty());
}

#[test]
fn test_path_precedence() {
    let scope = Scope::new().with("x", 2);
    assert_eq!(
        resolve("x", &Value::from(json!({"x": 1})), &scope),
        Some(&Value::Number(2.0))
    );
    assert_eq!(
        resolve("a.b", &Value::from(json!({"a": {"b": 5}})), &Scope::new()),
        Some(&Value::Number(5.0))
    );
    assert_eq!(
        resolve("a.b", &Value::from(json!({"a": null})), &Scope::new()),
        None
    );
}

#[test]
fn test_interpolation_round_trip() {
    let mut doc = Document::parse(r#"<p id="greeting">Hello {{name}}</p>"#).unwrap();
    let mut engine = Engine::default();
    let greeting = doc.get_element_by_id("greeting").unwrap();

    render(&mut engine, &mut doc, &Value::from(json!({"name": "Ada"})));
    assert_eq!(doc.direct_text(greeting), "Hello Ada");

    render(&mut engine, &mut doc, &Value::from(json!({"name": "Grace"})));
    assert_eq!(doc.direct_text(greeting), "Hello Grace");
    assert_eq!(doc.to_markup(), r#"<p id="greeting">Hello Grace</p>"#);
}

#[test]
fn test_repeat_fragment_count() {
    let markup = r#"<div id="out"><each of="items" as="x"><b>{{x.n}}</b><i>{{x.n}}</i></each></div>"#;

    let mut doc = Document::parse(markup).unwrap();
    let mut engine = Engine::default();
    render(
        &mut engine,
        &mut doc,
        &Value::from(json!({"items": [{"n": 1}, {"n": 2}]})),
    );
    let out = doc.get_element_by_id("out").unwrap();
    assert_eq!(generated_texts(&doc, out), vec!["1", "1", "2", "2"]);

    render(&mut engine, &mut doc, &Value::from(json!({})));
    assert!(generated_texts(&doc, out).is_empty());
}

#[test]
fn test_conditional_toggle() {
    let mut doc = Document::parse(r#"<div id="out"><if test="flag"><b>one</b><i>two</i></if></div>"#)
        .unwrap();
    let mut engine = Engine::default();
    let out = doc.get_element_by_id("out").unwrap();

    render(&mut engine, &mut doc, &Value::from(json!({"flag": false})));
    assert!(generated_texts(&doc, out).is_empty());

    render(&mut engine, &mut doc, &Value::from(json!({"flag": true})));
    assert_eq!(generated_texts(&doc, out), vec!["one", "two"]);

    render(&mut engine, &mut doc, &Value::from(json!({"flag": false})));
    assert!(generated_texts(&doc, out).is_empty());
}

/// Deepest chain of nested `li` elements below `node`.
fn li_depth(doc: &Document, node: NodeId) -> usize {
    doc.child_elements(node)
        .into_iter()
        .map(|child| {
            let below = li_depth(doc, child);
            if doc.tag_name(child) == Some("li") {
                below + 1
            } else {
                below
            }
        })
        .max()
        .unwrap_or(0)
}

fn count_tag(doc: &Document, node: NodeId, tag: &str) -> usize {
    doc.child_elements(node)
        .into_iter()
        .map(|child| usize::from(doc.tag_name(child) == Some(tag)) + count_tag(doc, child, tag))
        .sum()
}

#[test]
fn test_recursive_template_follows_data_depth() {
    let mut doc = load_document("tree.html");
    let mut engine = Engine::default();
    let model = Value::from(json!({"root": {"children": [
        {"label": "a", "children": []},
        {"label": "b", "children": [{"label": "c", "children": []}]}
    ]}}));

    render(&mut engine, &mut doc, &model);

    let generated: Vec<NodeId> = doc
        .child_elements(doc.root())
        .into_iter()
        .filter(|n| is_generated(&doc, *n))
        .collect();
    // The definition expands in place over the (absent) top-level
    // `children`, then the reference expands the real tree.
    assert_eq!(generated.len(), 2);
    assert!(doc.child_elements(generated[0]).is_empty());

    let tree = generated[1];
    assert_eq!(li_depth(&doc, tree), 2);
    assert_eq!(count_tag(&doc, tree, "li"), 3);
    // Every item holds a list for its own children, leaves included.
    assert_eq!(count_tag(&doc, tree, "ul"), 3);

    // Deeper data renders deeper.
    let model = Value::from(json!({"root": {"children": [
        {"label": "a", "children": [{"label": "b", "children": [{"label": "c", "children": [
            {"label": "d", "children": []}
        ]}]}]}
    ]}}));
    render(&mut engine, &mut doc, &model);
    let tree = doc
        .child_elements(doc.root())
        .into_iter()
        .filter(|n| is_generated(&doc, *n))
        .nth(1)
        .unwrap();
    assert_eq!(li_depth(&doc, tree), 4);
}

#[test]
fn test_engines_do_not_share_registries() {
    let mut defining = load_document("tree.html");
    let mut engine = Engine::default();
    let model = Value::from(json!({"root": {"children": [{"label": "a", "children": []}]}}));
    render(&mut engine, &mut defining, &model);
    assert!(engine.registry().contains("node"));

    let mut using = Document::parse(r#"<recursive-template use="node" of="root.children"/>"#).unwrap();
    let mut fresh = Engine::default();
    render(&mut fresh, &mut using, &model);
    assert_eq!(
        using.to_markup(),
        r#"<recursive-template use="node" of="root.children" hidden=""/>"#
    );

    // The engine that saw the definition can instantiate it elsewhere.
    let mut again = Document::parse(r#"<recursive-template use="node" of="root.children"/>"#).unwrap();
    render(&mut engine, &mut again, &model);
    assert_eq!(count_tag(&again, again.root(), "li"), 1);
}

#[test]
fn test_hand_written_markup_is_never_swept() {
    let mut doc = Document::parse(
        r#"<ul id="list"><li>static</li><each of="xs"><li>{{item}}</li></each><li>footer</li></ul>"#,
    )
    .unwrap();
    let mut engine = Engine::default();
    let list = doc.get_element_by_id("list").unwrap();

    for xs in [json!(["a", "b"]), json!([]), json!(["c"])] {
        render(&mut engine, &mut doc, &Value::from(json!({ "xs": xs })));
    }

    let texts: Vec<String> = doc
        .child_elements(list)
        .into_iter()
        .filter(|n| doc.tag_name(*n) == Some("li"))
        .map(|n| doc.direct_text(n))
        .collect();
    assert_eq!(texts, vec!["static", "c", "footer"]);
}

#[test]
fn test_use_before_definition_resolves_on_next_render() {
    let mut doc = Document::parse(concat!(
        r#"<div id="out">"#,
        r#"<recursive-template use="row" of="xs"/>"#,
        r#"<recursive-template name="row" of="ys"><each of-rec="row"><i>{{item}}</i></each></recursive-template>"#,
        r#"</div>"#,
    ))
    .unwrap();
    let mut engine = Engine::default();
    let model = Value::from(json!({"xs": ["a", "b"], "ys": []}));
    let out = doc.get_element_by_id("out").unwrap();

    render(&mut engine, &mut doc, &model);
    assert!(generated_texts(&doc, out).is_empty());

    render(&mut engine, &mut doc, &model);
    assert_eq!(generated_texts(&doc, out), vec!["a", "b"]);
}

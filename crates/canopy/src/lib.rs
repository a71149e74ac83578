/*
 * lib.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Declarative tree templating with reactive re-rendering.
//!
//! Templates are ordinary markup trees in which a few reserved tags act as
//! directives:
//!
//! - `<each of="items" as="x">`: repeat the children once per element
//! - `<if test="flag">`: include the children when the value is truthy
//! - `<recursive-template name="node" of="children">` and
//!   `<recursive-template use="node" of="x.children">`: define a named
//!   fragment and instantiate it again, to any depth
//!
//! Text and attribute values may contain `{{ path }}` tokens, resolved
//! against the current scope first and the model second.
//!
//! # Architecture
//!
//! The engine works on any tree implementing
//! [`canopy_dom::HostTree`]. An [`Engine`] owns the state that outlives one
//! render: the [`EngineConfig`], the recursive template [`Registry`] and the
//! [`ExpansionCache`]. [`Engine::render`] sweeps the nodes it generated last
//! time and regenerates them, so it can run again whenever the model
//! changes. [`wrap`] provides the change notifications: every write through
//! a [`Reactive`] handle calls a listener, which typically re-renders.
//!
//! # Example
//!
//! ```rust
//! use canopy::{Engine, Scope, Value};
//! use canopy_dom::Document;
//!
//! let mut doc = Document::parse(
//!     r#"<ul><each of="items" as="x"><li>{{x.name}}</li></each></ul>"#,
//! ).unwrap();
//! let model = Value::from(serde_json::json!({
//!     "items": [{"name": "milk"}, {"name": "eggs"}]
//! }));
//!
//! let mut engine = Engine::default();
//! let root = doc.root();
//! engine.render(&mut doc, root, &model, &Scope::new()).unwrap();
//!
//! assert_eq!(
//!     doc.to_markup(),
//!     concat!(
//!         r#"<ul><li data-generated="true">milk</li><li data-generated="true">eggs</li>"#,
//!         r#"<each of="items" as="x" hidden=""><li>{{x.name}}</li></each></ul>"#,
//!     )
//! );
//! ```

pub mod cache;
pub mod config;
pub mod directive;
pub mod engine;
pub mod error;
pub mod expand;
pub mod interpolate;
pub mod reactive;
pub mod registry;
pub mod resolve;
pub mod scope;
pub mod template;
pub mod value;

// Re-export main types at crate root
pub use cache::{CacheStats, ExpansionCache};
pub use config::{DirectiveKind, EngineConfig};
pub use engine::{Engine, RenderStats};
pub use error::{EngineError, EngineResult, ModelError};
pub use interpolate::{apply_interpolations, has_tokens, interpolate_text};
pub use reactive::{Entry, PathSegment, Reactive, wrap};
pub use registry::{Instantiation, RecursiveEntry, Registry};
pub use resolve::resolve;
pub use scope::Scope;
pub use template::{Fragment, TemplateNode, compile};
pub use value::Value;

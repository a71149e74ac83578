/*
 * lib.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Host tree API for the canopy template engine.
//!
//! The engine never touches a concrete tree type. It talks to its host through
//! the [`HostTree`] trait: create elements, read and write attributes, walk
//! direct children, insert and remove nodes, and stash strings in a per-node
//! data bag.
//!
//! This crate also ships [`Document`], an arena-backed in-memory tree that
//! implements [`HostTree`], together with a markup reader built on
//! [`quick-xml`] and a writer.
//!
//! # Example
//!
//! ```rust
//! use canopy_dom::{Document, HostTree};
//!
//! let mut doc = Document::parse(r#"<ul id="list"><li>one</li></ul>"#).unwrap();
//! let list = doc.get_element_by_id("list").unwrap();
//!
//! let item = doc.create_element("li").unwrap();
//! doc.set_direct_text(item, "two").unwrap();
//! doc.append_child(list, item).unwrap();
//!
//! assert_eq!(doc.to_markup(), r#"<ul id="list"><li>one</li><li>two</li></ul>"#);
//! ```

pub mod document;
pub mod error;
pub mod host;
pub mod parser;
pub mod writer;

pub use document::{Document, NodeId};
pub use error::{DomError, Result};
pub use host::{HostTree, TreeId, is_valid_attribute_name, is_valid_tag_name};

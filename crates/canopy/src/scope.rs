/*
 * scope.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Lexical scopes for expansion.
//!
//! Every REPEAT iteration and every recursive template instantiation opens a
//! new [`Scope`] layered over the enclosing one. A child only holds its own
//! bindings and borrows its parent, so opening a frame never copies the
//! bindings above it.

use crate::value::Value;
use std::borrow::Cow;
use std::collections::HashMap;

/// Variable bindings for one expansion frame.
#[derive(Debug, Default)]
pub struct Scope<'a> {
    /// Bindings at this level. Values bound from the model are borrowed.
    bindings: HashMap<String, Cow<'a, Value>>,

    /// Enclosing frame.
    parent: Option<&'a Scope<'a>>,
}

impl<'a> Scope<'a> {
    /// Create an empty top-level scope.
    pub fn new() -> Self {
        Self::default()
    }

    /// Open a frame layered over this one.
    pub fn child(&self) -> Scope<'_> {
        Scope {
            bindings: HashMap::new(),
            parent: Some(self),
        }
    }

    /// Bind `key` to a borrowed value.
    pub fn bind(&mut self, key: impl Into<String>, value: &'a Value) {
        self.bindings.insert(key.into(), Cow::Borrowed(value));
    }

    /// Bind `key` to an owned value.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.bindings.insert(key.into(), Cow::Owned(value.into()));
    }

    /// Builder-style [`insert`](Self::insert).
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(key, value);
        self
    }

    /// Look up `key` in this frame, then in the enclosing frames.
    pub fn get(&self, key: &str) -> Option<&Value> {
        match self.bindings.get(key) {
            Some(value) => Some(value.as_ref()),
            None => self.parent.and_then(|p| p.get(key)),
        }
    }

    /// Whether any frame binds `key`.
    pub fn contains(&self, key: &str) -> bool {
        self.bindings.contains_key(key) || self.parent.is_some_and(|p| p.contains(key))
    }

    /// Nesting depth: 0 for a top-level scope.
    pub fn depth(&self) -> usize {
        self.parent.map_or(0, |p| p.depth() + 1)
    }
}

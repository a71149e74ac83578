/*
 * registry.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Named recursive template fragments.
//!
//! A `recursive-template` with a `name` registers its children here; one
//! with `use` looks them up again, possibly from inside the fragment itself,
//! which is how tree-shaped data renders to any depth. Each
//! [`Engine`](crate::Engine) owns its own registry.

use crate::template::Fragment;
use indexmap::IndexMap;

/// A registered fragment and the source path it was defined with.
#[derive(Debug, Clone, PartialEq)]
pub struct RecursiveEntry {
    /// The `of` path given with the definition, if any.
    pub source: Option<String>,

    pub fragment: Fragment,
}

/// What an instantiation expands: the shared fragment and the effective
/// source path.
#[derive(Debug, Clone, PartialEq)]
pub struct Instantiation {
    pub fragment: Fragment,
    pub source: Option<String>,
}

/// Name to fragment table. Last writer wins.
#[derive(Debug, Clone, Default)]
pub struct Registry {
    entries: IndexMap<String, RecursiveEntry>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `entry` under `name`, returning the entry it replaced.
    pub fn register(&mut self, name: impl Into<String>, entry: RecursiveEntry) -> Option<RecursiveEntry> {
        self.entries.insert(name.into(), entry)
    }

    pub fn get(&self, name: &str) -> Option<&RecursiveEntry> {
        self.entries.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// Registered names, in order of first registration.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Prepare an instantiation of `name`.
    ///
    /// `of_override` replaces the source path recorded with the definition
    /// for this instantiation only; the registered entry is not modified.
    /// Returns `None` when nothing is registered under `name`.
    pub fn instantiate(&self, name: &str, of_override: Option<&str>) -> Option<Instantiation> {
        let entry = self.entries.get(name)?;
        Some(Instantiation {
            fragment: entry.fragment.clone(),
            source: of_override
                .map(str::to_string)
                .or_else(|| entry.source.clone()),
        })
    }
}

/// Scope key under which an instantiation of `name` binds its effective
/// source path.
pub fn source_binding(name: &str) -> String {
    format!("{}.of", name)
}

/*
 * cache.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Compiled templates, keyed by the host node they were compiled from.
//!
//! Node handles are per tree, so every key carries the [`TreeId`] of the
//! tree the node belongs to; one engine can render into several trees
//! without one tree's anchors hitting another's entries.
//!
//! Only shapes are cached (see [`TemplateNode`]); every expansion still
//! reads the current model and scope, so a hit can never produce stale
//! output. Entries are never evicted on their own.

use crate::template::TemplateNode;
use canopy_dom::TreeId;
use std::collections::HashMap;
use std::hash::Hash;
use std::rc::Rc;

/// Counters describing cache use.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub entries: usize,
    pub hits: u64,
    pub misses: u64,
}

/// Anchor node (within its tree) to compiled template.
#[derive(Debug)]
pub struct ExpansionCache<N> {
    entries: HashMap<(TreeId, N), Rc<TemplateNode>>,
    hits: u64,
    misses: u64,
}

impl<N> Default for ExpansionCache<N> {
    fn default() -> Self {
        Self {
            entries: HashMap::new(),
            hits: 0,
            misses: 0,
        }
    }
}

impl<N: Copy + Eq + Hash> ExpansionCache<N> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the template compiled for `anchor` of `tree`, compiling it on
    /// a miss.
    ///
    /// When `compile` yields nothing, nothing is stored.
    pub fn get_or_compile(
        &mut self,
        tree: TreeId,
        anchor: N,
        compile: impl FnOnce() -> Option<TemplateNode>,
    ) -> Option<Rc<TemplateNode>> {
        if let Some(template) = self.entries.get(&(tree, anchor)) {
            self.hits += 1;
            return Some(Rc::clone(template));
        }
        self.misses += 1;
        let template = Rc::new(compile()?);
        self.entries.insert((tree, anchor), Rc::clone(&template));
        Some(template)
    }

    pub fn contains(&self, tree: TreeId, anchor: N) -> bool {
        self.entries.contains_key(&(tree, anchor))
    }

    /// Drop the entry for one anchor.
    pub fn invalidate(&mut self, tree: TreeId, anchor: N) -> bool {
        self.entries.remove(&(tree, anchor)).is_some()
    }

    /// Drop every entry. Counters are kept.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            entries: self.entries.len(),
            hits: self.hits,
            misses: self.misses,
        }
    }
}

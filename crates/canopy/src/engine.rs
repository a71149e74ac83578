/*
 * engine.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! The engine and its render pass.
//!
//! An [`Engine`] owns everything that outlives a single render: the
//! configuration, the recursive template registry and the expansion cache.
//! Separate engines share nothing, so independent render roots cannot see
//! each other's named fragments.

use crate::cache::{CacheStats, ExpansionCache};
use crate::config::EngineConfig;
use crate::error::EngineResult;
use crate::interpolate::apply_interpolations;
use crate::registry::Registry;
use crate::scope::Scope;
use crate::value::Value;
use canopy_dom::{HostTree, NodeId};
use std::fmt::Debug;
use std::hash::Hash;
use tracing::{debug, debug_span, trace};

/// Counters for one render pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RenderStats {
    /// Directive anchors expanded.
    pub directives: usize,

    /// Top-level nodes inserted before anchors.
    pub generated: usize,

    /// Previously generated nodes removed.
    pub swept: usize,
}

/// Template engine state for one family of render roots.
///
/// `N` is the host's node handle type; it defaults to the in-memory
/// document's [`NodeId`].
#[derive(Debug)]
pub struct Engine<N = NodeId> {
    pub(crate) config: EngineConfig,
    pub(crate) registry: Registry,
    pub(crate) cache: ExpansionCache<N>,

    /// Current nesting of recursive template instantiations.
    pub(crate) depth: usize,
}

impl<N: Copy + Eq + Hash + Debug> Default for Engine<N> {
    fn default() -> Self {
        Self {
            config: EngineConfig::default(),
            registry: Registry::new(),
            cache: ExpansionCache::new(),
            depth: 0,
        }
    }
}

impl<N: Copy + Eq + Hash + Debug> Engine<N> {
    /// Create an engine with the given configuration.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Config`](crate::EngineError::Config) if the
    /// configuration does not validate.
    pub fn new(config: EngineConfig) -> EngineResult<Self> {
        config.validate()?;
        Ok(Self {
            config,
            ..Self::default()
        })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }

    /// Forget every compiled template. Needed only when the host rewrites
    /// the markup inside a directive anchor.
    pub fn clear_cache(&mut self) {
        self.cache.clear();
    }

    /// Render the output tree under `root` against `model`.
    ///
    /// For each direct element child of `root`:
    ///
    /// - a directive anchor has the nodes it generated last time swept away,
    ///   is expanded afresh, gets its expansion inserted right before it, and
    ///   is marked hidden. The anchor itself is never removed.
    /// - a generated node is skipped (its anchor sweeps it).
    /// - any other element is interpolated in place and rendered
    ///   recursively.
    ///
    /// Rendering twice without changing the model gives the same tree.
    ///
    /// # Errors
    ///
    /// Propagates host tree failures, such as an invalid tag in a template.
    pub fn render<H>(
        &mut self,
        host: &mut H,
        root: N,
        model: &Value,
        scope: &Scope<'_>,
    ) -> EngineResult<RenderStats>
    where
        H: HostTree<Node = N>,
    {
        let span = debug_span!("render");
        let _enter = span.enter();

        self.depth = 0;
        let mut stats = RenderStats::default();
        self.render_children(host, root, model, scope, &mut stats)?;

        debug!(
            directives = stats.directives,
            generated = stats.generated,
            swept = stats.swept,
            "render complete"
        );
        Ok(stats)
    }

    fn render_children<H>(
        &mut self,
        host: &mut H,
        parent: N,
        model: &Value,
        scope: &Scope<'_>,
        stats: &mut RenderStats,
    ) -> EngineResult<()>
    where
        H: HostTree<Node = N>,
    {
        for child in host.child_elements(parent) {
            if self.is_generated(host, child) {
                continue;
            }
            let is_directive = host
                .tag_name(child)
                .is_some_and(|tag| self.config.directive_kind(tag).is_some());

            if is_directive {
                self.render_anchor(host, parent, child, model, scope, stats)?;
            } else {
                apply_interpolations(host, child, model, scope)?;
                self.render_children(host, child, model, scope, stats)?;
            }
        }
        Ok(())
    }

    fn render_anchor<H>(
        &mut self,
        host: &mut H,
        parent: N,
        anchor: N,
        model: &Value,
        scope: &Scope<'_>,
        stats: &mut RenderStats,
    ) -> EngineResult<()>
    where
        H: HostTree<Node = N>,
    {
        stats.swept += self.sweep(host, anchor)?;

        trace!(anchor = ?anchor, "expanding directive");

        let nodes = self.expand_node(host, anchor, model, scope)?;
        stats.directives += 1;
        stats.generated += nodes.len();
        for node in nodes {
            host.insert_before(parent, node, anchor)?;
        }
        host.set_attribute(anchor, &self.config.hidden_attribute, "")?;
        Ok(())
    }

    /// Remove the run of generated nodes directly before `anchor`.
    fn sweep<H>(&self, host: &mut H, anchor: N) -> EngineResult<usize>
    where
        H: HostTree<Node = N>,
    {
        let mut swept = 0;
        while let Some(previous) = host.previous_sibling(anchor) {
            if !self.is_generated(host, previous) {
                break;
            }
            host.remove(previous)?;
            swept += 1;
        }
        Ok(swept)
    }

    pub(crate) fn is_generated<H>(&self, host: &H, node: N) -> bool
    where
        H: HostTree<Node = N>,
    {
        host.attribute(node, &self.config.generated_attribute) == Some("true")
    }
}

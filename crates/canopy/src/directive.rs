/*
 * directive.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Directive handlers: REPEAT, CONDITIONAL and RECURSIVE-TEMPLATE.
//!
//! A directive with missing attributes degrades to its empty case (an empty
//! sequence, a false test, an unresolved reference); handlers never fail on
//! their own and only pass host tree errors through.

use crate::engine::Engine;
use crate::error::EngineResult;
use crate::registry::{RecursiveEntry, source_binding};
use crate::resolve::resolve;
use crate::scope::Scope;
use crate::template::{ConditionalTemplate, RecursiveTemplate, RepeatSource, RepeatTemplate};
use crate::value::Value;
use canopy_dom::HostTree;
use std::fmt::Debug;
use std::hash::Hash;
use std::rc::Rc;
use tracing::{trace, warn};

impl<N: Copy + Eq + Hash + Debug> Engine<N> {
    /// REPEAT: expand the children once per element of the source sequence,
    /// each time under a new frame binding the element.
    pub(crate) fn expand_repeat<H>(
        &mut self,
        host: &mut H,
        repeat: &RepeatTemplate,
        model: &Value,
        scope: &Scope<'_>,
    ) -> EngineResult<Vec<N>>
    where
        H: HostTree<Node = N>,
    {
        let Some(path) = self.repeat_path(&repeat.source, scope) else {
            return Ok(Vec::new());
        };

        let items: &[Value] = match resolve(&path, model, scope) {
            Some(Value::List(items)) => items,
            Some(other) => {
                trace!(path = %path, kind = other.kind(), "repeat source is not a sequence");
                &[]
            }
            None => &[],
        };

        let binding = repeat
            .binding
            .clone()
            .unwrap_or_else(|| self.config.default_binding.clone());

        let mut nodes = Vec::new();
        for item in items {
            let mut frame = scope.child();
            frame.bind(binding.as_str(), item);
            nodes.extend(self.expand_fragment(host, &repeat.children, model, &frame)?);
        }
        Ok(nodes)
    }

    /// The path a REPEAT iterates. For `of-rec="name"` that is the path the
    /// enclosing instantiation of `name` bound, or failing that, the path
    /// `name` was defined with.
    fn repeat_path(&self, source: &RepeatSource, scope: &Scope<'_>) -> Option<String> {
        match source {
            RepeatSource::Path(path) => Some(path.clone()),
            RepeatSource::Recursive(name) => scope
                .get(&source_binding(name))
                .and_then(Value::as_str)
                .map(str::to_string)
                .or_else(|| self.registry.get(name).and_then(|e| e.source.clone())),
            RepeatSource::Missing => None,
        }
    }

    /// CONDITIONAL: expand the children under the unchanged scope when the
    /// test resolves to a truthy value.
    pub(crate) fn expand_conditional<H>(
        &mut self,
        host: &mut H,
        conditional: &ConditionalTemplate,
        model: &Value,
        scope: &Scope<'_>,
    ) -> EngineResult<Vec<N>>
    where
        H: HostTree<Node = N>,
    {
        let truthy = conditional
            .test
            .as_deref()
            .and_then(|test| resolve(test, model, scope))
            .is_some_and(Value::is_truthy);

        if truthy {
            self.expand_fragment(host, &conditional.children, model, scope)
        } else {
            Ok(Vec::new())
        }
    }

    /// RECURSIVE-TEMPLATE.
    ///
    /// - `name`: register the children, then expand them in place with
    ///   `"<name>.of"` bound to `of`.
    /// - `use` without `name`: instantiate the registered fragment.
    /// - neither: expand the children as a transparent group.
    pub(crate) fn expand_recursive<H>(
        &mut self,
        host: &mut H,
        recursive: &RecursiveTemplate,
        model: &Value,
        scope: &Scope<'_>,
    ) -> EngineResult<Vec<N>>
    where
        H: HostTree<Node = N>,
    {
        if let Some(name) = &recursive.name {
            self.registry.register(
                name.clone(),
                RecursiveEntry {
                    source: recursive.of.clone(),
                    fragment: Rc::clone(&recursive.children),
                },
            );
            let mut frame = scope.child();
            if let Some(of) = &recursive.of {
                frame.insert(source_binding(name), of.as_str());
            }
            return self.expand_fragment(host, &recursive.children, model, &frame);
        }

        match &recursive.reference {
            Some(target) => self.instantiate(host, target, recursive.of.as_deref(), model, scope),
            None => self.expand_fragment(host, &recursive.children, model, scope),
        }
    }

    /// Expand the fragment registered under `name`.
    ///
    /// The effective source path is `of_override` when given, else the path
    /// recorded with the definition; it is bound as `"<name>.of"` for the
    /// fragment's `of-rec` repeats. An unregistered name expands to nothing.
    /// Past `max_recursion_depth` nested instantiations, this logs a warning
    /// and expands to nothing.
    ///
    /// # Errors
    ///
    /// Propagates host tree failures.
    pub fn instantiate<H>(
        &mut self,
        host: &mut H,
        name: &str,
        of_override: Option<&str>,
        model: &Value,
        scope: &Scope<'_>,
    ) -> EngineResult<Vec<N>>
    where
        H: HostTree<Node = N>,
    {
        let Some(instance) = self.registry.instantiate(name, of_override) else {
            trace!(name, "recursive template is not registered");
            return Ok(Vec::new());
        };

        if self.depth >= self.config.max_recursion_depth {
            warn!(
                name,
                max_depth = self.config.max_recursion_depth,
                "recursive template nested too deeply, expanding to nothing"
            );
            return Ok(Vec::new());
        }

        let mut frame = scope.child();
        if let Some(source) = instance.source {
            frame.insert(source_binding(name), source);
        }

        self.depth += 1;
        let result = self.expand_fragment(host, &instance.fragment, model, &frame);
        self.depth -= 1;
        result
    }
}

/*
 * resolve.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Dotted-path lookup against a model and a scope.

use crate::scope::Scope;
use crate::value::Value;

/// Resolve a dot-separated path.
///
/// The first segment is looked up in `scope` when any frame binds it, and in
/// `model` otherwise. Each further segment indexes into the value found so
/// far: a key of a mapping, or a decimal index into a sequence.
///
/// Returns `None` when any segment is missing, when an intermediate value is
/// a scalar or null, and for empty paths or empty segments. Never fails.
///
/// ```rust
/// use canopy::{Scope, Value, resolve};
///
/// let model = Value::from(serde_json::json!({"x": 1, "a": {"b": 5}}));
/// let scope = Scope::new().with("x", 2);
///
/// assert_eq!(resolve("x", &model, &scope), Some(&Value::Number(2.0)));
/// assert_eq!(resolve("a.b", &model, &scope), Some(&Value::Number(5.0)));
/// assert_eq!(resolve("a.c", &model, &scope), None);
/// ```
pub fn resolve<'v>(path: &str, model: &'v Value, scope: &'v Scope<'_>) -> Option<&'v Value> {
    let mut segments = path.split('.');
    let first = segments.next().filter(|s| !s.is_empty())?;

    let mut current = match scope.get(first) {
        Some(value) => value,
        None => model.get_key(first)?,
    };

    for segment in segments {
        if segment.is_empty() {
            return None;
        }
        current = current.get_key(segment)?;
    }

    Some(current)
}

/*
 * reactive.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Observable model container.
//!
//! [`wrap`] takes ownership of a model and a change listener and hands back a
//! [`Reactive`] handle. Handles are cheap: a shared pointer to the model plus
//! a path into it. Reading a mapping or sequence through a handle gives
//! another handle (wrapped lazily, sharing the same listener); reading a
//! scalar gives a copy of it.
//!
//! Every successful write calls the listener synchronously, exactly once,
//! with the whole model, before the write returns. There is no batching.
//!
//! # Invariants
//!
//! 1. A failed write leaves the model unchanged and does not call the
//!    listener.
//! 2. Writes from inside the listener are rejected with
//!    [`ModelError::Reentrant`].
//! 3. A handle addresses its value by path, so it sees replacements made
//!    through other handles; once its path no longer exists, writes through
//!    it fail with [`ModelError::StalePath`].

use crate::error::ModelError;
use crate::value::{Value, parse_index};
use std::cell::{Cell, RefCell};
use std::cmp::Ordering;
use std::fmt;
use std::rc::Rc;
use tracing::trace;

type Listener = Box<dyn FnMut(&Value)>;

struct Shared {
    value: RefCell<Value>,
    listener: RefCell<Listener>,
    notifying: Cell<bool>,
}

/// One step of a handle's path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathSegment {
    Key(String),
    Index(usize),
}

impl fmt::Display for PathSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PathSegment::Key(key) => f.write_str(key),
            PathSegment::Index(index) => write!(f, "{}", index),
        }
    }
}

/// The result of reading one key through a [`Reactive`] handle.
#[derive(Debug)]
pub enum Entry {
    /// A scalar, copied out.
    Value(Value),

    /// A mapping or sequence, wrapped.
    Nested(Reactive),
}

impl Entry {
    pub fn into_value(self) -> Option<Value> {
        match self {
            Entry::Value(value) => Some(value),
            Entry::Nested(_) => None,
        }
    }

    pub fn into_nested(self) -> Option<Reactive> {
        match self {
            Entry::Nested(handle) => Some(handle),
            Entry::Value(_) => None,
        }
    }
}

/// A handle to (part of) an observed model.
#[derive(Clone)]
pub struct Reactive {
    shared: Rc<Shared>,
    path: Vec<PathSegment>,
}

impl fmt::Debug for Reactive {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Reactive")
            .field("path", &self.path())
            .finish_non_exhaustive()
    }
}

/// Wrap `model` so that every write through the returned handle, or any
/// handle derived from it, calls `on_change`.
///
/// ```rust
/// use canopy::{Value, wrap};
/// use std::cell::Cell;
/// use std::rc::Rc;
///
/// let calls = Rc::new(Cell::new(0));
/// let counter = Rc::clone(&calls);
/// let model = wrap(Value::from(serde_json::json!({"items": []})), move |_| {
///     counter.set(counter.get() + 1);
/// });
///
/// model.set("title", "Todo").unwrap();
/// model.nested("items").unwrap().push("milk").unwrap();
/// assert_eq!(calls.get(), 2);
/// ```
pub fn wrap(model: Value, on_change: impl FnMut(&Value) + 'static) -> Reactive {
    Reactive {
        shared: Rc::new(Shared {
            value: RefCell::new(model),
            listener: RefCell::new(Box::new(on_change)),
            notifying: Cell::new(false),
        }),
        path: Vec::new(),
    }
}

impl Reactive {
    /// The handle's path, dot-separated. Empty for the root handle.
    pub fn path(&self) -> String {
        self.path
            .iter()
            .map(|segment| segment.to_string())
            .collect::<Vec<_>>()
            .join(".")
    }

    /// A handle to the whole model.
    pub fn root(&self) -> Reactive {
        Reactive {
            shared: Rc::clone(&self.shared),
            path: Vec::new(),
        }
    }

    /// Run `f` on the current value, or return `None` if the handle's path no
    /// longer exists.
    pub fn with_value<R>(&self, f: impl FnOnce(&Value) -> R) -> Option<R> {
        let root = self.shared.value.borrow();
        locate(&root, &self.path).map(f)
    }

    /// A copy of the current value.
    pub fn snapshot(&self) -> Option<Value> {
        self.with_value(Value::clone)
    }

    /// Number of entries of a mapping or sequence; 0 for anything else.
    pub fn len(&self) -> usize {
        self.with_value(|value| match value {
            Value::List(items) => items.len(),
            Value::Map(map) => map.len(),
            _ => 0,
        })
        .unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Read one key: a mapping key, or a decimal index into a sequence.
    pub fn get(&self, key: &str) -> Option<Entry> {
        let root = self.shared.value.borrow();
        let target = locate(&root, &self.path)?;
        let (segment, child) = match target {
            Value::Map(map) => (PathSegment::Key(key.to_string()), map.get(key)?),
            Value::List(items) => {
                let index = parse_index(key)?;
                (PathSegment::Index(index), items.get(index)?)
            }
            _ => return None,
        };

        if child.is_container() {
            Some(Entry::Nested(self.child(segment)))
        } else {
            Some(Entry::Value(child.clone()))
        }
    }

    /// Follow a dotted path of keys to a nested mapping or sequence.
    pub fn nested(&self, path: &str) -> Option<Reactive> {
        path.split('.')
            .try_fold(self.clone(), |handle, key| handle.get(key)?.into_nested())
    }

    /// Set `key` on a mapping (adding it if new), or replace the element at
    /// index `key` of a sequence. Setting the index one past the end
    /// appends.
    pub fn set(&self, key: &str, value: impl Into<Value>) -> Result<(), ModelError> {
        let value = value.into();
        self.write(|target| match target {
            Value::Map(map) => {
                map.insert(key.to_string(), value);
                Ok(())
            }
            Value::List(items) => {
                let index = parse_index(key).ok_or_else(|| ModelError::InvalidIndex {
                    key: key.to_string(),
                })?;
                match index.cmp(&items.len()) {
                    Ordering::Less => items[index] = value,
                    Ordering::Equal => items.push(value),
                    Ordering::Greater => {
                        return Err(ModelError::OutOfBounds {
                            index,
                            len: items.len(),
                        });
                    }
                }
                Ok(())
            }
            _ => Err(ModelError::NotAContainer { path: self.path() }),
        })
    }

    /// Append to a sequence.
    pub fn push(&self, value: impl Into<Value>) -> Result<(), ModelError> {
        let value = value.into();
        self.write(|target| match target {
            Value::List(items) => {
                items.push(value);
                Ok(())
            }
            _ => Err(ModelError::NotASequence { path: self.path() }),
        })
    }

    /// Insert into a sequence at `index`, shifting later elements.
    pub fn insert(&self, index: usize, value: impl Into<Value>) -> Result<(), ModelError> {
        let value = value.into();
        self.write(|target| match target {
            Value::List(items) if index <= items.len() => {
                items.insert(index, value);
                Ok(())
            }
            Value::List(items) => Err(ModelError::OutOfBounds {
                index,
                len: items.len(),
            }),
            _ => Err(ModelError::NotASequence { path: self.path() }),
        })
    }

    /// Remove a mapping key or a sequence element, returning it. Mappings
    /// keep the order of the remaining keys.
    pub fn remove(&self, key: &str) -> Result<Value, ModelError> {
        self.write(|target| match target {
            Value::Map(map) => map.shift_remove(key).ok_or_else(|| ModelError::MissingKey {
                key: key.to_string(),
            }),
            Value::List(items) => {
                let index = parse_index(key).ok_or_else(|| ModelError::InvalidIndex {
                    key: key.to_string(),
                })?;
                if index < items.len() {
                    Ok(items.remove(index))
                } else {
                    Err(ModelError::OutOfBounds {
                        index,
                        len: items.len(),
                    })
                }
            }
            _ => Err(ModelError::NotAContainer { path: self.path() }),
        })
    }

    /// Replace the value this handle points at, returning the old one.
    pub fn replace(&self, value: impl Into<Value>) -> Result<Value, ModelError> {
        let value = value.into();
        self.write(|target| Ok(std::mem::replace(target, value)))
    }

    fn child(&self, segment: PathSegment) -> Reactive {
        let mut path = self.path.clone();
        path.push(segment);
        Reactive {
            shared: Rc::clone(&self.shared),
            path,
        }
    }

    fn write<T>(
        &self,
        op: impl FnOnce(&mut Value) -> Result<T, ModelError>,
    ) -> Result<T, ModelError> {
        if self.shared.notifying.get() {
            return Err(ModelError::Reentrant);
        }
        let output = {
            let mut root = self
                .shared
                .value
                .try_borrow_mut()
                .map_err(|_| ModelError::Reentrant)?;
            let target = locate_mut(&mut root, &self.path)
                .ok_or_else(|| ModelError::StalePath { path: self.path() })?;
            op(target)?
        };
        self.notify();
        Ok(output)
    }

    fn notify(&self) {
        trace!(path = %self.path(), "model changed");
        let _notifying = NotifyingGuard::enter(&self.shared.notifying);
        let model: &Value = &self.shared.value.borrow();
        let mut listener = self.shared.listener.borrow_mut();
        (*listener)(model);
    }
}

/// Marks the listener as running until dropped.
struct NotifyingGuard<'a>(&'a Cell<bool>);

impl<'a> NotifyingGuard<'a> {
    fn enter(flag: &'a Cell<bool>) -> Self {
        flag.set(true);
        Self(flag)
    }
}

impl Drop for NotifyingGuard<'_> {
    fn drop(&mut self) {
        self.0.set(false);
    }
}

fn locate<'v>(root: &'v Value, path: &[PathSegment]) -> Option<&'v Value> {
    path.iter().try_fold(root, |current, segment| match (segment, current) {
        (PathSegment::Key(key), Value::Map(map)) => map.get(key),
        (PathSegment::Index(index), Value::List(items)) => items.get(*index),
        _ => None,
    })
}

fn locate_mut<'v>(root: &'v mut Value, path: &[PathSegment]) -> Option<&'v mut Value> {
    path.iter().try_fold(root, |current, segment| match (segment, current) {
        (PathSegment::Key(key), Value::Map(map)) => map.get_mut(key),
        (PathSegment::Index(index), Value::List(items)) => items.get_mut(*index),
        _ => None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    /// Wrap a model with a listener that counts its calls.
    fn counted(model: serde_json::Value) -> (Reactive, Rc<Cell<usize>>) {
        let calls = Rc::new(Cell::new(0));
        let counter = Rc::clone(&calls);
        let handle = wrap(Value::from(model), move |_| counter.set(counter.get() + 1));
        (handle, calls)
    }

    #[test]
    fn test_top_level_set_notifies_once() {
        let (model, calls) = counted(json!({"name": "Ada"}));
        model.set("name", "Grace").unwrap();
        assert_eq!(calls.get(), 1);
        assert_eq!(model.get("name").and_then(Entry::into_value), Some(Value::from("Grace")));
    }

    #[test]
    fn test_nested_set_notifies_once() {
        let (model, calls) = counted(json!({"user": {"address": {"city": "Paris"}}}));
        let address = model.nested("user.address").unwrap();
        assert_eq!(address.path(), "user.address");

        address.set("city", "Oslo").unwrap();
        assert_eq!(calls.get(), 1);
        assert_eq!(
            model.snapshot(),
            Some(Value::from(json!({"user": {"address": {"city": "Oslo"}}})))
        );
    }

    #[test]
    fn test_push_notifies_once() {
        let (model, calls) = counted(json!({"items": [1]}));
        let items = model.get("items").and_then(Entry::into_nested).unwrap();
        items.push(2).unwrap();
        assert_eq!(calls.get(), 1);
        assert_eq!(items.len(), 2);
    }

    #[test]
    fn test_listener_sees_written_model() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let log = Rc::clone(&seen);
        let model = wrap(Value::from(json!({"n": 0})), move |value| {
            log.borrow_mut().push(value.get_key("n").cloned());
        });
        model.set("n", 1).unwrap();
        model.set("n", 2).unwrap();
        assert_eq!(
            *seen.borrow(),
            vec![Some(Value::Number(1.0)), Some(Value::Number(2.0))]
        );
    }

    #[test]
    fn test_sequence_keys() {
        let (model, calls) = counted(json!({"items": ["a", "b"]}));
        let items = model.nested("items").unwrap();

        items.set("1", "B").unwrap();
        items.set("2", "c").unwrap();
        assert_eq!(
            items.set("x", "nope"),
            Err(ModelError::InvalidIndex {
                key: "x".to_string()
            })
        );
        assert_eq!(
            items.set("9", "nope"),
            Err(ModelError::OutOfBounds { index: 9, len: 3 })
        );
        assert_eq!(items.snapshot(), Some(Value::from(json!(["a", "B", "c"]))));
        assert_eq!(calls.get(), 2);
    }

    #[test]
    fn test_insert_and_remove() {
        let (model, calls) = counted(json!({"items": ["b"], "meta": {"x": 1, "y": 2, "z": 3}}));
        let items = model.nested("items").unwrap();
        items.insert(0, "a").unwrap();
        assert_eq!(items.insert(5, "z"), Err(ModelError::OutOfBounds { index: 5, len: 2 }));
        assert_eq!(items.remove("0"), Ok(Value::from("a")));

        let meta = model.nested("meta").unwrap();
        assert_eq!(meta.remove("y"), Ok(Value::Number(2.0)));
        assert_eq!(
            meta.remove("y"),
            Err(ModelError::MissingKey {
                key: "y".to_string()
            })
        );
        let keys: Vec<String> = meta
            .with_value(|v| v.as_map().unwrap().keys().cloned().collect())
            .unwrap();
        assert_eq!(keys, vec!["x", "z"]);
        assert_eq!(calls.get(), 3);
    }

    #[test]
    fn test_scalar_reads_are_copies() {
        let (model, calls) = counted(json!({"count": 3}));
        assert!(matches!(model.get("count"), Some(Entry::Value(Value::Number(n))) if n == 3.0));
        assert!(model.get("missing").is_none());
        assert!(model.nested("count").is_none());
        assert_eq!(calls.get(), 0);
    }

    #[test]
    fn test_writes_on_wrong_kinds_fail_without_notifying() {
        let (model, calls) = counted(json!({"n": 1, "m": {}}));
        assert_eq!(
            model.push(1),
            Err(ModelError::NotASequence {
                path: String::new()
            })
        );
        let m = model.nested("m").unwrap();
        assert_eq!(m.insert(0, 1), Err(ModelError::NotASequence { path: "m".to_string() }));
        assert_eq!(calls.get(), 0);
    }

    #[test]
    fn test_stale_handle() {
        let (model, calls) = counted(json!({"items": [{"n": 1}, {"n": 2}]}));
        let second = model.nested("items.1").unwrap();
        model.nested("items").unwrap().remove("1").unwrap();

        assert_eq!(
            second.set("n", 5),
            Err(ModelError::StalePath {
                path: "items.1".to_string()
            })
        );
        assert_eq!(second.snapshot(), None);
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn test_replace_root() {
        let (model, calls) = counted(json!({"a": 1}));
        let old = model.replace(Value::from(json!({"b": 2}))).unwrap();
        assert_eq!(old, Value::from(json!({"a": 1})));
        assert_eq!(model.len(), 1);
        assert!(model.get("a").is_none());
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn test_root_from_nested_handle() {
        let (model, calls) = counted(json!({"user": {"name": "Ada"}, "count": 0}));
        let user = model.nested("user").unwrap();
        let root = user.root();

        assert_eq!(root.path(), "");
        root.set("count", 1).unwrap();
        assert_eq!(calls.get(), 1);
        assert_eq!(model.get("count").and_then(Entry::into_value), Some(Value::Number(1.0)));
    }

    #[test]
    fn test_writes_from_listener_are_rejected() {
        let slot: Rc<RefCell<Option<Reactive>>> = Rc::new(RefCell::new(None));
        let results = Rc::new(RefCell::new(Vec::new()));

        let inner_slot = Rc::clone(&slot);
        let inner_results = Rc::clone(&results);
        let model = wrap(Value::from(json!({"n": 0})), move |_| {
            if let Some(handle) = inner_slot.borrow().as_ref() {
                inner_results.borrow_mut().push(handle.set("n", 99));
            }
        });
        *slot.borrow_mut() = Some(model.clone());

        model.set("n", 1).unwrap();
        assert_eq!(*results.borrow(), vec![Err(ModelError::Reentrant)]);
        assert_eq!(model.get("n").and_then(Entry::into_value), Some(Value::Number(1.0)));

        // Break the cycle between the listener and the handle it holds.
        slot.borrow_mut().take();
    }
}

/*
 * config.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Engine configuration.
//!
//! Every field has a default, so an empty configuration file (or none at
//! all) gives the standard directive vocabulary:
//!
//! ```yaml
//! repeat-tag: each
//! conditional-tag: if
//! recursive-tag: recursive-template
//! default-binding: item
//! generated-attribute: data-generated
//! hidden-attribute: hidden
//! max-recursion-depth: 50
//! ```

use crate::error::{EngineError, EngineResult};
use canopy_dom::{is_valid_attribute_name, is_valid_tag_name};
use serde::{Deserialize, Serialize};

/// The three directive kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DirectiveKind {
    Repeat,
    Conditional,
    RecursiveTemplate,
}

/// Settings for an [`Engine`](crate::Engine).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case", deny_unknown_fields)]
pub struct EngineConfig {
    /// Tag of the REPEAT directive.
    pub repeat_tag: String,

    /// Tag of the CONDITIONAL directive.
    pub conditional_tag: String,

    /// Tag of the RECURSIVE-TEMPLATE directive.
    pub recursive_tag: String,

    /// Name bound to each element by a REPEAT without an `as` attribute.
    pub default_binding: String,

    /// Marker attribute set to `"true"` on every node the engine creates.
    pub generated_attribute: String,

    /// Boolean attribute set on directive anchors after expansion.
    pub hidden_attribute: String,

    /// Maximum nesting of recursive template instantiations.
    pub max_recursion_depth: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            repeat_tag: "each".to_string(),
            conditional_tag: "if".to_string(),
            recursive_tag: "recursive-template".to_string(),
            default_binding: "item".to_string(),
            generated_attribute: "data-generated".to_string(),
            hidden_attribute: "hidden".to_string(),
            max_recursion_depth: 50,
        }
    }
}

impl EngineConfig {
    pub fn with_repeat_tag(mut self, tag: impl Into<String>) -> Self {
        self.repeat_tag = tag.into();
        self
    }

    pub fn with_conditional_tag(mut self, tag: impl Into<String>) -> Self {
        self.conditional_tag = tag.into();
        self
    }

    pub fn with_recursive_tag(mut self, tag: impl Into<String>) -> Self {
        self.recursive_tag = tag.into();
        self
    }

    pub fn with_default_binding(mut self, name: impl Into<String>) -> Self {
        self.default_binding = name.into();
        self
    }

    pub fn with_generated_attribute(mut self, name: impl Into<String>) -> Self {
        self.generated_attribute = name.into();
        self
    }

    pub fn with_hidden_attribute(mut self, name: impl Into<String>) -> Self {
        self.hidden_attribute = name.into();
        self
    }

    pub fn with_max_recursion_depth(mut self, depth: usize) -> Self {
        self.max_recursion_depth = depth;
        self
    }

    /// Classify a tag. Directive tags match case-insensitively.
    pub fn directive_kind(&self, tag: &str) -> Option<DirectiveKind> {
        if tag.eq_ignore_ascii_case(&self.repeat_tag) {
            Some(DirectiveKind::Repeat)
        } else if tag.eq_ignore_ascii_case(&self.conditional_tag) {
            Some(DirectiveKind::Conditional)
        } else if tag.eq_ignore_ascii_case(&self.recursive_tag) {
            Some(DirectiveKind::RecursiveTemplate)
        } else {
            None
        }
    }

    /// Check that the configuration is usable.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Config`] if a tag or attribute name is not
    /// valid markup, if two directives share a tag, if the default binding
    /// is empty, or if the recursion depth is zero.
    pub fn validate(&self) -> EngineResult<()> {
        for (key, tag) in [
            ("repeat-tag", &self.repeat_tag),
            ("conditional-tag", &self.conditional_tag),
            ("recursive-tag", &self.recursive_tag),
        ] {
            if !is_valid_tag_name(tag) {
                return Err(config_error(format!("{} {:?} is not a valid tag name", key, tag)));
            }
        }

        let tags = [&self.repeat_tag, &self.conditional_tag, &self.recursive_tag];
        for (i, a) in tags.iter().enumerate() {
            if tags[i + 1..].iter().any(|b| a.eq_ignore_ascii_case(b)) {
                return Err(config_error(format!(
                    "tag {:?} is used by more than one directive",
                    a
                )));
            }
        }

        for (key, name) in [
            ("generated-attribute", &self.generated_attribute),
            ("hidden-attribute", &self.hidden_attribute),
        ] {
            if !is_valid_attribute_name(name) {
                return Err(config_error(format!(
                    "{} {:?} is not a valid attribute name",
                    key, name
                )));
            }
        }

        if self.default_binding.is_empty() {
            return Err(config_error("default-binding must not be empty"));
        }
        if self.max_recursion_depth == 0 {
            return Err(config_error("max-recursion-depth must be at least 1"));
        }
        Ok(())
    }
}

fn config_error(message: impl Into<String>) -> EngineError {
    EngineError::Config {
        message: message.into(),
    }
}

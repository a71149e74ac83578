/*
 * error.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Error types for tree operations and markup parsing.

use thiserror::Error;

/// Result type alias for canopy-dom operations.
pub type Result<T> = std::result::Result<T, DomError>;

/// Errors raised by the host tree.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DomError {
    /// Tag name rejected by `create_element`.
    #[error("Invalid tag name: {name:?}")]
    InvalidTagName { name: String },

    /// Attribute name rejected by `set_attribute`.
    #[error("Invalid attribute name: {name:?}")]
    InvalidAttributeName { name: String },

    /// The node id does not refer to a live node of this document.
    #[error("Unknown or removed node: {node}")]
    UnknownNode { node: String },

    /// Structural operation that would break the tree (e.g., inserting a
    /// node into its own subtree, or relative to a node with another parent).
    #[error("Invalid tree operation: {message}")]
    InvalidOperation { message: String },

    /// Markup syntax error reported by the reader.
    #[error("Markup syntax error: {message}{}", .position.map(|p| format!(" at byte {}", p)).unwrap_or_default())]
    Syntax {
        message: String,
        /// Byte offset where the error occurred.
        position: Option<u64>,
    },

    /// A closing tag that does not match the open element.
    #[error("Mismatched end tag: expected </{expected}>, found </{found}>")]
    MismatchedEndTag { expected: String, found: String },

    /// Input ended while elements were still open.
    #[error("Unexpected end of input, expected closing tag </{expected}>")]
    UnexpectedEof { expected: String },
}

impl DomError {
    pub(crate) fn unknown(node: impl std::fmt::Debug) -> Self {
        DomError::UnknownNode {
            node: format!("{:?}", node),
        }
    }

    pub(crate) fn invalid(message: impl Into<String>) -> Self {
        DomError::InvalidOperation {
            message: message.into(),
        }
    }
}

impl From<quick_xml::Error> for DomError {
    fn from(err: quick_xml::Error) -> Self {
        DomError::Syntax {
            message: err.to_string(),
            position: None,
        }
    }
}

impl From<quick_xml::events::attributes::AttrError> for DomError {
    fn from(err: quick_xml::events::attributes::AttrError) -> Self {
        DomError::Syntax {
            message: format!("Attribute error: {}", err),
            position: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_syntax_error_display_with_position() {
        let err = DomError::Syntax {
            message: "bad".to_string(),
            position: Some(12),
        };
        assert_eq!(err.to_string(), "Markup syntax error: bad at byte 12");
    }

    #[test]
    fn test_syntax_error_display_without_position() {
        let err = DomError::Syntax {
            message: "bad".to_string(),
            position: None,
        };
        assert_eq!(err.to_string(), "Markup syntax error: bad");
    }
}

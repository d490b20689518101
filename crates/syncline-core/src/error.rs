//! Error Types
//!
//! Errors shared by every syncline crate. Path access failures are the only
//! core-level failure; higher layers wrap them in their own error enums.

use serde::Serialize;
use thiserror::Error;

/// Failure while reading or writing a dotted path.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PathError {
    /// The path is empty or contains an empty segment (`a..b`).
    #[error("invalid path '{path}'")]
    InvalidPath {
        /// The offending path
        path: String,
    },

    /// A write had to descend through a scalar value.
    #[error("cannot descend into '{segment}' of path '{path}': not a map or array")]
    NotAContainer {
        /// The full path being written
        path: String,
        /// The segment that hit a scalar
        segment: String,
    },

    /// An array segment was not a valid index for the array.
    #[error("index '{segment}' out of bounds in path '{path}'")]
    IndexOutOfBounds {
        /// The full path being written
        path: String,
        /// The offending segment
        segment: String,
    },
}

/// Type alias for Results using [`PathError`].
pub type Result<T> = std::result::Result<T, PathError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_includes_path() {
        let err = PathError::NotAContainer {
            path: "a.b.c".to_string(),
            segment: "b".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "cannot descend into 'b' of path 'a.b.c': not a map or array"
        );
    }

    #[test]
    fn test_serialization_is_tagged() {
        let err = PathError::InvalidPath {
            path: String::new(),
        };
        let json = serde_json::to_string(&err).unwrap();
        assert!(json.contains("\"type\":\"invalid_path\""));
    }
}

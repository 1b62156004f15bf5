//! Error types
//!
//! Tree operations themselves report through `bool`; these cover the edges of the
//! crate (query ingestion, configuration) and the detailed invariant report.

use thiserror::Error;

/// Errors raised while ingesting a query from a controlling collaborator
#[derive(Debug, Error, PartialEq, Eq)]
pub enum QueryError {
    /// Value lies outside the configured range
    #[error("Value {value} is outside of the accepted range {min}..={max}")]
    OutOfRange { value: i32, min: i32, max: i32 },
}

/// Errors raised while loading a configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Malformed JSON
    #[error("Failed to parse configuration: {0}")]
    Parse(#[from] serde_json::Error),

    /// `min` is greater than `max`
    #[error("Empty value range {min}..={max}")]
    EmptyRange { min: i32, max: i32 },
}

/// First red-black or search-tree property found broken
#[derive(Debug, Error, PartialEq, Eq)]
pub enum InvariantViolation {
    #[error("Root must be black")]
    RedRoot,

    #[error("Red node {0} has a red child")]
    RedRedEdge(String),

    #[error("Leaf black depths differ: {expected} and {found}")]
    BlackHeightMismatch { expected: usize, found: usize },

    #[error("Keys out of order around {0}")]
    OrderViolation(String),

    #[error("Parent link of {0} does not point back at its parent")]
    BrokenParentLink(String),

    #[error("Tree reports {reported} nodes but {reachable} are reachable")]
    SizeMismatch { reported: usize, reachable: usize },
}

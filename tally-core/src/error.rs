//! Error types for Tally

use thiserror::Error;

use crate::dom::NodeId;

/// Core Tally errors
#[derive(Error, Debug)]
pub enum Error {
    // Context errors
    #[error("Missing context `{context}`: {hint}")]
    MissingProvider {
        context: &'static str,
        hint: &'static str,
    },

    // Document errors
    #[error("Node not found: {0:?}")]
    NodeNotFound(NodeId),

    #[error("Cannot insert {child:?} under {parent:?}")]
    HierarchyRequest { parent: NodeId, child: NodeId },

    // Registration errors
    #[error("Invalid custom element name: {0:?}")]
    InvalidTagName(String),

    #[error("Element already defined: {0}")]
    AlreadyDefined(String),

    // Configuration errors
    #[error("Invalid configuration: {0}")]
    Config(#[from] serde_json::Error),
}

/// Result type for Tally operations
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Whether this error came from a consumer rendered outside its provider.
    pub fn is_missing_provider(&self) -> bool {
        matches!(self, Error::MissingProvider { .. })
    }
}

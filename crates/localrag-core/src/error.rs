use thiserror::Error;

/// Failure kinds surfaced by the retrieval pipeline.
///
/// Every variant is fatal for the current run; nothing is recovered silently.
#[derive(Debug, Error)]
pub enum Error {
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// The content provider failed or does not know the title.
    #[error("Failed to fetch source '{title}': {reason}")]
    SourceFetch { title: String, reason: String },

    /// An embedding does not match the collection's vector width.
    #[error("Embedding dimension mismatch: collection expects {expected}, got {actual}")]
    SchemaMismatch { expected: usize, actual: usize },

    #[error("Collection not found: {0}")]
    CollectionNotFound(String),

    /// Retrieval produced no passage to ground the answer with.
    #[error("No passage in collection '{0}' matched the query")]
    NoMatch(String),

    #[error("Embedding failed: {0}")]
    Embedding(String),

    #[error("Vector store operation failed: {0}")]
    Store(String),

    /// Connection or protocol failure while talking to the chat service.
    #[error("Chat stream failed: {0}")]
    StreamTransport(String),

    #[error("Answer stream cancelled")]
    Cancelled,
}

impl Error {
    pub fn store(e: impl std::fmt::Display) -> Self {
        Self::Store(e.to_string())
    }

    pub fn embedding(e: impl std::fmt::Display) -> Self {
        Self::Embedding(e.to_string())
    }

    pub fn transport(e: impl std::fmt::Display) -> Self {
        Self::StreamTransport(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, Error>;

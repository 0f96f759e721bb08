//! Shared building blocks for localrag: configuration, the error taxonomy,
//! capability traits, domain types and the paragraph splitter.

pub mod chunker;
pub mod config;
pub mod error;
pub mod traits;
pub mod types;

pub use chunker::ChunkSplitter;
pub use error::{Error, Result};
pub use types::{Match, Query, TextUnit};

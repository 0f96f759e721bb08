//! Domain types shared by the splitter, the index and the prompt layer.

use serde::{Deserialize, Serialize};

/// One retrievable chunk of source text.
///
/// - `text`: the passage itself, embedded and returned as grounding text
/// - `category`: opaque label assigned at ingest (e.g. "cat", "painting")
/// - `embedding`: unset until the index attaches one
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextUnit {
    pub text: String,
    pub category: String,
    pub embedding: Option<Vec<f32>>,
}

impl TextUnit {
    pub fn new(text: impl Into<String>, category: impl Into<String>) -> Self {
        Self { text: text.into(), category: category.into(), embedding: None }
    }

    pub fn with_embedding(mut self, embedding: Vec<f32>) -> Self {
        self.embedding = Some(embedding);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Query {
    pub text: String,
}

impl Query {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }
}

/// A ranked search result. `rank` starts at 1; `score` is higher-is-better.
#[derive(Debug, Clone, PartialEq)]
pub struct Match {
    pub unit: TextUnit,
    pub rank: usize,
    pub score: f32,
}

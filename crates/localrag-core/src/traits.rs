use async_trait::async_trait;

use crate::error::Result;

/// Turns text into fixed-width vectors. One instance is built at startup and
/// shared by everything that embeds, so stored and query vectors always agree.
pub trait Embedder: Send + Sync {
    fn dim(&self) -> usize;
    fn max_len(&self) -> usize;
    fn embed_batch(&self, texts: &[String]) -> anyhow::Result<Vec<Vec<f32>>>;
}

/// Supplies raw page text for a title.
#[async_trait]
pub trait ContentSource: Send + Sync {
    fn name(&self) -> &str;
    /// Unknown titles are an error, never an empty page.
    async fn fetch(&self, title: &str) -> Result<String>;
}

use anyhow::Result;
use std::hash::Hasher;
use twox_hash::XxHash64;

use localrag_core::traits::Embedder;

/// Deterministic lexical embedder for tests and offline development.
///
/// Each lower-cased alphanumeric token lands in the slot picked by its xxhash,
/// so cosine similarity between two vectors tracks how many words the texts
/// share, and the same text embeds the same way in every process.
pub struct FakeEmbedder {
    dim: usize,
}

impl FakeEmbedder {
    pub fn new(dim: usize) -> Self {
        Self { dim }
    }

    fn embed_one(&self, text: &str) -> Vec<f32> {
        let mut v = vec![0f32; self.dim];
        for token in tokens(text) {
            v[slot(&token, self.dim)] += 1.0;
        }
        if v.iter().all(|x| *x == 0.0) {
            // No words: spread evenly so cosine against it stays defined.
            v.fill(1.0);
        }
        let norm = v.iter().map(|x| x * x).sum::<f32>().sqrt();
        for x in &mut v { *x /= norm; }
        v
    }
}

fn slot(token: &str, dim: usize) -> usize {
    let mut hasher = XxHash64::with_seed(0);
    hasher.write(token.as_bytes());
    (hasher.finish() % dim as u64) as usize
}

fn tokens(text: &str) -> impl Iterator<Item = String> + '_ {
    text.split(|c: char| !c.is_alphanumeric()).filter(|t| !t.is_empty()).map(str::to_lowercase)
}

impl Embedder for FakeEmbedder {
    fn dim(&self) -> usize { self.dim }
    fn max_len(&self) -> usize { usize::MAX }
    fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        Ok(texts.iter().map(|t| self.embed_one(t)).collect())
    }
}

use crate::types::TextUnit;

pub const PARAGRAPH_SEPARATOR: &str = "\n\n";

/// Splits raw page text into paragraph-sized units.
///
/// Segments are kept verbatim and in source order. `drop_if_blank` controls
/// whether empty or whitespace-only segments (runs of blank lines, trailing
/// newlines, empty input) are discarded or passed through as-is.
#[derive(Debug, Clone)]
pub struct ChunkSplitter {
    drop_if_blank: bool,
}

impl Default for ChunkSplitter {
    fn default() -> Self {
        Self { drop_if_blank: true }
    }
}

impl ChunkSplitter {
    pub fn new(drop_if_blank: bool) -> Self {
        Self { drop_if_blank }
    }

    pub fn drop_if_blank(&self) -> bool {
        self.drop_if_blank
    }

    pub fn split(&self, raw_text: &str, category: &str) -> Vec<TextUnit> {
        let units: Vec<TextUnit> = raw_text
            .split(PARAGRAPH_SEPARATOR)
            .filter(|segment| !(self.drop_if_blank && segment.trim().is_empty()))
            .map(|segment| TextUnit::new(segment, category))
            .collect();
        tracing::debug!(category, units = units.len(), bytes = raw_text.len(), "split source text");
        units
    }
}

//! Retrieval-augmented answering: ingest pages, find the best passage for a
//! question, ground the prompt with it and stream the model's answer.

use std::sync::Arc;

use localrag_chat::{AnswerStream, AnswerStreamer, PromptTemplate};
use localrag_core::config::PageSpec;
use localrag_core::error::{Error, Result};
use localrag_core::traits::ContentSource;
use localrag_core::{ChunkSplitter, Match, Query};
use localrag_vector::{Collection, DocumentIndex};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IngestReport {
    pub pages: usize,
    pub units: usize,
}

pub struct Pipeline {
    source: Arc<dyn ContentSource>,
    splitter: ChunkSplitter,
    index: DocumentIndex,
    template: PromptTemplate,
    streamer: AnswerStreamer,
}

impl Pipeline {
    pub fn new(
        source: Arc<dyn ContentSource>,
        splitter: ChunkSplitter,
        index: DocumentIndex,
        template: PromptTemplate,
        streamer: AnswerStreamer,
    ) -> Self {
        Self { source, splitter, index, template, streamer }
    }

    pub fn index(&self) -> &DocumentIndex {
        &self.index
    }

    /// Empty the collection (creating it if needed).
    pub async fn reset(&self, collection: &str) -> Result<Collection> {
        self.index.reset_and_create(collection, &self.index.schema()).await
    }

    /// Fetch, split and index one page. Returns how many units were stored.
    pub async fn ingest_page(&self, collection: &Collection, page: &PageSpec) -> Result<usize> {
        let raw = self.source.fetch(&page.title).await?;
        let units = self.splitter.split(&raw, &page.category);
        let added = self.index.add(collection, &units).await?;
        tracing::info!(source = self.source.name(), title = %page.title, category = %page.category, units = added, "page ingested");
        Ok(added)
    }

    /// Reset `collection` and load every page into it. Any failing page aborts
    /// the run.
    pub async fn ingest(&self, pages: &[PageSpec], collection: &str) -> Result<(Collection, IngestReport)> {
        let col = self.reset(collection).await?;
        let mut report = IngestReport::default();
        for page in pages {
            report.units += self.ingest_page(&col, page).await?;
            report.pages += 1;
        }
        tracing::info!(collection, pages = report.pages, units = report.units, "ingest complete");
        Ok((col, report))
    }

    /// Best passage for `query`; `NoMatch` when the collection has nothing.
    pub async fn retrieve(&self, collection: &Collection, query: &Query, limit: usize) -> Result<Match> {
        let matches = self.index.search(collection, query, limit).await?;
        let top = matches.into_iter().next().ok_or_else(|| Error::NoMatch(collection.name().to_string()))?;
        tracing::info!(category = %top.unit.category, score = top.score, rank = top.rank, "retrieved passage");
        Ok(top)
    }

    pub fn compose_for(&self, query: &Query, grounding: &Match) -> String {
        self.template.compose(&query.text, &grounding.unit.text)
    }

    /// Retrieve, compose and open the answer stream. The chat service is only
    /// contacted once a passage has been found.
    pub async fn answer(&self, collection: &Collection, query: &Query, limit: usize) -> Result<(Match, AnswerStream)> {
        let top = self.retrieve(collection, query, limit).await?;
        let prompt = self.compose_for(query, &top);
        let stream = self.streamer.stream_answer(&prompt).await?;
        Ok((top, stream))
    }
}

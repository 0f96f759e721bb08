use std::future::Future;
use std::sync::Arc;
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio::sync::mpsc;

use localrag_core::error::{Error, Result};

use crate::ollama::{ChatMessage, ChatService};

/// Sends one prompt as a single-turn chat and hands back the fragment stream.
#[derive(Clone)]
pub struct AnswerStreamer {
    service: Arc<dyn ChatService>,
}

impl AnswerStreamer {
    pub fn new(service: Arc<dyn ChatService>) -> Self {
        Self { service }
    }

    pub async fn stream_answer(&self, prompt: &str) -> Result<AnswerStream> {
        tracing::info!(service = self.service.name(), prompt_chars = prompt.len(), "requesting answer");
        let rx = self.service.stream_chat(&[ChatMessage::user(prompt)]).await?;
        Ok(AnswerStream { rx })
    }
}

/// Totals for a completed delivery.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeliverySummary {
    pub fragments: usize,
    pub bytes: usize,
}

/// Pull-based, single-use sequence of answer fragments.
pub struct AnswerStream {
    rx: mpsc::Receiver<Result<String>>,
}

impl AnswerStream {
    pub fn from_receiver(rx: mpsc::Receiver<Result<String>>) -> Self {
        Self { rx }
    }

    /// `None` once the model has finished.
    pub async fn next_fragment(&mut self) -> Option<Result<String>> {
        self.rx.recv().await
    }

    /// Stop consuming. The producer sees the closed channel and exits.
    pub fn cancel(mut self) {
        self.rx.close();
    }

    /// Write fragments to `out` as they arrive, flushing each one, then a
    /// final newline. Resolving `cancel` stops delivery with `Error::Cancelled`;
    /// anything already written stays written.
    pub async fn deliver<W, C>(mut self, out: &mut W, cancel: C) -> Result<DeliverySummary>
    where
        W: AsyncWrite + Unpin,
        C: Future<Output = ()>,
    {
        tokio::pin!(cancel);
        let mut summary = DeliverySummary::default();
        loop {
            let item = tokio::select! {
                biased;
                () = &mut cancel => {
                    self.rx.close();
                    tracing::info!(fragments = summary.fragments, "answer cancelled");
                    return Err(Error::Cancelled);
                }
                item = self.rx.recv() => item,
            };
            match item {
                Some(Ok(fragment)) => {
                    write_flush(out, fragment.as_bytes()).await?;
                    summary.fragments += 1;
                    summary.bytes += fragment.len();
                }
                Some(Err(e)) => {
                    tracing::warn!(error = %e, fragments = summary.fragments, "answer stream failed");
                    return Err(e);
                }
                None => break,
            }
        }
        write_flush(out, b"\n").await?;
        tracing::debug!(fragments = summary.fragments, bytes = summary.bytes, "answer delivered");
        Ok(summary)
    }
}

async fn write_flush<W: AsyncWrite + Unpin>(out: &mut W, bytes: &[u8]) -> Result<()> {
    out.write_all(bytes).await.map_err(|e| Error::StreamTransport(format!("write answer: {e}")))?;
    out.flush().await.map_err(|e| Error::StreamTransport(format!("flush answer: {e}")))
}

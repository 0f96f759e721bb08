use async_trait::async_trait;
use futures::StreamExt;
use reqwest::{Client, Response, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::time::Duration;
use tokio::sync::mpsc;

use localrag_core::config::ChatConfig;
use localrag_core::error::{Error, Result};

use crate::ndjson::{parse_line, ChatEvent, LineBuffer};

const CHANNEL_CAPACITY: usize = 32;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self { role: "user".to_string(), content: content.into() }
    }
}

/// A chat model that answers with a stream of text fragments.
///
/// The receiver yields fragments in generation order and closes when the
/// model is done. An `Err` item ends the stream.
#[async_trait]
pub trait ChatService: Send + Sync {
    fn name(&self) -> &str;
    async fn stream_chat(&self, messages: &[ChatMessage]) -> Result<mpsc::Receiver<Result<String>>>;
}

pub struct OllamaChat {
    client: Client,
    base_url: String,
    model: String,
    max_retries: u32,
    backoff: Duration,
}

impl OllamaChat {
    pub fn new(config: &ChatConfig) -> Result<Self> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .build()
            .map_err(|e| Error::InvalidConfig(format!("http client: {e}")))?;
        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            max_retries: config.max_retries,
            backoff: Duration::from_millis(config.backoff_ms),
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Send the request, retrying connection failures and 5xx answers with
    /// exponential backoff. Nothing has been streamed yet at this point.
    async fn send_with_retry(&self, body: &serde_json::Value) -> Result<Response> {
        let url = format!("{}/api/chat", self.base_url);
        let mut attempt = 0u32;
        loop {
            let failure = match self.client.post(&url).json(body).send().await {
                Ok(resp) if resp.status().is_success() => return Ok(resp),
                Ok(resp) if resp.status().is_server_error() => format!("HTTP {}", resp.status()),
                Ok(resp) => return Err(rejected(resp).await),
                Err(e) if e.is_connect() || e.is_timeout() => e.to_string(),
                Err(e) => return Err(Error::transport(e)),
            };
            if attempt >= self.max_retries {
                return Err(Error::StreamTransport(format!("{url}: {failure} after {} attempt(s)", attempt + 1)));
            }
            let delay = self.backoff.saturating_mul(2u32.saturating_pow(attempt));
            tracing::warn!(attempt = attempt + 1, ?delay, %failure, "chat request failed, retrying");
            tokio::time::sleep(delay).await;
            attempt += 1;
        }
    }
}

async fn rejected(resp: Response) -> Error {
    let status = resp.status();
    let text = resp.text().await.unwrap_or_default();
    let detail = serde_json::from_str::<ErrorBody>(&text).map(|b| b.error).unwrap_or(text);
    if status == StatusCode::NOT_FOUND {
        return Error::StreamTransport(format!("chat endpoint or model not found: {detail}"));
    }
    Error::StreamTransport(format!("HTTP {status}: {detail}"))
}

#[derive(Deserialize)]
struct ErrorBody {
    error: String,
}

#[async_trait]
impl ChatService for OllamaChat {
    fn name(&self) -> &str {
        "ollama"
    }

    async fn stream_chat(&self, messages: &[ChatMessage]) -> Result<mpsc::Receiver<Result<String>>> {
        let body = json!({
            "model": self.model,
            "messages": messages,
            "stream": true,
        });
        tracing::debug!(model = %self.model, messages = messages.len(), "starting chat stream");
        let resp = self.send_with_retry(&body).await?;

        let (tx, rx) = mpsc::channel(CHANNEL_CAPACITY);
        let mut stream = resp.bytes_stream();
        tokio::spawn(async move {
            let mut lines = LineBuffer::new();
            loop {
                let item = tokio::select! {
                    _ = tx.closed() => {
                        tracing::debug!("answer receiver closed, stopping producer");
                        return;
                    }
                    item = stream.next() => item,
                };
                let (pending, ended) = match item {
                    Some(Ok(bytes)) => (lines.push(&bytes), false),
                    Some(Err(e)) => {
                        let _ = tx.send(Err(Error::transport(e))).await;
                        return;
                    }
                    None => (lines.finish().into_iter().collect(), true),
                };
                for line in pending {
                    if !forward(&tx, &line).await {
                        return;
                    }
                }
                if ended {
                    let _ = tx.send(Err(Error::StreamTransport("stream ended before the model finished".into()))).await;
                    return;
                }
            }
        });

        Ok(rx)
    }
}

/// Push one decoded line to the consumer. `false` means the producer is done.
async fn forward(tx: &mpsc::Sender<Result<String>>, line: &str) -> bool {
    match parse_line(line) {
        Ok(ChatEvent::Fragment(text)) => text.is_empty() || tx.send(Ok(text)).await.is_ok(),
        Ok(ChatEvent::Done(text)) => {
            if !text.is_empty() {
                let _ = tx.send(Ok(text)).await;
            }
            tracing::debug!("chat stream complete");
            false
        }
        Err(e) => {
            let _ = tx.send(Err(e)).await;
            false
        }
    }
}

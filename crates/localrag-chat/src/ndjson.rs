//! Newline-delimited JSON framing for the chat stream.

use serde::Deserialize;

use localrag_core::error::{Error, Result};

/// Reassembles lines that arrive split across network chunks.
#[derive(Debug, Default)]
pub struct LineBuffer {
    buf: Vec<u8>,
}

impl LineBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a chunk and drain every complete, non-blank line.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<String> {
        self.buf.extend_from_slice(chunk);
        let mut lines = Vec::new();
        while let Some(pos) = self.buf.iter().position(|&b| b == b'\n') {
            let line: Vec<u8> = self.buf.drain(..=pos).collect();
            let text = String::from_utf8_lossy(&line);
            let text = text.trim();
            if !text.is_empty() {
                lines.push(text.to_string());
            }
        }
        lines
    }

    /// Whatever is left once the body ends without a final newline.
    pub fn finish(&mut self) -> Option<String> {
        let rest = String::from_utf8_lossy(&std::mem::take(&mut self.buf)).trim().to_string();
        (!rest.is_empty()).then_some(rest)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatEvent {
    Fragment(String),
    Done(String),
}

#[derive(Debug, Deserialize)]
struct ChatLine {
    message: Option<LineMessage>,
    #[serde(default)]
    done: bool,
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct LineMessage {
    #[serde(default)]
    content: String,
}

/// Decode one Ollama `/api/chat` stream line.
pub fn parse_line(line: &str) -> Result<ChatEvent> {
    let parsed: ChatLine =
        serde_json::from_str(line).map_err(|e| Error::StreamTransport(format!("malformed stream line: {e}")))?;
    if let Some(err) = parsed.error {
        return Err(Error::StreamTransport(err));
    }
    let content = parsed.message.map(|m| m.content).unwrap_or_default();
    Ok(if parsed.done { ChatEvent::Done(content) } else { ChatEvent::Fragment(content) })
}

//! Plain-text page extracts from the MediaWiki action API.

use async_trait::async_trait;
use reqwest::{Client, Url};
use serde::Deserialize;

use localrag_core::config::SourceConfig;
use localrag_core::error::{Error, Result};
use localrag_core::traits::ContentSource;

const LANG_PLACEHOLDER: &str = "{lang}";

pub struct WikipediaSource {
    client: Client,
    endpoint: String,
}

#[derive(Debug, Deserialize)]
struct ApiResponse {
    query: Option<ApiQuery>,
    error: Option<ApiError>,
}

#[derive(Debug, Deserialize)]
struct ApiQuery {
    #[serde(default)]
    pages: Vec<ApiPage>,
}

#[derive(Debug, Deserialize)]
struct ApiPage {
    title: String,
    #[serde(default)]
    missing: bool,
    #[serde(default)]
    invalid: bool,
    extract: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    code: String,
    info: String,
}

impl WikipediaSource {
    pub fn new(config: &SourceConfig) -> Result<Self> {
        let client = Client::builder()
            .user_agent(&config.user_agent)
            .build()
            .map_err(|e| Error::InvalidConfig(format!("http client: {e}")))?;
        let endpoint = config.api_url.replace(LANG_PLACEHOLDER, &config.language);
        Url::parse(&endpoint).map_err(|e| Error::InvalidConfig(format!("source.api_url '{endpoint}': {e}")))?;
        Ok(Self { client, endpoint })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn request_url(&self, title: &str) -> Result<Url> {
        Url::parse_with_params(
            &self.endpoint,
            &[
                ("action", "query"),
                ("prop", "extracts"),
                ("explaintext", "1"),
                ("redirects", "1"),
                ("format", "json"),
                ("formatversion", "2"),
                ("titles", title),
            ],
        )
        .map_err(|e| Error::InvalidConfig(format!("source.api_url '{}': {e}", self.endpoint)))
    }
}

#[async_trait]
impl ContentSource for WikipediaSource {
    fn name(&self) -> &str {
        "wikipedia"
    }

    async fn fetch(&self, title: &str) -> Result<String> {
        let fail = |reason: String| Error::SourceFetch { title: title.to_string(), reason };
        let url = self.request_url(title)?;
        tracing::debug!(%url, "fetching page");
        let resp = self.client.get(url).send().await.map_err(|e| fail(e.to_string()))?;
        let status = resp.status();
        if !status.is_success() {
            return Err(fail(format!("HTTP {status}")));
        }
        let body = resp.text().await.map_err(|e| fail(e.to_string()))?;
        let text = parse_extract(&body).map_err(fail)?;
        tracing::info!(title, chars = text.len(), "page fetched");
        Ok(text)
    }
}

/// Pull the single page extract out of a `formatversion=2` query response.
pub fn parse_extract(body: &str) -> std::result::Result<String, String> {
    let parsed: ApiResponse = serde_json::from_str(body).map_err(|e| format!("malformed response: {e}"))?;
    if let Some(err) = parsed.error {
        return Err(format!("{}: {}", err.code, err.info));
    }
    let page = parsed
        .query
        .and_then(|q| q.pages.into_iter().next())
        .ok_or_else(|| "response has no pages".to_string())?;
    if page.missing || page.invalid {
        return Err(format!("page '{}' does not exist", page.title));
    }
    match page.extract {
        Some(text) if !text.trim().is_empty() => Ok(text),
        _ => Err(format!("page '{}' has no text", page.title)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extract_is_returned_verbatim() {
        let body = r#"{"batchcomplete":true,"query":{"pages":[{"pageid":1,"ns":0,"title":"Maru (cat)","extract":"Maru is a cat.\n\nHe is famous."}]}}"#;
        assert_eq!(parse_extract(body).unwrap(), "Maru is a cat.\n\nHe is famous.");
    }

    #[test]
    fn missing_page_is_an_error() {
        let body = r#"{"batchcomplete":true,"query":{"pages":[{"ns":0,"title":"Nope","missing":true}]}}"#;
        assert!(parse_extract(body).unwrap_err().contains("does not exist"));
    }

    #[test]
    fn api_error_is_surfaced() {
        let body = r#"{"error":{"code":"badvalue","info":"Unrecognized value"}}"#;
        assert_eq!(parse_extract(body).unwrap_err(), "badvalue: Unrecognized value");
    }

    #[test]
    fn language_is_substituted_into_endpoint() {
        let cfg = SourceConfig {
            kind: localrag_core::config::SourceKind::Wikipedia,
            api_url: "https://{lang}.wikipedia.org/w/api.php".into(),
            user_agent: "RAGBot9000".into(),
            language: "de".into(),
            dir: None,
        };
        let src = WikipediaSource::new(&cfg).unwrap();
        assert_eq!(src.endpoint(), "https://de.wikipedia.org/w/api.php");
        let url = src.request_url("Maru (cat)").unwrap();
        assert!(url.as_str().contains("titles=Maru+%28cat%29"), "{url}");
        assert!(url.as_str().contains("explaintext=1"));
    }
}

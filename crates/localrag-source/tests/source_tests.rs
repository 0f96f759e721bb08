use std::io::Write;

use localrag_core::config::{SourceConfig, SourceKind};
use localrag_core::traits::ContentSource;
use localrag_core::Error;
use localrag_source::{build_source, DirectorySource, WikipediaSource};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

/// Serve one canned HTTP response and hand back the request line it answered.
async fn serve_once(status: &'static str, body: &'static str) -> (String, tokio::task::JoinHandle<String>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("addr");
    let handle = tokio::spawn(async move {
        let (mut sock, _) = listener.accept().await.expect("accept");
        let mut buf = vec![0u8; 8192];
        let n = sock.read(&mut buf).await.expect("read");
        let request = String::from_utf8_lossy(&buf[..n]).to_string();
        let resp = format!(
            "HTTP/1.1 {status}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
            body.len()
        );
        sock.write_all(resp.as_bytes()).await.expect("write");
        sock.shutdown().await.ok();
        request
    });
    (format!("http://{addr}/w/api.php"), handle)
}

fn wiki_config(api_url: String) -> SourceConfig {
    SourceConfig {
        kind: SourceKind::Wikipedia,
        api_url,
        user_agent: "RAGBot9000".into(),
        language: "en".into(),
        dir: None,
    }
}

#[tokio::test]
async fn wikipedia_fetch_returns_plain_text() -> anyhow::Result<()> {
    let body = r#"{"batchcomplete":true,"query":{"pages":[{"pageid":7,"ns":0,"title":"Maru (cat)","extract":"Maru is a cat.\n\nHe is famous."}]}}"#;
    let (url, server) = serve_once("200 OK", body).await;
    let source = WikipediaSource::new(&wiki_config(url))?;

    let text = source.fetch("Maru (cat)").await?;
    assert_eq!(text, "Maru is a cat.\n\nHe is famous.");

    let request = server.await?;
    assert!(request.starts_with("GET /w/api.php?"), "{request}");
    assert!(request.contains("prop=extracts"));
    assert!(request.to_ascii_lowercase().contains("user-agent: ragbot9000"));
    Ok(())
}

#[tokio::test]
async fn wikipedia_unknown_title_is_a_fetch_error() -> anyhow::Result<()> {
    let body = r#"{"batchcomplete":true,"query":{"pages":[{"ns":0,"title":"No such page","missing":true}]}}"#;
    let (url, _server) = serve_once("200 OK", body).await;
    let source = WikipediaSource::new(&wiki_config(url))?;

    let err = source.fetch("No such page").await.unwrap_err();
    assert!(matches!(err, Error::SourceFetch { ref title, .. } if title == "No such page"), "got {err:?}");
    Ok(())
}

#[tokio::test]
async fn wikipedia_http_failure_is_a_fetch_error() -> anyhow::Result<()> {
    let (url, _server) = serve_once("503 Service Unavailable", "{}").await;
    let source = WikipediaSource::new(&wiki_config(url))?;
    let err = source.fetch("Maru (cat)").await.unwrap_err();
    match err {
        Error::SourceFetch { reason, .. } => assert!(reason.contains("503"), "{reason}"),
        other => panic!("unexpected {other:?}"),
    }
    Ok(())
}

#[tokio::test]
async fn directory_source_reads_title_files() -> anyhow::Result<()> {
    let tmp = tempfile::tempdir()?;
    let mut f = std::fs::File::create(tmp.path().join("Maru (cat).txt"))?;
    f.write_all(b"Maru is a cat.\n\nHe is famous.")?;
    let mut g = std::fs::File::create(tmp.path().join("Broken.txt"))?;
    g.write_all(b"caf\xff latte")?;

    let source = DirectorySource::new(tmp.path());
    assert_eq!(source.fetch("Maru (cat)").await?, "Maru is a cat.\n\nHe is famous.");
    assert_eq!(source.fetch("Broken").await?, "caf\u{fffd} latte");

    let err = source.fetch("Absent").await.unwrap_err();
    assert!(matches!(err, Error::SourceFetch { .. }), "got {err:?}");
    Ok(())
}

#[test]
fn directory_kind_requires_a_dir() {
    let cfg = SourceConfig {
        kind: SourceKind::Directory,
        api_url: String::new(),
        user_agent: String::new(),
        language: "en".into(),
        dir: None,
    };
    assert!(matches!(build_source(&cfg), Err(Error::InvalidConfig(_))));
}

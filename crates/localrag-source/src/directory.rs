//! Pages read from `<dir>/<title>.txt` for offline runs.

use async_trait::async_trait;
use std::path::{Path, PathBuf};

use localrag_core::error::{Error, Result};
use localrag_core::traits::ContentSource;

pub struct DirectorySource {
    dir: PathBuf,
}

impl DirectorySource {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn page_path(&self, title: &str) -> PathBuf {
        self.dir.join(format!("{title}.txt"))
    }
}

#[async_trait]
impl ContentSource for DirectorySource {
    fn name(&self) -> &str {
        "directory"
    }

    async fn fetch(&self, title: &str) -> Result<String> {
        let path = self.page_path(title);
        let text = read_lossy(&path)
            .await
            .map_err(|e| Error::SourceFetch { title: title.to_string(), reason: format!("{}: {e}", path.display()) })?;
        if text.trim().is_empty() {
            return Err(Error::SourceFetch { title: title.to_string(), reason: format!("{} is empty", path.display()) });
        }
        tracing::info!(title, path = %path.display(), chars = text.len(), "page read");
        Ok(text)
    }
}

// Invalid UTF-8 is replaced rather than rejected.
async fn read_lossy(path: &Path) -> std::io::Result<String> {
    let bytes = tokio::fs::read(path).await?;
    Ok(match String::from_utf8(bytes) {
        Ok(s) => s,
        Err(e) => String::from_utf8_lossy(e.as_bytes()).into_owned(),
    })
}

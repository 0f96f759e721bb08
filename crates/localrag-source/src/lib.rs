//! Content providers that turn a page title into raw text.

use std::sync::Arc;

use localrag_core::config::{expand_path, SourceConfig, SourceKind};
use localrag_core::error::{Error, Result};
use localrag_core::traits::ContentSource;

pub mod directory;
pub mod wikipedia;

pub use directory::DirectorySource;
pub use wikipedia::WikipediaSource;

pub fn build_source(config: &SourceConfig) -> Result<Arc<dyn ContentSource>> {
    match config.kind {
        SourceKind::Wikipedia => Ok(Arc::new(WikipediaSource::new(config)?)),
        SourceKind::Directory => {
            let dir = config
                .dir
                .as_deref()
                .ok_or_else(|| Error::InvalidConfig("source.dir is required for the directory source".into()))?;
            Ok(Arc::new(DirectorySource::new(expand_path(dir))))
        }
    }
}

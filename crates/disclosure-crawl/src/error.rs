use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CrawlError {
    #[error("index page {url} unavailable: {reason}")]
    IndexUnavailable { url: String, reason: String },

    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),

    #[error(transparent)]
    Store(#[from] disclosure_store::StoreError),

    #[error(transparent)]
    Core(#[from] disclosure_core::CoreError),
}

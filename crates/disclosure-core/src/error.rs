use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("invalid selector `{selector}`: {reason}")]
    InvalidSelector { selector: String, reason: String },

    #[error("department `{department}` is missing required `{field}`")]
    MissingField {
        department: String,
        field: &'static str,
    },

    #[error("invalid url `{url}`: {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("extraction failed: {0}")]
    Extraction(String),

    #[error("vendor table error: {0}")]
    VendorTable(#[from] serde_json::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Failure reported by the fetch transport.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("server returned {status} for {url}")]
    Status { status: u16, url: String },

    #[error("transport error: {0}")]
    Transport(#[source] Box<dyn std::error::Error + Send + Sync>),
}

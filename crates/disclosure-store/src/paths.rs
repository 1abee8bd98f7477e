//! On-disk layout, one directory per department under each root:
//!
//! - raw pages: `{raw}/{acronym}/{stem}.html`
//! - index and quarter pages: `{raw}/{acronym}/index/{stem}.html`
//! - metadata sidecars: `{metadata}/{acronym}/{stem}.json`
//! - normalized records: `{output}/{acronym}/{stem}.json`

use std::path::{Path, PathBuf};

use sha2::{Digest, Sha256};

pub const PAGE_EXT: &str = "html";
pub const JSON_EXT: &str = "json";
const INDEX_DIR: &str = "index";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Paths {
    pub raw_root: PathBuf,
    pub metadata_root: PathBuf,
    pub output_root: PathBuf,
}

impl Paths {
    pub fn new(
        raw_root: impl Into<PathBuf>,
        metadata_root: impl Into<PathBuf>,
        output_root: impl Into<PathBuf>,
    ) -> Self {
        Self {
            raw_root: raw_root.into(),
            metadata_root: metadata_root.into(),
            output_root: output_root.into(),
        }
    }

    /// All three roots under one base directory.
    pub fn under(base: &Path) -> Self {
        Self::new(
            base.join("raw-data"),
            base.join("metadata"),
            base.join("generated-data"),
        )
    }

    pub fn raw_dir(&self, acronym: &str) -> PathBuf {
        self.raw_root.join(acronym)
    }

    /// Where index and quarter pages are cached, apart from contract pages.
    pub fn index_dir(&self, acronym: &str) -> PathBuf {
        self.raw_dir(acronym).join(INDEX_DIR)
    }

    pub fn metadata_dir(&self, acronym: &str) -> PathBuf {
        self.metadata_root.join(acronym)
    }

    pub fn output_dir(&self, acronym: &str) -> PathBuf {
        self.output_root.join(acronym)
    }

    pub fn raw_page(&self, acronym: &str, stem: &str) -> PathBuf {
        self.raw_dir(acronym).join(format!("{stem}.{PAGE_EXT}"))
    }

    pub fn sidecar(&self, acronym: &str, stem: &str) -> PathBuf {
        self.metadata_dir(acronym).join(format!("{stem}.{JSON_EXT}"))
    }

    pub fn record(&self, acronym: &str, stem: &str) -> PathBuf {
        self.output_dir(acronym).join(format!("{stem}.{JSON_EXT}"))
    }
}

/// Cache-slot stem for an already session-stripped URL: lowercase hex SHA-256.
pub fn page_stem(url: &str) -> String {
    let digest = Sha256::digest(url.as_bytes());
    format!("{digest:x}")
}

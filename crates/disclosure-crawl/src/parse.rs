//! Parse phase: cached raw pages → normalized records.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use disclosure_core::{Department, ParseSummary, RecordNormalizer, Settings, VendorLookup, html};
use disclosure_store::{PAGE_EXT, Paths, RecordStore, SidecarStore};
use scraper::Html;
use tracing::{info, warn};

use crate::CrawlError;

pub struct ParseOrchestrator<'a> {
    department: &'a Department,
    settings: &'a Settings,
    paths: &'a Paths,
    vendors: &'a dyn VendorLookup,
}

impl<'a> ParseOrchestrator<'a> {
    pub fn new(
        department: &'a Department,
        settings: &'a Settings,
        paths: &'a Paths,
        vendors: &'a dyn VendorLookup,
    ) -> Self {
        Self {
            department,
            settings,
            paths,
            vendors,
        }
    }

    /// Normalize every cached contract page of the department, replacing any
    /// records written by earlier runs.
    pub fn run(&self) -> Result<ParseSummary, CrawlError> {
        let acronym = self.department.acronym();
        let files = self.settings.file_limit.apply(raw_pages(&self.paths.raw_dir(acronym))?);
        let normalizer = RecordNormalizer::new(self.settings, self.vendors);
        let sidecars = SidecarStore::new(self.paths, acronym);
        let records = RecordStore::new(self.paths, acronym);
        let mut summary = ParseSummary::default();

        for path in files {
            let (Some(stem), Some(filename)) = (file_stem(&path), file_name(&path)) else {
                continue;
            };
            let bytes = fs::read(&path).map_err(|source| CrawlError::Read {
                path: path.clone(),
                source,
            })?;
            let page = html::fixup(&String::from_utf8_lossy(&bytes));
            let raw = match self.department.extract(&Html::parse_document(&page)) {
                Ok(raw) => raw,
                Err(e) => {
                    warn!(file = %filename, error = %e, "extraction failed, skipping");
                    summary.extraction_failures += 1;
                    continue;
                }
            };

            let sidecar = sidecars.read(&stem)?;
            let normalized = normalizer.normalize(raw, sidecar.as_ref(), acronym, &filename);
            for warning in &normalized.warnings {
                warn!(file = %filename, %warning, "normalization");
            }
            summary.warnings += normalized.warnings.len();

            records.write(&stem, &normalized.record)?;
            summary.files_parsed += 1;
        }

        info!(
            department = acronym,
            parsed = summary.files_parsed,
            failures = summary.extraction_failures,
            warnings = summary.warnings,
            "parse complete"
        );
        Ok(summary)
    }
}

/// Cached page files directly under `dir`, sorted by name. A missing directory
/// holds no pages.
fn raw_pages(dir: &Path) -> Result<Vec<PathBuf>, CrawlError> {
    let read_err = |source: std::io::Error| CrawlError::Read {
        path: dir.to_path_buf(),
        source,
    };
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(read_err(e)),
    };

    let mut files = Vec::new();
    for entry in entries {
        let path = entry.map_err(read_err)?.path();
        if path.is_file() && path.extension().is_some_and(|ext| ext == PAGE_EXT) {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

fn file_stem(path: &Path) -> Option<String> {
    path.file_stem().map(|s| s.to_string_lossy().into_owned())
}

fn file_name(path: &Path) -> Option<String> {
    path.file_name().map(|s| s.to_string_lossy().into_owned())
}

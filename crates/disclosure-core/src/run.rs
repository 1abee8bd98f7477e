//! Run-scoped state threaded through the fetch and parse phases.

use crate::Sidecar;

/// Counters for one run, passed `&mut` into every component that updates them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunContext {
    /// Pages served from the cache without a network call.
    pub already_cached: usize,
    /// Pages downloaded and persisted.
    pub downloaded: usize,
    /// Downloads rejected as empty, marked broken, or failed in transport.
    pub failed: usize,
}

/// The (fiscal year, fiscal quarter) attributed to the quarter being walked.
///
/// Reset whenever a quarter is entered; never persisted except through the
/// per-contract [`Sidecar`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FiscalContext {
    pub year: Option<i32>,
    pub quarter: Option<u32>,
}

impl FiscalContext {
    pub fn clear(&mut self) {
        *self = Self::default();
    }

    /// Take whichever of `year`/`quarter` are known; keep the rest.
    pub fn update(&mut self, year: Option<i32>, quarter: Option<u32>) {
        if year.is_some() {
            self.year = year;
        }
        if quarter.is_some() {
            self.quarter = quarter;
        }
    }

    /// A sidecar for `source_url`, or `None` unless both values are known.
    pub fn sidecar(&self, source_url: &str) -> Option<Sidecar> {
        Some(Sidecar {
            source_url: source_url.to_string(),
            source_year: self.year?,
            source_quarter: self.quarter?,
        })
    }
}

/// End-of-run report for the fetch phase.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FetchSummary {
    pub quarters_fetched: usize,
    /// Contract pages newly downloaded this run.
    pub contracts_fetched: usize,
    pub already_cached: usize,
    pub failed_contracts: usize,
    /// Quarter or pagination pages that could not be downloaded.
    pub failed_quarter_pages: usize,
    pub sidecars_written: usize,
    /// URLs emitted by a dev-mode dump; empty otherwise.
    pub dumped: Vec<String>,
}

/// End-of-run report for the parse phase.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParseSummary {
    pub files_parsed: usize,
    pub extraction_failures: usize,
    /// Normalization warnings across all records.
    pub warnings: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sidecar_requires_year_and_quarter() {
        let mut ctx = FiscalContext::default();
        assert!(ctx.sidecar("u").is_none());
        ctx.update(Some(2019), None);
        assert!(ctx.sidecar("u").is_none());
        ctx.update(None, Some(2));
        let sidecar = ctx.sidecar("u").unwrap();
        assert_eq!(sidecar.source_year, 2019);
        assert_eq!(sidecar.source_quarter, 2);
    }

    #[test]
    fn update_keeps_known_values() {
        let mut ctx = FiscalContext::default();
        ctx.update(Some(2020), Some(4));
        ctx.update(None, None);
        assert_eq!(ctx.year, Some(2020));
        ctx.clear();
        assert_eq!(ctx, FiscalContext::default());
    }
}

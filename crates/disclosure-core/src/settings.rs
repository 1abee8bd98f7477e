//! Run configuration, built once by the caller and passed by reference.

use std::time::Duration;

/// A processing cap where zero means unlimited.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Limit(pub usize);

impl Limit {
    pub const UNLIMITED: Limit = Limit(0);

    /// Whether another item may be processed after `done` items.
    pub fn allows(self, done: usize) -> bool {
        self.0 == 0 || done < self.0
    }

    /// Truncate `items` to the limit.
    pub fn apply<T>(self, mut items: Vec<T>) -> Vec<T> {
        if self.0 != 0 {
            items.truncate(self.0);
        }
        items
    }
}

/// Dev-mode "dump and halt" point.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DumpStage {
    /// Stop after quarter pages are listed.
    QuarterUrls,
    /// Stop after contract URLs are read from quarter pages.
    ContractUrls,
}

#[derive(Debug, Clone)]
pub struct Settings {
    /// Re-download contract pages even when a cached copy exists.
    pub redownload: bool,
    /// Global pause after every successful network fetch.
    pub download_delay: Duration,
    pub quarter_limit: Limit,
    /// Cap on contract pages per quarter.
    pub contract_limit: Limit,
    /// Cap on raw pages parsed per department.
    pub file_limit: Limit,
    pub vendor_cleanup: bool,
    /// Fill empty contract and original values with fallbacks.
    pub assure_values: bool,
    pub dump: Option<DumpStage>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            redownload: false,
            download_delay: Duration::ZERO,
            quarter_limit: Limit::UNLIMITED,
            contract_limit: Limit::UNLIMITED,
            file_limit: Limit::UNLIMITED,
            vendor_cleanup: false,
            assure_values: true,
            dump: None,
        }
    }
}

//! Storage layer: content-addressed raw page cache, metadata sidecars and
//! normalized records, one directory per department.

mod atomic;
mod error;
mod pages;
mod paths;
mod records;
mod sidecars;

pub use atomic::write_atomic;
pub use error::StoreError;
pub use pages::{CachePolicy, FailureReason, PageOutcome, PageStore};
pub use paths::{PAGE_EXT, Paths, page_stem};
pub use records::RecordStore;
pub use sidecars::SidecarStore;

//! Crawl and parse orchestration.
//!
//! [`FetchOrchestrator`] walks index → quarter → contract pages through the
//! page cache and writes fiscal sidecars; [`ParseOrchestrator`] later turns the
//! cached pages into normalized records. The two phases only meet on disk.

mod error;
mod fetch;
mod http;
mod parse;
mod traversal;

#[cfg(test)]
mod testing;

pub use error::CrawlError;
pub use fetch::FetchOrchestrator;
pub use http::{HttpClient, USER_AGENT};
pub use parse::ParseOrchestrator;
pub use traversal::QuarterTraversal;

//! Boundary to the HTML transport: "fetch URL, return body".

use crate::FetchError;

/// A blocking page transport.
///
/// Implemented by the HTTP client in `disclosure-crawl` and by in-memory stubs
/// in tests.
pub trait Fetch {
    fn fetch(&self, url: &str) -> Result<String, FetchError>;
}

impl<F: Fetch + ?Sized> Fetch for &F {
    fn fetch(&self, url: &str) -> Result<String, FetchError> {
        (**self).fetch(url)
    }
}

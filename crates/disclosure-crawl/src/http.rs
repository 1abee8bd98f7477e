//! Blocking HTTP transport for department sites.

use std::time::Duration;

use disclosure_core::{Fetch, FetchError};
use tracing::debug;

use crate::CrawlError;

pub const USER_AGENT: &str = concat!("disclosure/", env!("CARGO_PKG_VERSION"));

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// [`Fetch`] over a blocking `reqwest` client.
pub struct HttpClient {
    client: reqwest::blocking::Client,
}

impl HttpClient {
    pub fn new() -> Result<Self, CrawlError> {
        Self::with_timeout(DEFAULT_TIMEOUT)
    }

    pub fn with_timeout(timeout: Duration) -> Result<Self, CrawlError> {
        let client = reqwest::blocking::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()?;
        Ok(Self { client })
    }
}

impl Fetch for HttpClient {
    fn fetch(&self, url: &str) -> Result<String, FetchError> {
        debug!(url, "GET");
        let resp = self.client.get(url).send().map_err(transport)?;
        let status = resp.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }
        resp.text().map_err(transport)
    }
}

fn transport(e: reqwest::Error) -> FetchError {
    FetchError::Transport(Box::new(e))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_agent_carries_version() {
        assert!(USER_AGENT.starts_with("disclosure/"));
        assert!(USER_AGENT.ends_with(env!("CARGO_PKG_VERSION")));
    }

    #[test]
    fn malformed_url_is_a_transport_error() {
        let client = HttpClient::with_timeout(Duration::from_secs(1)).unwrap();
        let err = client.fetch("not a url").unwrap_err();
        assert!(matches!(err, FetchError::Transport(_)));
    }
}

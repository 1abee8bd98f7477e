//! Idempotent download cache for raw pages.
//!
//! A URL maps to exactly one cache slot: the SHA-256 of the URL after the
//! department's session stripping. A slot is only ever written with a complete,
//! accepted page (atomically), so a slot that exists is always safe to serve.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::thread;
use std::time::Duration;

use disclosure_core::{Department, Fetch, RunContext, Settings, html};
use tracing::{debug, info, warn};

use crate::paths::{PAGE_EXT, page_stem};
use crate::{StoreError, write_atomic};

/// Whether a cached copy may answer the request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CachePolicy {
    /// Serve the cached slot unless `Settings::redownload` is set. Used for
    /// contract pages, which are trimmed to the department's content subset.
    PreferCache,
    /// Always download and keep the whole page (index, quarter and
    /// pagination pages).
    Refresh,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureReason {
    Empty,
    /// The body contained the department's broken-page marker.
    BrokenMarker,
    Transport(String),
}

impl fmt::Display for FailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => write!(f, "empty response body"),
            Self::BrokenMarker => write!(f, "broken-page marker present"),
            Self::Transport(e) => write!(f, "{e}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageOutcome {
    Cached { path: PathBuf, content: String },
    Downloaded { path: PathBuf, content: String },
    Failed(FailureReason),
}

impl PageOutcome {
    pub fn content(&self) -> Option<&str> {
        match self {
            Self::Cached { content, .. } | Self::Downloaded { content, .. } => Some(content),
            Self::Failed(_) => None,
        }
    }

    pub fn was_cached(&self) -> bool {
        matches!(self, Self::Cached { .. })
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, Self::Failed(_))
    }
}

pub struct PageStore<'a> {
    department: &'a Department,
    settings: &'a Settings,
    fetcher: &'a dyn Fetch,
}

impl<'a> PageStore<'a> {
    pub fn new(department: &'a Department, settings: &'a Settings, fetcher: &'a dyn Fetch) -> Self {
        Self {
            department,
            settings,
            fetcher,
        }
    }

    /// Cache-slot stem for `url`.
    pub fn stem(&self, url: &str) -> String {
        page_stem(&self.department.strip_session(url))
    }

    /// Cache-slot path for `url` inside `dir`.
    pub fn slot(&self, url: &str, dir: &Path) -> PathBuf {
        dir.join(format!("{}.{PAGE_EXT}", self.stem(url)))
    }

    /// Pause applied after each successful download.
    pub fn delay(&self) -> Duration {
        self.settings.download_delay + self.department.download_delay()
    }

    /// Return the cached page for `url`, or download, check and persist it.
    ///
    /// Transport failures, empty bodies and broken-page markers are reported
    /// as [`PageOutcome::Failed`] and counted in `ctx.failed`; only
    /// filesystem errors are returned as `Err`.
    pub fn fetch_or_cached(
        &self,
        ctx: &mut RunContext,
        url: &str,
        dir: &Path,
        policy: CachePolicy,
    ) -> Result<PageOutcome, StoreError> {
        let path = self.slot(url, dir);
        let use_cache = policy == CachePolicy::PreferCache && !self.settings.redownload;

        if use_cache && path.is_file() {
            let content = fs::read_to_string(&path).map_err(|e| StoreError::io(&path, e))?;
            ctx.already_cached += 1;
            debug!(url, path = %path.display(), "cache hit");
            return Ok(PageOutcome::Cached { path, content });
        }

        let body = match self.fetcher.fetch(url) {
            Ok(body) => body,
            Err(e) => return Ok(self.reject(ctx, url, FailureReason::Transport(e.to_string()))),
        };
        if body.trim().is_empty() {
            return Ok(self.reject(ctx, url, FailureReason::Empty));
        }
        if let Some(marker) = self.department.broken_page_marker()
            && body.contains(marker)
        {
            return Ok(self.reject(ctx, url, FailureReason::BrokenMarker));
        }

        let subset = match policy {
            CachePolicy::PreferCache => self.department.content_subset(),
            CachePolicy::Refresh => None,
        };
        let content = match subset {
            Some(selector) => html::subset(&body, selector).unwrap_or_else(|| {
                debug!(url, "content subset matched nothing, keeping full page");
                body
            }),
            None => body,
        };

        write_atomic(&path, content.as_bytes())?;
        ctx.downloaded += 1;
        info!(url, bytes = content.len(), "downloaded page");

        let delay = self.delay();
        if !delay.is_zero() {
            thread::sleep(delay);
        }
        Ok(PageOutcome::Downloaded { path, content })
    }

    fn reject(&self, ctx: &mut RunContext, url: &str, reason: FailureReason) -> PageOutcome {
        ctx.failed += 1;
        warn!(url, %reason, "page download failed, skipping");
        PageOutcome::Failed(reason)
    }
}

//! Fetch phase: quarter traversal, contract page caching and fiscal sidecars.

use std::path::PathBuf;

use disclosure_core::{
    Department, DumpStage, Fetch, FetchSummary, FiscalContext, RunContext, Settings, html,
};
use disclosure_store::{CachePolicy, PageOutcome, PageStore, Paths, SidecarStore};
use scraper::Html;
use tracing::{debug, info, warn};

use crate::{CrawlError, QuarterTraversal};

pub struct FetchOrchestrator<'a> {
    department: &'a Department,
    settings: &'a Settings,
    paths: &'a Paths,
    fetcher: &'a dyn Fetch,
}

impl<'a> FetchOrchestrator<'a> {
    pub fn new(
        department: &'a Department,
        settings: &'a Settings,
        paths: &'a Paths,
        fetcher: &'a dyn Fetch,
    ) -> Self {
        Self {
            department,
            settings,
            paths,
            fetcher,
        }
    }

    /// Fetch every contract page reachable from the department index.
    ///
    /// Individual page failures are counted in the summary; only an unreachable
    /// index page or a filesystem error ends the run early.
    pub fn run(&self, ctx: &mut RunContext) -> Result<FetchSummary, CrawlError> {
        let dept = self.department;
        let pages = PageStore::new(dept, self.settings, self.fetcher);
        let groups = QuarterTraversal::new(dept, self.settings, self.paths, &pages)
            .list_quarter_pages(ctx)?;

        let mut summary = FetchSummary::default();
        if self.settings.dump == Some(DumpStage::QuarterUrls) {
            for url in groups.into_iter().flatten() {
                info!(url = %url, "quarter page");
                summary.dumped.push(url);
            }
            return Ok(summary);
        }

        let cached_before = ctx.already_cached;
        let mut walk = QuarterWalk {
            department: dept,
            settings: self.settings,
            pages: &pages,
            sidecars: SidecarStore::new(self.paths, dept.acronym()),
            index_dir: self.paths.index_dir(dept.acronym()),
            raw_dir: self.paths.raw_dir(dept.acronym()),
            summary: &mut summary,
        };
        for group in &groups {
            walk.quarter(ctx, group)?;
        }

        summary.already_cached = ctx.already_cached - cached_before;
        info!(
            department = dept.acronym(),
            quarters = summary.quarters_fetched,
            downloaded = summary.contracts_fetched,
            cached = summary.already_cached,
            failed = summary.failed_contracts,
            failed_quarters = summary.failed_quarter_pages,
            sidecars = summary.sidecars_written,
            "fetch complete"
        );
        Ok(summary)
    }
}

/// State for walking the quarter groups of one run.
struct QuarterWalk<'a, 's> {
    department: &'a Department,
    settings: &'a Settings,
    pages: &'a PageStore<'a>,
    sidecars: SidecarStore<'a>,
    index_dir: PathBuf,
    raw_dir: PathBuf,
    summary: &'s mut FetchSummary,
}

impl QuarterWalk<'_, '_> {
    fn quarter(&mut self, ctx: &mut RunContext, group: &[String]) -> Result<(), CrawlError> {
        let dept = self.department;
        let mut fiscal = FiscalContext::default();
        let mut contracts_seen = 0;
        let mut pages_read = 0;

        for page_url in group {
            let outcome =
                self.pages
                    .fetch_or_cached(ctx, page_url, &self.index_dir, CachePolicy::Refresh)?;
            let Some(body) = outcome.content() else {
                warn!(url = %page_url, "quarter page unavailable, skipping");
                self.summary.failed_quarter_pages += 1;
                continue;
            };
            pages_read += 1;

            let doc = Html::parse_document(body);
            fiscal.update(dept.fiscal_year(&doc), dept.fiscal_quarter(&doc));
            let links = html::links(&doc, dept.contract_links());
            debug!(
                url = %page_url,
                contracts = links.len(),
                year = ?fiscal.year,
                quarter = ?fiscal.quarter,
                "quarter page read"
            );

            for link in links {
                if !self.settings.contract_limit.allows(contracts_seen) {
                    break;
                }
                contracts_seen += 1;
                let url = dept.contract_url(&link);
                if self.settings.dump == Some(DumpStage::ContractUrls) {
                    info!(url = %url, "contract page");
                    self.summary.dumped.push(url);
                    continue;
                }
                self.contract(ctx, &url, &fiscal)?;
            }
        }

        if pages_read > 0 {
            self.summary.quarters_fetched += 1;
        }
        Ok(())
    }

    fn contract(
        &mut self,
        ctx: &mut RunContext,
        url: &str,
        fiscal: &FiscalContext,
    ) -> Result<(), CrawlError> {
        let outcome = self
            .pages
            .fetch_or_cached(ctx, url, &self.raw_dir, CachePolicy::PreferCache)?;
        match outcome {
            PageOutcome::Failed(_) => {
                self.summary.failed_contracts += 1;
                return Ok(());
            }
            PageOutcome::Downloaded { .. } => self.summary.contracts_fetched += 1,
            PageOutcome::Cached { .. } => {}
        }

        let source_url = self.department.strip_session(url);
        match fiscal.sidecar(&source_url) {
            Some(sidecar) => {
                self.sidecars.write(&self.pages.stem(url), &sidecar)?;
                self.summary.sidecars_written += 1;
            }
            None => debug!(url, "fiscal context unknown, no sidecar written"),
        }
        Ok(())
    }
}

//! Index → quarter page discovery.

use std::path::PathBuf;

use disclosure_core::{Department, RunContext, Settings, html};
use disclosure_store::{CachePolicy, PageOutcome, PageStore, Paths};
use scraper::Html;
use tracing::{info, warn};

use crate::CrawlError;

/// Walks a department's index page to the groups of quarter pages under it.
///
/// Each group is one quarter: the quarter URL itself, or every page of it when
/// the department paginates its quarter listings.
pub struct QuarterTraversal<'a> {
    department: &'a Department,
    settings: &'a Settings,
    pages: &'a PageStore<'a>,
    index_dir: PathBuf,
}

impl<'a> QuarterTraversal<'a> {
    pub fn new(
        department: &'a Department,
        settings: &'a Settings,
        paths: &Paths,
        pages: &'a PageStore<'a>,
    ) -> Self {
        Self {
            department,
            settings,
            pages,
            index_dir: paths.index_dir(department.acronym()),
        }
    }

    /// Quarter page groups in index order, capped at the quarter limit.
    pub fn list_quarter_pages(&self, ctx: &mut RunContext) -> Result<Vec<Vec<String>>, CrawlError> {
        let dept = self.department;
        let index_url = dept.index_url();
        let outcome = self
            .pages
            .fetch_or_cached(ctx, index_url, &self.index_dir, CachePolicy::Refresh)?;
        if let PageOutcome::Failed(reason) = &outcome {
            return Err(CrawlError::IndexUnavailable {
                url: index_url.to_string(),
                reason: reason.to_string(),
            });
        }

        let doc = Html::parse_document(outcome.content().unwrap_or_default());
        let discovered = html::links(&doc, dept.quarter_links());
        let total = discovered.len();
        let quarters: Vec<String> = discovered
            .into_iter()
            .filter(|link| dept.keep_quarter(link))
            .map(|link| dept.quarter_url(&link))
            .collect();
        info!(
            department = dept.acronym(),
            discovered = total,
            kept = quarters.len(),
            "quarters discovered"
        );

        // Quarters past the limit are never requested, not even for pagination.
        let quarters = self.settings.quarter_limit.apply(quarters);
        quarters
            .into_iter()
            .map(|quarter| self.group(ctx, quarter))
            .collect()
    }

    fn group(&self, ctx: &mut RunContext, quarter_url: String) -> Result<Vec<String>, CrawlError> {
        let dept = self.department;
        let Some(pagination) = dept.pagination_links() else {
            return Ok(vec![quarter_url]);
        };

        let outcome = self
            .pages
            .fetch_or_cached(ctx, &quarter_url, &self.index_dir, CachePolicy::Refresh)?;
        let Some(body) = outcome.content() else {
            warn!(url = %quarter_url, "quarter page unavailable, skipping pagination");
            return Ok(vec![quarter_url]);
        };
        let doc = Html::parse_document(body);

        let mut group = Vec::new();
        if dept.include_first_page() {
            group.push(quarter_url.clone());
        }
        for link in html::links(&doc, pagination) {
            let url = dept.quarter_url(&link);
            if !group.contains(&url) {
                group.push(url);
            }
        }
        if group.is_empty() {
            group.push(quarter_url);
        }
        Ok(group)
    }
}

//! Department descriptors: the capabilities the crawl and parse phases need
//! from each department.
//!
//! Required pieces are the index URL, the owner acronym, the index→quarter and
//! quarter→contract link selectors, and the raw extractor. Every optional hook
//! is filled with an identity / accept-all / "unknown" default when the
//! descriptor is built, so callers never branch on whether a hook exists.

use std::fmt;
use std::time::Duration;

use scraper::{Html, Selector};
use serde_json::{Map, Value};

use crate::CoreError;
use crate::html::parse_selector;

/// A partial record as produced by a department extractor: schema keys to
/// raw values. Missing keys are allowed.
pub type RawRecord = Map<String, Value>;

pub type UrlTransform = Box<dyn Fn(&str) -> String>;
pub type UrlFilter = Box<dyn Fn(&str) -> bool>;
pub type YearHook = Box<dyn Fn(&Html) -> Option<i32>>;
pub type QuarterHook = Box<dyn Fn(&Html) -> Option<u32>>;
pub type Extractor = Box<dyn Fn(&Html) -> Result<RawRecord, CoreError>>;

pub struct Department {
    acronym: String,
    index_url: String,
    quarter_links: Selector,
    contract_links: Selector,
    pagination_links: Option<Selector>,
    include_first_page: bool,
    content_subset: Option<Selector>,
    broken_page_marker: Option<String>,
    download_delay: Duration,
    quarter_filter: UrlFilter,
    quarter_transform: UrlTransform,
    contract_transform: UrlTransform,
    strip_session: UrlTransform,
    fiscal_year: YearHook,
    fiscal_quarter: QuarterHook,
    extractor: Extractor,
}

impl Department {
    pub fn builder(acronym: impl Into<String>, index_url: impl Into<String>) -> DepartmentBuilder {
        DepartmentBuilder {
            acronym: acronym.into(),
            index_url: index_url.into(),
            ..DepartmentBuilder::default()
        }
    }

    pub fn acronym(&self) -> &str {
        &self.acronym
    }

    pub fn index_url(&self) -> &str {
        &self.index_url
    }

    pub fn quarter_links(&self) -> &Selector {
        &self.quarter_links
    }

    pub fn contract_links(&self) -> &Selector {
        &self.contract_links
    }

    pub fn pagination_links(&self) -> Option<&Selector> {
        self.pagination_links.as_ref()
    }

    /// Whether the first quarter page belongs in its own pagination group.
    pub fn include_first_page(&self) -> bool {
        self.include_first_page
    }

    pub fn content_subset(&self) -> Option<&Selector> {
        self.content_subset.as_ref()
    }

    pub fn broken_page_marker(&self) -> Option<&str> {
        self.broken_page_marker.as_deref()
    }

    /// Extra pause after each download, added to the global delay.
    pub fn download_delay(&self) -> Duration {
        self.download_delay
    }

    pub fn keep_quarter(&self, url: &str) -> bool {
        (self.quarter_filter)(url)
    }

    pub fn quarter_url(&self, link: &str) -> String {
        (self.quarter_transform)(link)
    }

    pub fn contract_url(&self, link: &str) -> String {
        (self.contract_transform)(link)
    }

    /// The URL with session identifiers removed; this is what cache slots and
    /// sidecars are keyed on.
    pub fn strip_session(&self, url: &str) -> String {
        (self.strip_session)(url)
    }

    pub fn fiscal_year(&self, page: &Html) -> Option<i32> {
        (self.fiscal_year)(page)
    }

    pub fn fiscal_quarter(&self, page: &Html) -> Option<u32> {
        (self.fiscal_quarter)(page)
    }

    /// Run the department's raw field extraction on a contract page.
    pub fn extract(&self, page: &Html) -> Result<RawRecord, CoreError> {
        (self.extractor)(page)
    }
}

impl fmt::Debug for Department {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Department")
            .field("acronym", &self.acronym)
            .field("index_url", &self.index_url)
            .field("paginated", &self.pagination_links.is_some())
            .field("include_first_page", &self.include_first_page)
            .field("broken_page_marker", &self.broken_page_marker)
            .field("download_delay", &self.download_delay)
            .finish_non_exhaustive()
    }
}

#[derive(Default)]
pub struct DepartmentBuilder {
    acronym: String,
    index_url: String,
    quarter_links: Option<String>,
    contract_links: Option<String>,
    pagination_links: Option<String>,
    include_first_page: bool,
    content_subset: Option<String>,
    broken_page_marker: Option<String>,
    download_delay: Duration,
    quarter_filter: Option<UrlFilter>,
    quarter_transform: Option<UrlTransform>,
    contract_transform: Option<UrlTransform>,
    strip_session: Option<UrlTransform>,
    fiscal_year: Option<YearHook>,
    fiscal_quarter: Option<QuarterHook>,
    extractor: Option<Extractor>,
}

impl DepartmentBuilder {
    pub fn quarter_links(mut self, css: impl Into<String>) -> Self {
        self.quarter_links = Some(css.into());
        self
    }

    pub fn contract_links(mut self, css: impl Into<String>) -> Self {
        self.contract_links = Some(css.into());
        self
    }

    pub fn pagination_links(mut self, css: impl Into<String>) -> Self {
        self.pagination_links = Some(css.into());
        self
    }

    pub fn include_first_page(mut self, include: bool) -> Self {
        self.include_first_page = include;
        self
    }

    pub fn content_subset(mut self, css: impl Into<String>) -> Self {
        self.content_subset = Some(css.into());
        self
    }

    pub fn broken_page_marker(mut self, marker: impl Into<String>) -> Self {
        self.broken_page_marker = Some(marker.into());
        self
    }

    pub fn download_delay(mut self, delay: Duration) -> Self {
        self.download_delay = delay;
        self
    }

    pub fn quarter_filter(mut self, f: impl Fn(&str) -> bool + 'static) -> Self {
        self.quarter_filter = Some(Box::new(f));
        self
    }

    pub fn quarter_transform(mut self, f: impl Fn(&str) -> String + 'static) -> Self {
        self.quarter_transform = Some(Box::new(f));
        self
    }

    pub fn contract_transform(mut self, f: impl Fn(&str) -> String + 'static) -> Self {
        self.contract_transform = Some(Box::new(f));
        self
    }

    pub fn strip_session(mut self, f: impl Fn(&str) -> String + 'static) -> Self {
        self.strip_session = Some(Box::new(f));
        self
    }

    pub fn fiscal_year(mut self, f: impl Fn(&Html) -> Option<i32> + 'static) -> Self {
        self.fiscal_year = Some(Box::new(f));
        self
    }

    pub fn fiscal_quarter(mut self, f: impl Fn(&Html) -> Option<u32> + 'static) -> Self {
        self.fiscal_quarter = Some(Box::new(f));
        self
    }

    pub fn extractor(
        mut self,
        f: impl Fn(&Html) -> Result<RawRecord, CoreError> + 'static,
    ) -> Self {
        self.extractor = Some(Box::new(f));
        self
    }

    /// Parse every selector and fill absent hooks with their defaults.
    pub fn build(self) -> Result<Department, CoreError> {
        let missing = |field| CoreError::MissingField {
            department: self.acronym.clone(),
            field,
        };
        if self.acronym.trim().is_empty() {
            return Err(missing("acronym"));
        }
        if self.index_url.trim().is_empty() {
            return Err(missing("index_url"));
        }
        let quarter_links = parse_selector(
            self.quarter_links
                .as_deref()
                .ok_or_else(|| missing("quarter_links"))?,
        )?;
        let contract_links = parse_selector(
            self.contract_links
                .as_deref()
                .ok_or_else(|| missing("contract_links"))?,
        )?;
        let extractor = self.extractor.ok_or_else(|| missing("extractor"))?;
        let pagination_links = self.pagination_links.as_deref().map(parse_selector).transpose()?;
        let content_subset = self.content_subset.as_deref().map(parse_selector).transpose()?;

        Ok(Department {
            acronym: self.acronym,
            index_url: self.index_url,
            quarter_links,
            contract_links,
            pagination_links,
            include_first_page: self.include_first_page,
            content_subset,
            broken_page_marker: self.broken_page_marker.filter(|m| !m.is_empty()),
            download_delay: self.download_delay,
            quarter_filter: self.quarter_filter.unwrap_or_else(|| Box::new(|_: &str| true)),
            quarter_transform: self.quarter_transform.unwrap_or_else(identity),
            contract_transform: self.contract_transform.unwrap_or_else(identity),
            strip_session: self.strip_session.unwrap_or_else(identity),
            fiscal_year: self.fiscal_year.unwrap_or_else(|| Box::new(|_: &Html| None)),
            fiscal_quarter: self.fiscal_quarter.unwrap_or_else(|| Box::new(|_: &Html| None)),
            extractor,
        })
    }
}

fn identity() -> UrlTransform {
    Box::new(|s: &str| s.to_string())
}

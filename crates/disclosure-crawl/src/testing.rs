//! In-memory site and sample department shared by the orchestration tests.

use std::cell::RefCell;
use std::collections::HashMap;

use disclosure_core::fiscal::{parse_fiscal_quarter, parse_fiscal_year};
use disclosure_core::html::{parse_selector, select_text};
use disclosure_core::{CoreError, Department, DepartmentBuilder, Fetch, FetchError, RawRecord};
use scraper::Html;
use serde_json::Value;

pub const INDEX: &str = "https://abc.gc.ca/disclosure";

/// A [`Fetch`] serving fixed pages and recording every request.
#[derive(Default)]
pub struct StubFetcher {
    pages: HashMap<String, String>,
    calls: RefCell<Vec<String>>,
}

impl StubFetcher {
    pub fn page(mut self, url: &str, body: impl Into<String>) -> Self {
        self.pages.insert(url.to_string(), body.into());
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.borrow().clone()
    }

    pub fn calls_to(&self, url: &str) -> usize {
        self.calls.borrow().iter().filter(|u| *u == url).count()
    }
}

impl Fetch for StubFetcher {
    fn fetch(&self, url: &str) -> Result<String, FetchError> {
        self.calls.borrow_mut().push(url.to_string());
        self.pages.get(url).cloned().ok_or_else(|| FetchError::Status {
            status: 404,
            url: url.to_string(),
        })
    }
}

pub fn index_page(quarters: &[&str]) -> String {
    let items: String = quarters
        .iter()
        .map(|q| format!("<li><a class=\"quarter\" href=\"{q}\">{q}</a></li>"))
        .collect();
    format!("<html><body><ul>{items}</ul></body></html>")
}

pub fn quarter_page(heading: &str, contracts: &[&str]) -> String {
    let rows: String = contracts
        .iter()
        .map(|c| format!("<tr><td><a class=\"contract\" href=\"{c}\">{c}</a></td></tr>"))
        .collect();
    format!("<html><body><h1>{heading}</h1><table>{rows}</table></body></html>")
}

pub fn contract_page(vendor: &str, reference: &str, value: &str) -> String {
    format!(
        "<html><body><nav>Home</nav><div id=\"detail\">\
         <span id=\"vendor\">{vendor}</span>\
         <span id=\"reference\">{reference}</span>\
         <span id=\"value\">{value}</span>\
         <span id=\"description\">0813 - Temporary help</span>\
         </div></body></html>"
    )
}

/// Department ABC: quarters under `ul a.quarter`, fiscal year and quarter read
/// from the quarter page's `h1`, fields read by id.
pub fn department() -> DepartmentBuilder {
    let heading = parse_selector("h1").unwrap();
    let quarter_heading = heading.clone();
    Department::builder("ABC", INDEX)
        .quarter_links("ul a.quarter")
        .contract_links("a.contract")
        .broken_page_marker("Page not found")
        .fiscal_year(move |doc: &Html| {
            select_text(doc, &heading).and_then(|t| parse_fiscal_year(&t))
        })
        .fiscal_quarter(move |doc: &Html| {
            select_text(doc, &quarter_heading).and_then(|t| parse_fiscal_quarter(&t))
        })
        .extractor(extract)
}

fn extract(doc: &Html) -> Result<RawRecord, CoreError> {
    let mut raw = RawRecord::new();
    for (id, key) in [
        ("vendor", "vendorName"),
        ("reference", "referenceNumber"),
        ("value", "contractValue"),
        ("description", "description"),
    ] {
        if let Some(text) = select_text(doc, &parse_selector(&format!("#{id}"))?) {
            raw.insert(key.to_string(), Value::String(text));
        }
    }
    if raw.is_empty() {
        return Err(CoreError::Extraction("no contract fields".into()));
    }
    Ok(raw)
}

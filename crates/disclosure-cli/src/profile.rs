//! Declarative department profiles.
//!
//! A profile is a JSON file describing one department's site: where the index
//! lives, CSS selectors for each link level, optional URL hooks and the field
//! extraction rules for contract pages. It is turned into a [`Department`].

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use std::time::Duration;

use anyhow::{Context, bail};
use disclosure_core::fiscal::{parse_fiscal_quarter, parse_fiscal_year};
use disclosure_core::html::{collapse_whitespace, parse_selector, select_text};
use disclosure_core::{CoreError, Department, RawRecord, SCHEMA_KEYS, transforms};
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use serde::Deserialize;
use serde_json::Value;

const AMENDED_VALUES: &str = "amendedValues";

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct DepartmentProfile {
    pub acronym: String,
    pub index_url: String,
    /// Base for relative links; defaults to `index_url`.
    #[serde(default)]
    pub base_url: Option<String>,
    pub quarter_links: String,
    pub contract_links: String,
    #[serde(default)]
    pub pagination_links: Option<String>,
    #[serde(default)]
    pub include_first_page: bool,
    /// Regexes; quarter links matching any of them are skipped.
    #[serde(default)]
    pub exclude_quarters: Vec<String>,
    /// Query parameters carrying session state.
    #[serde(default)]
    pub session_params: Vec<String>,
    /// Element whose text names the fiscal year and quarter on quarter pages.
    #[serde(default)]
    pub fiscal_selector: Option<String>,
    #[serde(default)]
    pub content_subset: Option<String>,
    #[serde(default)]
    pub broken_page_marker: Option<String>,
    #[serde(default)]
    pub delay_seconds: f64,
    /// Schema key → selector for the element holding its value.
    #[serde(default)]
    pub fields: BTreeMap<String, String>,
    #[serde(default)]
    pub labels: Option<LabelTable>,
}

/// Label/value rows, as in `<tr><th>Vendor Name:</th><td>Acme</td></tr>`.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LabelTable {
    pub row: String,
    pub label: String,
    pub value: String,
    /// Label text (case-insensitive, trailing colon ignored) → schema key.
    pub labels: BTreeMap<String, String>,
}

impl DepartmentProfile {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let json = fs::read_to_string(path)
            .with_context(|| format!("reading profile {}", path.display()))?;
        serde_json::from_str(&json).with_context(|| format!("parsing profile {}", path.display()))
    }

    pub fn into_department(self) -> anyhow::Result<Department> {
        let acronym = self.acronym.trim().to_string();
        if self.fields.is_empty() && self.labels.is_none() {
            bail!("profile {acronym} has neither `fields` nor `labels`");
        }
        let delay = Duration::try_from_secs_f64(self.delay_seconds).with_context(|| {
            format!("profile {acronym}: invalid delaySeconds {}", self.delay_seconds)
        })?;

        let base = self.base_url.as_deref().unwrap_or(&self.index_url);
        let extractor = FieldExtractor::new(&self.fields, self.labels.as_ref())
            .with_context(|| format!("profile {acronym}: field rules"))?;
        let exclusions = self
            .exclude_quarters
            .iter()
            .map(|pattern| Regex::new(pattern))
            .collect::<Result<Vec<_>, _>>()
            .with_context(|| format!("profile {acronym}: excludeQuarters"))?;

        let mut builder = Department::builder(&acronym, &self.index_url)
            .quarter_links(self.quarter_links)
            .contract_links(self.contract_links)
            .include_first_page(self.include_first_page)
            .download_delay(delay)
            .quarter_transform(transforms::absolute(base)?)
            .contract_transform(transforms::absolute(base)?)
            .extractor(move |doc: &Html| extractor.extract(doc));

        if let Some(css) = self.pagination_links {
            builder = builder.pagination_links(css);
        }
        if let Some(css) = self.content_subset {
            builder = builder.content_subset(css);
        }
        if let Some(marker) = self.broken_page_marker {
            builder = builder.broken_page_marker(marker);
        }
        if !exclusions.is_empty() {
            builder = builder
                .quarter_filter(move |url: &str| !exclusions.iter().any(|re| re.is_match(url)));
        }
        if !self.session_params.is_empty() {
            let names: Vec<&str> = self.session_params.iter().map(String::as_str).collect();
            builder = builder.strip_session(transforms::strip_query_params(&names));
        }
        if let Some(css) = self.fiscal_selector {
            let year_heading = parse_selector(&css)?;
            let quarter_heading = year_heading.clone();
            builder = builder
                .fiscal_year(move |doc: &Html| {
                    select_text(doc, &year_heading).and_then(|t| parse_fiscal_year(&t))
                })
                .fiscal_quarter(move |doc: &Html| {
                    select_text(doc, &quarter_heading).and_then(|t| parse_fiscal_quarter(&t))
                });
        }

        Ok(builder.build()?)
    }
}

/// Compiled field rules.
struct FieldExtractor {
    fields: Vec<(String, Selector)>,
    labels: Option<CompiledLabels>,
}

struct CompiledLabels {
    row: Selector,
    label: Selector,
    value: Selector,
    keys: BTreeMap<String, String>,
}

impl FieldExtractor {
    fn new(
        fields: &BTreeMap<String, String>,
        labels: Option<&LabelTable>,
    ) -> Result<Self, CoreError> {
        let mut compiled = Vec::with_capacity(fields.len());
        for (key, css) in fields {
            check_key(key)?;
            compiled.push((key.clone(), parse_selector(css)?));
        }
        let labels = match labels {
            Some(table) => {
                let mut keys = BTreeMap::new();
                for (label, key) in &table.labels {
                    check_key(key)?;
                    keys.insert(label_key(label), key.clone());
                }
                Some(CompiledLabels {
                    row: parse_selector(&table.row)?,
                    label: parse_selector(&table.label)?,
                    value: parse_selector(&table.value)?,
                    keys,
                })
            }
            None => None,
        };
        Ok(Self {
            fields: compiled,
            labels,
        })
    }

    /// Direct field selectors first, then label rows for keys still missing.
    /// Fails when nothing at all was found.
    fn extract(&self, doc: &Html) -> Result<RawRecord, CoreError> {
        let mut raw = RawRecord::new();
        for (key, selector) in &self.fields {
            if key == AMENDED_VALUES {
                for el in doc.select(selector) {
                    push_amendment(&mut raw, text_of(el));
                }
            } else if let Some(text) = select_text(doc, selector) {
                raw.insert(key.clone(), Value::String(text));
            }
        }

        if let Some(labels) = &self.labels {
            for row in doc.select(&labels.row) {
                let (Some(label), Some(value)) = (
                    row.select(&labels.label).next(),
                    row.select(&labels.value).next(),
                ) else {
                    continue;
                };
                let Some(key) = labels.keys.get(&label_key(&text_of(label))) else {
                    continue;
                };
                let value = text_of(value);
                if key == AMENDED_VALUES {
                    push_amendment(&mut raw, value);
                } else if !value.is_empty() && !raw.contains_key(key) {
                    raw.insert(key.clone(), Value::String(value));
                }
            }
        }

        if raw.is_empty() {
            return Err(CoreError::Extraction("no field rule matched".into()));
        }
        Ok(raw)
    }
}

fn check_key(key: &str) -> Result<(), CoreError> {
    if SCHEMA_KEYS.contains(&key) {
        Ok(())
    } else {
        Err(CoreError::Extraction(format!("`{key}` is not a record field")))
    }
}

fn label_key(label: &str) -> String {
    collapse_whitespace(label).trim_end_matches(':').trim().to_lowercase()
}

fn text_of(el: ElementRef<'_>) -> String {
    collapse_whitespace(&el.text().collect::<String>())
}

fn push_amendment(raw: &mut RawRecord, value: String) {
    if value.is_empty() {
        return;
    }
    let entry = raw
        .entry(AMENDED_VALUES)
        .or_insert_with(|| Value::Array(Vec::new()));
    if let Value::Array(items) = entry {
        items.push(Value::String(value));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PROFILE: &str = r##"{
        "acronym": "ABC",
        "indexUrl": "https://www.abc.gc.ca/disclosure/index.html",
        "quarterLinks": "ul.quarters a",
        "contractLinks": "table a",
        "excludeQuarters": ["/archive/"],
        "sessionParams": ["sid"],
        "fiscalSelector": "h1",
        "brokenPageMarker": "Page not found",
        "delaySeconds": 0.5,
        "fields": { "description": "#description" },
        "labels": {
            "row": "tr",
            "label": "th",
            "value": "td",
            "labels": {
                "Vendor Name": "vendorName",
                "Reference Number": "referenceNumber",
                "Contract Value": "contractValue",
                "Amended Value": "amendedValues"
            }
        }
    }"##;

    const CONTRACT: &str = r#"<html><body>
        <p id="description">0813 Temporary help</p>
        <table>
          <tr><th>Vendor Name:</th><td>Acme  Inc.</td></tr>
          <tr><th>reference number</th><td>C-77</td></tr>
          <tr><th>Contract Value:</th><td>$1,000.00</td></tr>
          <tr><th>Amended Value:</th><td>$1,200.00</td></tr>
          <tr><th>Amended Value:</th><td>$1,500.00</td></tr>
          <tr><th>Comments</th><td>ignored</td></tr>
        </table></body></html>"#;

    fn department() -> Department {
        let profile: DepartmentProfile = serde_json::from_str(PROFILE).unwrap();
        profile.into_department().unwrap()
    }

    #[test]
    fn label_rows_and_fields_extract() {
        let dept = department();
        let raw = dept.extract(&Html::parse_document(CONTRACT)).unwrap();
        assert_eq!(raw["vendorName"], "Acme Inc.");
        assert_eq!(raw["referenceNumber"], "C-77");
        assert_eq!(raw["contractValue"], "$1,000.00");
        assert_eq!(raw["description"], "0813 Temporary help");
        assert_eq!(raw["amendedValues"], serde_json::json!(["$1,200.00", "$1,500.00"]));
        assert!(!raw.contains_key("comments"));
    }

    #[test]
    fn page_without_fields_fails_extraction() {
        let dept = department();
        let err = dept
            .extract(&Html::parse_document("<p>Maintenance</p>"))
            .unwrap_err();
        assert!(matches!(err, CoreError::Extraction(_)));
    }

    #[test]
    fn url_hooks_from_profile() {
        let dept = department();
        assert_eq!(
            dept.quarter_url("q/2019-3.html"),
            "https://www.abc.gc.ca/disclosure/q/2019-3.html"
        );
        assert!(!dept.keep_quarter("https://www.abc.gc.ca/archive/2009-1.html"));
        assert!(dept.keep_quarter("https://www.abc.gc.ca/disclosure/q/2019-3.html"));
        assert_eq!(
            dept.strip_session("https://www.abc.gc.ca/c?id=4&sid=XYZ"),
            "https://www.abc.gc.ca/c?id=4"
        );
        assert_eq!(dept.broken_page_marker(), Some("Page not found"));
        assert_eq!(dept.download_delay(), Duration::from_millis(500));
    }

    #[test]
    fn fiscal_selector_reads_quarter_heading() {
        let dept = department();
        let page = Html::parse_document("<h1>Contracts, 2019-2020, Third Quarter</h1>");
        assert_eq!(dept.fiscal_year(&page), Some(2019));
        assert_eq!(dept.fiscal_quarter(&page), Some(3));
    }

    #[test]
    fn unknown_field_key_is_rejected() {
        let mut profile: DepartmentProfile = serde_json::from_str(PROFILE).unwrap();
        profile.fields.insert("vendor".into(), "#vendor".into());
        assert!(profile.into_department().is_err());
    }

    #[test]
    fn delay_must_be_a_valid_duration() {
        for delay in [-1.0, 1e30] {
            let mut profile: DepartmentProfile = serde_json::from_str(PROFILE).unwrap();
            profile.delay_seconds = delay;
            assert!(profile.into_department().is_err(), "delay {delay}");
        }
    }

    #[test]
    fn unknown_profile_keys_are_rejected() {
        let json = PROFILE.replacen("\"acronym\"", "\"acronymm\": \"x\", \"acronym\"", 1);
        assert!(serde_json::from_str::<DepartmentProfile>(&json).is_err());
    }

    #[test]
    fn bundled_sample_profile_builds() {
        let json = include_str!("../../../profiles/sample.json");
        let profile: DepartmentProfile = serde_json::from_str(json).unwrap();
        let dept = profile.into_department().unwrap();
        assert_eq!(dept.acronym(), "SAMPLE");
        assert!(dept.pagination_links().is_some());
        assert!(dept.include_first_page());
    }

    #[test]
    fn load_reads_profile_file() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("abc.json");
        fs::write(&path, PROFILE).unwrap();
        let profile = DepartmentProfile::load(&path).unwrap();
        assert_eq!(profile.acronym, "ABC");
        assert!(DepartmentProfile::load(&tmp.path().join("missing.json")).is_err());
    }
}

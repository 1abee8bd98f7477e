//! Thin helpers over the `scraper` HTML engine, plus the markup fixups applied
//! to every raw page before extraction.

use std::sync::LazyLock;

use regex::Regex;
use scraper::{Html, Selector};

use crate::CoreError;

static BR_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)<br\s*/?>").expect("literal pattern"));

/// Mis-decoded Windows-1252 sequences seen on departmental pages.
const MOJIBAKE: &[(&str, &str)] = &[
    ("â€™", "'"),
    ("â€˜", "'"),
    ("â€œ", "\""),
    ("â€\u{9d}", "\""),
    ("â€“", "-"),
    ("â€”", "-"),
    ("â€¦", "..."),
    ("Ã©", "é"),
    ("Ã¨", "è"),
    ("Ãª", "ê"),
    ("Ã‰", "É"),
    ("Ã§", "ç"),
    ("Ã´", "ô"),
    ("Ã®", "î"),
    ("Ã ", "à "),
    ("Â ", " "),
];

/// Parse a CSS selector, mapping failures to [`CoreError::InvalidSelector`].
pub fn parse_selector(css: &str) -> Result<Selector, CoreError> {
    Selector::parse(css).map_err(|e| CoreError::InvalidSelector {
        selector: css.to_string(),
        reason: e.to_string(),
    })
}

/// `href` values of every element matching `selector`, in document order.
pub fn links(doc: &Html, selector: &Selector) -> Vec<String> {
    doc.select(selector)
        .filter_map(|el| el.value().attr("href"))
        .map(str::trim)
        .filter(|href| !href.is_empty())
        .map(str::to_string)
        .collect()
}

/// Whitespace-collapsed text of the first element matching `selector`.
pub fn select_text(doc: &Html, selector: &Selector) -> Option<String> {
    let el = doc.select(selector).next()?;
    let text = collapse_whitespace(&el.text().collect::<String>());
    (!text.is_empty()).then_some(text)
}

/// Outer HTML of all elements matching `selector`, or `None` if none match.
pub fn subset(html: &str, selector: &Selector) -> Option<String> {
    let doc = Html::parse_document(html);
    let parts: Vec<String> = doc.select(selector).map(|el| el.html()).collect();
    (!parts.is_empty()).then(|| parts.join("\n"))
}

pub fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Encoding and markup fixups shared by all departments.
pub fn fixup(html: &str) -> String {
    let mut out = html.trim_start_matches('\u{feff}').replace("\r\n", "\n");
    for (bad, good) in MOJIBAKE {
        if out.contains(bad) {
            out = out.replace(bad, good);
        }
    }
    out = out
        .replace("&nbsp;", " ")
        .replace("&#160;", " ")
        .replace('\u{a0}', " ");
    BR_RE.replace_all(&out, "\n").into_owned()
}

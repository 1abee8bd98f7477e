//! Fiscal year and quarter recognition from quarter-page text.
//!
//! The federal fiscal year starts in April: April–June is Q1, July–September
//! Q2, October–December Q3 and January–March Q4. Pages name the quarter in
//! many ways ("Q3", "3rd quarter", "Third Quarter", "October 1 to December
//! 31", "1er octobre au 31 décembre"), so matching is loose.

use std::sync::LazyLock;

use regex::Regex;

static YEAR_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b(199\d|20\d\d)\b").expect("literal pattern"));

static SPAN_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(199\d|20\d\d)\s*[-–/]\s*(?:\d{4}|\d{2})\b").expect("literal pattern")
});

static QUARTER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(concat!(
        r"(?i)\bQ\s?([1-4])\b",
        r"|\bquarter\s+([1-4])\b",
        r"|\b([1-4])(?:st|nd|rd|th|er|e)\s+(?:quarter|trimestre)\b",
        r"|\btrimestre\s+([1-4])\b",
    ))
    .expect("literal pattern")
});

const ORDINALS: &[(&str, u32)] = &[
    ("first quarter", 1),
    ("second quarter", 2),
    ("third quarter", 3),
    ("fourth quarter", 4),
    ("premier trimestre", 1),
    ("deuxième trimestre", 2),
    ("troisième trimestre", 3),
    ("quatrième trimestre", 4),
];

/// Month name prefixes mapped to their fiscal quarter.
const MONTHS: &[(&str, u32)] = &[
    ("january", 4),
    ("janvier", 4),
    ("february", 4),
    ("février", 4),
    ("march", 4),
    ("mars", 4),
    ("april", 1),
    ("avril", 1),
    ("may", 1),
    ("mai", 1),
    ("june", 1),
    ("juin", 1),
    ("july", 2),
    ("juillet", 2),
    ("august", 2),
    ("août", 2),
    ("september", 2),
    ("septembre", 2),
    ("october", 3),
    ("octobre", 3),
    ("november", 3),
    ("novembre", 3),
    ("december", 3),
    ("décembre", 3),
];

/// First plausible calendar year in `text`.
pub fn calendar_year(text: &str) -> Option<i32> {
    YEAR_RE
        .captures(text)
        .and_then(|c| c.get(1))
        .and_then(|m| m.as_str().parse().ok())
}

/// Fiscal year named in `text`. A span like `2019-2020` or `2019-20` gives
/// its starting year. Otherwise a January–March month range belongs to the
/// fiscal year that started the previous April.
pub fn parse_fiscal_year(text: &str) -> Option<i32> {
    if let Some(start) = SPAN_RE.captures(text).and_then(|c| c[1].parse().ok()) {
        return Some(start);
    }
    let year = calendar_year(text)?;
    match month_quarter(&text.to_lowercase()) {
        Some(4) => Some(year - 1),
        _ => Some(year),
    }
}

/// Fiscal quarter (1–4) named in `text`.
pub fn parse_fiscal_quarter(text: &str) -> Option<u32> {
    if let Some(caps) = QUARTER_RE.captures(text) {
        return caps
            .iter()
            .skip(1)
            .flatten()
            .next()
            .and_then(|m| m.as_str().parse().ok());
    }

    let lower = text.to_lowercase();
    if let Some((_, q)) = ORDINALS.iter().find(|(word, _)| lower.contains(word)) {
        return Some(*q);
    }

    month_quarter(&lower)
}

/// A month range names the quarter by its first month.
fn month_quarter(lower: &str) -> Option<u32> {
    lower.split(|c: char| !c.is_alphabetic()).find_map(|word| {
        MONTHS
            .iter()
            .find(|(month, _)| word == *month)
            .map(|(_, q)| *q)
    })
}

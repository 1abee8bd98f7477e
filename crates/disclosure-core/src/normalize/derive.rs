//! Department-agnostic derivation rules.

use std::sync::LazyLock;

use regex::Regex;
use serde_json::{Map, Number, Value};

use super::{as_f64, text};
use crate::fiscal::calendar_year;

static OBJECT_CODE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*(\d{4})(?:\s*([-–:.])\s*|\s+|$)(.*)$").expect("literal pattern")
});

/// A leading four-digit economic object code in `description` moves into
/// `objectCode` (when that is still empty).
///
/// A leading 19xx/20xx only counts when a separator follows it; otherwise it
/// is read as a year and the description is left alone.
pub fn object_code(map: &mut Map<String, Value>) {
    if !text(map, "objectCode").is_empty() {
        return;
    }
    let description = text(map, "description");
    let Some(caps) = OBJECT_CODE_RE.captures(&description) else {
        return;
    };
    let code = caps[1].to_string();
    if caps.get(2).is_none() && (code.starts_with("19") || code.starts_with("20")) {
        return;
    }
    let rest = caps[3].trim().to_string();
    map.insert("objectCode".into(), Value::String(code));
    if !rest.is_empty() {
        map.insert("description".into(), Value::String(rest));
    }
}

/// `2019-20-Q3` for fiscal year 2019, quarter 3.
pub fn fiscal_label(year: i64, quarter: i64) -> String {
    format!("{}-{:02}-Q{}", year, (year + 1).rem_euclid(100), quarter)
}

/// Fill `sourceFiscal`, `startYear` and `endYear`.
pub fn fiscal_and_years(map: &mut Map<String, Value>) {
    let year = integer(map, "sourceYear");
    let quarter = integer(map, "sourceQuarter").filter(|q| (1..=4).contains(q));
    if let (Some(y), Some(q)) = (year, quarter) {
        map.insert("sourceFiscal".into(), Value::String(fiscal_label(y, q)));
    }

    if text(map, "startYear").is_empty() {
        let start = year_of(&text(map, "contractPeriodStart"))
            .or_else(|| year_of(&text(map, "contractDate")));
        if let Some(y) = start {
            map.insert("startYear".into(), Value::from(y));
        }
    }
    if text(map, "endYear").is_empty()
        && let Some(y) = year_of(&text(map, "contractPeriodEnd"))
    {
        map.insert("endYear".into(), Value::from(y));
    }
}

/// With amendments, the first known total becomes `originalValue` and the
/// latest amended total becomes `contractValue`.
pub fn amended_value(map: &mut Map<String, Value>) {
    let amounts: Vec<f64> = match map.get("amendedValues") {
        Some(Value::Array(items)) => items.iter().filter_map(as_f64).collect(),
        _ => return,
    };
    let Some(&latest) = amounts.last() else {
        return;
    };

    let current = map.get("contractValue").and_then(as_f64);
    if map.get("originalValue").and_then(as_f64).is_none() {
        let original = current.unwrap_or(amounts[0]);
        if let Some(n) = Number::from_f64(original) {
            map.insert("originalValue".into(), Value::Number(n));
        }
    }
    if let Some(n) = Number::from_f64(latest) {
        map.insert("contractValue".into(), Value::Number(n));
    }
}

fn integer(map: &Map<String, Value>, key: &str) -> Option<i64> {
    match map.get(key)? {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn year_of(date: &str) -> Option<i32> {
    if date.is_empty() {
        return None;
    }
    calendar_year(date)
}

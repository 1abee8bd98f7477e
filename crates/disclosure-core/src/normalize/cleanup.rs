//! Field-level cleanup over a merged record map: text, money and dates.

use std::sync::LazyLock;

use chrono::NaiveDate;
use regex::Regex;
use serde_json::{Map, Number, Value};

use crate::html::collapse_whitespace;
use crate::record::{DATE_KEYS, MONEY_KEYS};

static NUMERIC_ENTITY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"&#(x[0-9a-fA-F]+|\d+);").expect("literal pattern"));

static RANGE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(.+?)\s+(?:to|au|until|-|–)\s+(.+)$").expect("literal pattern")
});

const NAMED_ENTITIES: &[(&str, &str)] = &[
    ("&nbsp;", " "),
    ("&lt;", "<"),
    ("&gt;", ">"),
    ("&quot;", "\""),
    ("&apos;", "'"),
    ("&rsquo;", "'"),
    ("&ndash;", "-"),
    ("&eacute;", "é"),
    ("&amp;", "&"),
];

const DATE_FORMATS: &[&str] = &[
    "%Y-%m-%d",
    "%Y/%m/%d",
    "%Y.%m.%d",
    "%B %d, %Y",
    "%b %d, %Y",
    "%b. %d, %Y",
    "%B %d %Y",
    "%d %B %Y",
    "%d %b %Y",
    "%d-%b-%Y",
];

/// Clean every field of `map`. Pure: the same map always cleans the same way.
pub fn clean_fields(mut map: Map<String, Value>) -> Map<String, Value> {
    for value in map.values_mut() {
        clean_value(value);
    }

    for key in MONEY_KEYS {
        if let Some(value) = map.get_mut(*key) {
            *value = money_value(value);
        }
    }
    if let Some(Value::Array(items)) = map.get_mut("amendedValues") {
        for item in items.iter_mut() {
            *item = money_value(item);
        }
    }

    split_period(&mut map);
    for key in DATE_KEYS {
        if let Some(Value::String(s)) = map.get_mut(*key)
            && let Some(date) = parse_date(s)
        {
            *s = date.format("%Y-%m-%d").to_string();
        }
    }
    map
}

fn clean_value(value: &mut Value) {
    match value {
        Value::String(s) => *s = clean_text(s),
        Value::Bool(b) => {
            let text = b.to_string();
            *value = Value::String(text);
        }
        Value::Array(items) => items.iter_mut().for_each(clean_value),
        Value::Null | Value::Number(_) | Value::Object(_) => {}
    }
}

/// Decode leftover HTML entities, collapse whitespace and trim.
pub fn clean_text(s: &str) -> String {
    let mut out = s.to_string();
    if out.contains('&') {
        for (entity, ch) in NAMED_ENTITIES {
            out = out.replace(entity, ch);
        }
        out = NUMERIC_ENTITY_RE
            .replace_all(&out, |caps: &regex::Captures| {
                let code = &caps[1];
                let parsed = match code.strip_prefix('x') {
                    Some(hex) => u32::from_str_radix(hex, 16).ok(),
                    None => code.parse().ok(),
                };
                parsed
                    .and_then(char::from_u32)
                    .map(String::from)
                    .unwrap_or_default()
            })
            .into_owned();
    }
    collapse_whitespace(&out)
}

fn money_value(value: &Value) -> Value {
    match value {
        Value::String(s) => match parse_money(s).and_then(Number::from_f64) {
            Some(n) => Value::Number(n),
            None => value.clone(),
        },
        _ => value.clone(),
    }
}

/// Parse a displayed amount: `$1,234.56`, `1 234,56 $`, `(500.00)`, `-12`.
pub fn parse_money(s: &str) -> Option<f64> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }
    let negative = (s.starts_with('(') && s.ends_with(')')) || s.starts_with('-');
    let digits: String = s
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.' || *c == ',')
        .collect();
    if !digits.chars().any(|c| c.is_ascii_digit()) {
        return None;
    }

    let last_comma = digits.rfind(',');
    let last_dot = digits.rfind('.');
    let decimal_comma = match (last_comma, last_dot) {
        // 1 234,56 or 1.234,56
        (Some(c), None) => digits.len() - c - 1 == 2,
        (Some(c), Some(d)) => c > d,
        _ => false,
    };
    let normalized = if decimal_comma {
        digits.replace('.', "").replace(',', ".")
    } else {
        digits.replace(',', "")
    };

    let amount: f64 = normalized.parse().ok()?;
    Some(if negative { -amount } else { amount })
}

/// Parse a date written in one of the common departmental formats.
pub fn parse_date(s: &str) -> Option<NaiveDate> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }
    // 2019-04-01T00:00:00 and 2019-04-01 00:00:00
    let s = match s.char_indices().nth(10) {
        Some((i, c)) if c == 'T' || c == ' ' => {
            let head = &s[..i];
            if NaiveDate::parse_from_str(head, "%Y-%m-%d").is_ok() {
                head
            } else {
                s
            }
        }
        _ => s,
    };
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(s, fmt).ok())
}

/// `contractPeriodStart = "2019-04-01 to 2020-03-31"` with an empty end is
/// split into both fields.
fn split_period(map: &mut Map<String, Value>) {
    let end_blank = match map.get("contractPeriodEnd") {
        Some(Value::String(s)) => s.is_empty(),
        Some(Value::Null) | None => true,
        _ => false,
    };
    if !end_blank {
        return;
    }
    let Some(Value::String(start)) = map.get("contractPeriodStart") else {
        return;
    };
    let Some(caps) = RANGE_RE.captures(start) else {
        return;
    };
    let (from, to) = (caps[1].trim().to_string(), caps[2].trim().to_string());
    if parse_date(&from).is_some() && parse_date(&to).is_some() {
        map.insert("contractPeriodStart".into(), Value::String(from));
        map.insert("contractPeriodEnd".into(), Value::String(to));
    }
}

//! Vertical card display for normalized contract records.

use std::io::{self, Write};

use disclosure_core::ContractRecord;
use disclosure_core::record::MONEY_KEYS;
use serde_json::Value;

// ── Schema section groupings ──

const IDENTITY: &[&str] = &["uuid", "referenceNumber", "ownerAcronym", "vendorName"];

const DESCRIPTION: &[&str] = &["description", "extraDescription", "objectCode", "comments"];

const DATES: &[&str] = &[
    "contractDate",
    "contractPeriodStart",
    "contractPeriodEnd",
    "startYear",
    "endYear",
    "deliveryDate",
];

const VALUES: &[&str] = &["originalValue", "contractValue", "amendedValues"];

const SOURCE: &[&str] = &[
    "sourceFiscal",
    "sourceYear",
    "sourceQuarter",
    "sourceFilename",
    "sourceURL",
];

// ── Public API ──

/// Print a record as a vertical card grouped by schema section.
pub fn print_record_card(record: &ContractRecord) -> anyhow::Result<()> {
    let stdout = io::stdout();
    write_record_card(&mut stdout.lock(), record)?;
    Ok(())
}

pub fn write_record_card(out: &mut impl Write, record: &ContractRecord) -> anyhow::Result<()> {
    let value = serde_json::to_value(record)?;
    let Value::Object(fields) = value else {
        anyhow::bail!("record did not serialize to an object");
    };

    writeln!(out, "=== {} ===", record.uuid)?;
    if !record.vendor_name.is_empty() {
        writeln!(out, "{}", record.vendor_name)?;
    }
    writeln!(out)?;

    for (header, keys) in [
        ("Identity", IDENTITY),
        ("Description", DESCRIPTION),
        ("Dates", DATES),
        ("Values", VALUES),
        ("Source", SOURCE),
    ] {
        write_section(out, header, keys, &fields)?;
    }
    Ok(())
}

// ── Section rendering ──

fn write_section(
    out: &mut impl Write,
    header: &str,
    keys: &[&str],
    fields: &serde_json::Map<String, Value>,
) -> io::Result<()> {
    let rows: Vec<(&str, String)> = keys
        .iter()
        .filter_map(|&key| Some((key, format_value(key, fields.get(key)?)?)))
        .collect();
    if rows.is_empty() {
        return Ok(());
    }

    writeln!(out, "{header}")?;
    for (key, text) in rows {
        writeln!(out, "  {:<26} {}", key, text)?;
    }
    writeln!(out)
}

/// Display text for one field, or `None` for an empty value.
fn format_value(key: &str, value: &Value) -> Option<String> {
    match value {
        Value::String(s) if s.is_empty() => None,
        Value::String(s) => Some(s.clone()),
        Value::Number(n) if MONEY_KEYS.contains(&key) => n.as_f64().map(money),
        Value::Number(n) => Some(n.to_string()),
        Value::Array(items) if items.is_empty() => None,
        Value::Array(items) => Some(
            items
                .iter()
                .map(|v| v.as_f64().map(money).unwrap_or_else(|| v.to_string()))
                .collect::<Vec<_>>()
                .join(" → "),
        ),
        Value::Null => None,
        other => Some(other.to_string()),
    }
}

fn money(amount: f64) -> String {
    format!("${amount:.2}")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn card(record: &ContractRecord) -> String {
        let mut out = Vec::new();
        write_record_card(&mut out, record).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn card_groups_populated_fields() {
        let record = ContractRecord {
            uuid: "ABC-C-1".into(),
            reference_number: "C-1".into(),
            owner_acronym: "ABC".into(),
            vendor_name: "Acme".into(),
            contract_value: Some(1500.0),
            original_value: Some(1000.0),
            amended_values: vec![1200.0, 1500.0],
            source_year: Some(2019),
            source_quarter: Some(3),
            source_fiscal: "2019-20-Q3".into(),
            ..ContractRecord::default()
        };
        let text = card(&record);

        assert!(text.starts_with("=== ABC-C-1 ===\nAcme\n"));
        assert!(text.contains("Identity\n"));
        assert!(text.contains("  contractValue              $1500.00\n"));
        assert!(text.contains("$1200.00 → $1500.00"));
        assert!(text.contains("  sourceQuarter              3\n"));
        // Nothing in the Dates or Description sections.
        assert!(!text.contains("Dates\n"));
        assert!(!text.contains("Description\n"));
    }

    #[test]
    fn empty_record_has_only_identity_header() {
        let text = card(&ContractRecord::default());
        assert_eq!(text, "===  ===\n\n");
    }
}

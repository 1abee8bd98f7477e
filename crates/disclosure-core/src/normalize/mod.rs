//! Record normalization: department raw extraction → canonical [`ContractRecord`].
//!
//! The pipeline is strictly ordered; each stage may rely on fields set by the
//! stages before it:
//!
//! 1. merge the raw extraction over the schema defaults
//! 2. field cleanup (text, money, dates)
//! 3. merge the metadata sidecar (sidecar values win)
//! 4. derive `objectCode` from `description`
//! 5. derive `sourceFiscal`, start/end years and amendment-aware values
//! 6. canonicalize the vendor name (when enabled)
//! 7. assure mandatory values, warning on every fill
//! 8. coerce types for serialization
//! 9. assign source filename, owner, reference-number fallback and `uuid`
//!
//! Normalization never fails: any raw map, including an empty one, yields a
//! fully populated record plus a list of warnings.

mod cleanup;
mod derive;

use std::fmt;
use std::path::Path;

use serde_json::{Map, Value};
use tracing::debug;

pub use cleanup::{clean_fields, clean_text, parse_date, parse_money};
pub use derive::fiscal_label;

use crate::{ContractRecord, RawRecord, Settings, Sidecar, VendorLookup};

/// Vendor name used when none could be extracted.
pub const UNKNOWN_VENDOR: &str = "Unknown";

/// Prefix of reference numbers generated from the source file stem.
pub const GENERATED_REFERENCE_PREFIX: &str = "generated-";

/// A non-fatal problem found while normalizing one record.
#[derive(Debug, Clone, PartialEq)]
pub enum NormalizeWarning {
    /// `contractValue` was empty and was filled from `originalValue`.
    ContractValueFromOriginal,
    /// Neither value was known; `contractValue` set to zero.
    ContractValueZero,
    OriginalValueFromContract,
    VendorUnknown,
    ReferenceGenerated(String),
    /// A field held a value that could not be coerced to its schema type.
    Uncoercible { field: &'static str, value: String },
}

impl fmt::Display for NormalizeWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ContractValueFromOriginal => {
                write!(f, "contractValue empty, using originalValue")
            }
            Self::ContractValueZero => write!(f, "contractValue empty, defaulting to 0"),
            Self::OriginalValueFromContract => {
                write!(f, "originalValue empty, using contractValue")
            }
            Self::VendorUnknown => write!(f, "vendorName empty, using \"{UNKNOWN_VENDOR}\""),
            Self::ReferenceGenerated(r) => write!(f, "referenceNumber empty, generated {r}"),
            Self::Uncoercible { field, value } => {
                write!(f, "{field} value {value:?} is not valid, using default")
            }
        }
    }
}

/// A normalized record and the warnings raised while producing it.
#[derive(Debug, Clone)]
pub struct Normalized {
    pub record: ContractRecord,
    pub warnings: Vec<NormalizeWarning>,
}

/// Runs the normalization pipeline with an injected vendor lookup.
pub struct RecordNormalizer<'a> {
    settings: &'a Settings,
    vendors: &'a dyn VendorLookup,
}

impl<'a> RecordNormalizer<'a> {
    pub fn new(settings: &'a Settings, vendors: &'a dyn VendorLookup) -> Self {
        Self { settings, vendors }
    }

    /// Normalize one raw extraction. `source_filename` is the cached raw
    /// page's file name; its stem backs the reference-number fallback.
    pub fn normalize(
        &self,
        raw: RawRecord,
        sidecar: Option<&Sidecar>,
        owner_acronym: &str,
        source_filename: &str,
    ) -> Normalized {
        let mut warnings = Vec::new();

        let map = merge_defaults(raw);
        let mut map = clean_fields(map);
        if let Some(sidecar) = sidecar {
            merge_sidecar(&mut map, sidecar);
        }
        derive::object_code(&mut map);
        derive::fiscal_and_years(&mut map);
        derive::amended_value(&mut map);
        if self.settings.vendor_cleanup {
            let vendor = text(&map, "vendorName");
            if !vendor.is_empty() {
                let canonical = self.vendors.canonicalize(&vendor);
                map.insert("vendorName".into(), Value::String(canonical));
            }
        }
        self.assure_values(&mut map, &mut warnings);

        let mut record = coerce(map, &mut warnings);

        record.source_filename = source_filename.to_string();
        record.owner_acronym = owner_acronym.trim().to_string();
        if record.reference_number.is_empty() {
            let stem = Path::new(source_filename)
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_else(|| source_filename.to_string());
            record.reference_number = format!("{GENERATED_REFERENCE_PREFIX}{stem}");
            warnings.push(NormalizeWarning::ReferenceGenerated(
                record.reference_number.clone(),
            ));
        }
        record.uuid = format!("{}-{}", record.owner_acronym, record.reference_number);

        Normalized { record, warnings }
    }

    fn assure_values(&self, map: &mut Map<String, Value>, warnings: &mut Vec<NormalizeWarning>) {
        if self.settings.assure_values {
            let contract = map.get("contractValue").and_then(as_f64);
            let original = map.get("originalValue").and_then(as_f64);
            match (contract, original) {
                (None, Some(o)) => {
                    map.insert("contractValue".into(), Value::from(o));
                    warnings.push(NormalizeWarning::ContractValueFromOriginal);
                }
                (None, None) => {
                    map.insert("contractValue".into(), Value::from(0.0));
                    warnings.push(NormalizeWarning::ContractValueZero);
                }
                (Some(_), _) => {}
            }
            if original.is_none() {
                let filled = map.get("contractValue").and_then(as_f64).unwrap_or(0.0);
                map.insert("originalValue".into(), Value::from(filled));
                warnings.push(NormalizeWarning::OriginalValueFromContract);
            }
        }

        if text(map, "vendorName").is_empty() {
            map.insert("vendorName".into(), Value::String(UNKNOWN_VENDOR.into()));
            warnings.push(NormalizeWarning::VendorUnknown);
        }
    }
}

/// Stage 1: exactly the schema keys, raw values over defaults.
fn merge_defaults(raw: RawRecord) -> Map<String, Value> {
    let mut map = ContractRecord::default_map();
    for (key, value) in raw {
        if value.is_null() {
            continue;
        }
        match map.get_mut(&key) {
            Some(slot) => *slot = value,
            None => debug!(field = %key, "dropping unknown raw field"),
        }
    }
    map
}

/// Stage 3: fetch-time context is authoritative.
fn merge_sidecar(map: &mut Map<String, Value>, sidecar: &Sidecar) {
    map.insert("sourceURL".into(), Value::String(sidecar.source_url.clone()));
    map.insert("sourceYear".into(), Value::from(sidecar.source_year));
    map.insert("sourceQuarter".into(), Value::from(sidecar.source_quarter));
}

/// Stage 8: map → typed record.
fn coerce(map: Map<String, Value>, warnings: &mut Vec<NormalizeWarning>) -> ContractRecord {
    let string = |key: &str| text(&map, key);
    let mut integer = |field: &'static str| -> Option<i64> {
        match map.get(field) {
            Some(Value::Number(n)) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
            Some(Value::String(s)) if s.is_empty() => None,
            Some(Value::String(s)) => s.trim().parse().ok().or_else(|| {
                warnings.push(NormalizeWarning::Uncoercible {
                    field,
                    value: s.clone(),
                });
                None
            }),
            _ => None,
        }
    };
    let start_year = integer("startYear").and_then(|v| i32::try_from(v).ok());
    let end_year = integer("endYear").and_then(|v| i32::try_from(v).ok());
    let source_year = integer("sourceYear").and_then(|v| i32::try_from(v).ok());
    let source_quarter = integer("sourceQuarter")
        .and_then(|v| u32::try_from(v).ok())
        .filter(|q| (1..=4).contains(q));

    let mut money = |field: &'static str| -> Option<f64> {
        match map.get(field) {
            Some(Value::String(s)) if s.is_empty() => None,
            Some(value) => as_f64(value).map(cents).or_else(|| {
                warnings.push(NormalizeWarning::Uncoercible {
                    field,
                    value: value.to_string(),
                });
                None
            }),
            None => None,
        }
    };
    let original_value = money("originalValue");
    let contract_value = money("contractValue");

    let amended_values = match map.get("amendedValues") {
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(|item| {
                let amount = as_f64(item).map(cents);
                if amount.is_none() {
                    warnings.push(NormalizeWarning::Uncoercible {
                        field: "amendedValues",
                        value: item.to_string(),
                    });
                }
                amount
            })
            .collect(),
        Some(Value::String(s)) if s.is_empty() => Vec::new(),
        Some(other) => as_f64(other).map(cents).into_iter().collect(),
        None => Vec::new(),
    };

    ContractRecord {
        uuid: string("uuid"),
        vendor_name: string("vendorName"),
        reference_number: string("referenceNumber"),
        contract_date: string("contractDate"),
        description: string("description"),
        extra_description: string("extraDescription"),
        object_code: string("objectCode"),
        contract_period_start: string("contractPeriodStart"),
        contract_period_end: string("contractPeriodEnd"),
        start_year,
        end_year,
        delivery_date: string("deliveryDate"),
        original_value,
        contract_value,
        comments: string("comments"),
        owner_acronym: string("ownerAcronym"),
        source_year,
        source_quarter,
        source_fiscal: string("sourceFiscal"),
        source_filename: string("sourceFilename"),
        source_url: string("sourceURL"),
        amended_values,
    }
}

/// Scalar field as display text; blank for null, lists and objects.
pub(crate) fn text(map: &Map<String, Value>, key: &str) -> String {
    match map.get(key) {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        Some(Value::Bool(b)) => b.to_string(),
        _ => String::new(),
    }
}

pub(crate) fn as_f64(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => parse_money(s),
        _ => None,
    }
}

fn cents(amount: f64) -> f64 {
    (amount * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{IdentityVendors, SCHEMA_KEYS, VendorTable};
    use serde_json::json;

    fn raw(value: Value) -> RawRecord {
        match value {
            Value::Object(map) => map,
            _ => panic!("expected object"),
        }
    }

    fn normalize(settings: &Settings, input: RawRecord, sidecar: Option<&Sidecar>) -> Normalized {
        RecordNormalizer::new(settings, &IdentityVendors).normalize(
            input,
            sidecar,
            "PWGSC",
            "5f2c9a.html",
        )
    }

    fn keys_of(record: &ContractRecord) -> Vec<String> {
        match serde_json::to_value(record).unwrap() {
            Value::Object(map) => map.keys().cloned().collect(),
            _ => panic!("record must serialize to an object"),
        }
    }

    #[test]
    fn empty_input_yields_full_schema() {
        let settings = Settings::default();
        let out = normalize(&settings, RawRecord::new(), None);
        let mut keys = keys_of(&out.record);
        keys.sort();
        let mut expected: Vec<String> = SCHEMA_KEYS.iter().map(|k| k.to_string()).collect();
        expected.sort();
        assert_eq!(keys, expected);
        assert_eq!(out.record.reference_number, "generated-5f2c9a");
        assert_eq!(out.record.uuid, "PWGSC-generated-5f2c9a");
        assert_eq!(out.record.contract_value, Some(0.0));
        assert_eq!(out.record.vendor_name, UNKNOWN_VENDOR);
        assert!(out.warnings.contains(&NormalizeWarning::ContractValueZero));
        assert!(out.warnings.contains(&NormalizeWarning::VendorUnknown));
    }

    #[test]
    fn uuid_uses_reference_number() {
        let settings = Settings::default();
        let input = raw(json!({
            "referenceNumber": " 4500012345 ",
            "vendorName": "Acme",
            "contractValue": "$1,000.00",
        }));
        let out = normalize(&settings, input, None);
        assert_eq!(out.record.reference_number, "4500012345");
        assert_eq!(out.record.uuid, "PWGSC-4500012345");
        assert_eq!(out.record.source_filename, "5f2c9a.html");
        assert_eq!(out.record.owner_acronym, "PWGSC");
    }

    #[test]
    fn unknown_raw_fields_are_dropped() {
        let settings = Settings::default();
        let input = raw(json!({ "vendorName": "Acme", "bogus": "x" }));
        let out = normalize(&settings, input, None);
        assert!(!keys_of(&out.record).contains(&"bogus".to_string()));
    }

    #[test]
    fn sidecar_overrides_raw_fields() {
        let settings = Settings::default();
        let input = raw(json!({
            "sourceURL": "https://wrong.example",
            "sourceYear": "1999",
            "vendorName": "Acme",
        }));
        let sidecar = Sidecar {
            source_url: "https://dept.gc.ca/c/1".into(),
            source_year: 2019,
            source_quarter: 3,
        };
        let out = normalize(&settings, input, Some(&sidecar));
        assert_eq!(out.record.source_url, "https://dept.gc.ca/c/1");
        assert_eq!(out.record.source_year, Some(2019));
        assert_eq!(out.record.source_quarter, Some(3));
        assert_eq!(out.record.source_fiscal, "2019-20-Q3");
    }

    #[test]
    fn missing_sidecar_leaves_defaults() {
        let settings = Settings::default();
        let out = normalize(&settings, raw(json!({ "vendorName": "Acme" })), None);
        assert_eq!(out.record.source_year, None);
        assert_eq!(out.record.source_quarter, None);
        assert_eq!(out.record.source_fiscal, "");
        let value = serde_json::to_value(&out.record).unwrap();
        assert_eq!(value["sourceYear"], "");
        assert_eq!(value["sourceQuarter"], "");
    }

    #[test]
    fn object_code_and_years_derived() {
        let settings = Settings::default();
        let input = raw(json!({
            "vendorName": "Acme",
            "description": "0491 - Management consulting",
            "contractPeriodStart": "April 1, 2019 to March 31, 2021",
            "contractValue": "50 000,00 $",
        }));
        let out = normalize(&settings, input, None);
        assert_eq!(out.record.object_code, "0491");
        assert_eq!(out.record.description, "Management consulting");
        assert_eq!(out.record.contract_period_start, "2019-04-01");
        assert_eq!(out.record.contract_period_end, "2021-03-31");
        assert_eq!(out.record.start_year, Some(2019));
        assert_eq!(out.record.end_year, Some(2021));
        assert_eq!(out.record.contract_value, Some(50000.0));
        assert_eq!(out.record.original_value, Some(50000.0));
    }

    #[test]
    fn amendments_drive_contract_value() {
        let settings = Settings::default();
        let input = raw(json!({
            "vendorName": "Acme",
            "contractValue": "10,000.00",
            "amendedValues": ["12,500.00", "$14,999.999"],
        }));
        let out = normalize(&settings, input, None);
        assert_eq!(out.record.original_value, Some(10000.0));
        assert_eq!(out.record.contract_value, Some(15000.0));
        assert_eq!(out.record.amended_values, vec![12500.0, 15000.0]);
    }

    #[test]
    fn assurance_off_leaves_values_empty() {
        let settings = Settings {
            assure_values: false,
            ..Settings::default()
        };
        let out = normalize(&settings, raw(json!({ "vendorName": "Acme" })), None);
        assert_eq!(out.record.contract_value, None);
        assert_eq!(out.record.original_value, None);
        assert!(!out.warnings.contains(&NormalizeWarning::ContractValueZero));
    }

    #[test]
    fn contract_value_falls_back_to_original() {
        let settings = Settings::default();
        let input = raw(json!({ "vendorName": "Acme", "originalValue": "$700" }));
        let out = normalize(&settings, input, None);
        assert_eq!(out.record.contract_value, Some(700.0));
        assert!(
            out.warnings
                .contains(&NormalizeWarning::ContractValueFromOriginal)
        );
    }

    #[test]
    fn vendor_cleanup_uses_lookup() {
        let settings = Settings {
            vendor_cleanup: true,
            ..Settings::default()
        };
        let table = VendorTable::from_json(r#"{ "Acme Ltd.": ["ACME LIMITED"] }"#).unwrap();
        let out = RecordNormalizer::new(&settings, &table).normalize(
            raw(json!({ "vendorName": "acme limited" })),
            None,
            "PWGSC",
            "a.html",
        );
        assert_eq!(out.record.vendor_name, "Acme Ltd.");
    }

    #[test]
    fn vendor_cleanup_disabled_keeps_extracted_name() {
        let settings = Settings::default();
        let table = VendorTable::from_json(r#"{ "Acme Ltd.": ["ACME LIMITED"] }"#).unwrap();
        let out = RecordNormalizer::new(&settings, &table).normalize(
            raw(json!({ "vendorName": "acme limited" })),
            None,
            "PWGSC",
            "a.html",
        );
        assert_eq!(out.record.vendor_name, "acme limited");
    }

    #[test]
    fn bad_year_warns_and_defaults() {
        let settings = Settings::default();
        let out = normalize(
            &settings,
            raw(json!({ "vendorName": "Acme", "startYear": "soon" })),
            None,
        );
        assert_eq!(out.record.start_year, None);
        assert!(out.warnings.iter().any(|w| matches!(
            w,
            NormalizeWarning::Uncoercible {
                field: "startYear",
                ..
            }
        )));
    }

    #[test]
    fn fallback_references_differ_per_file() {
        let settings = Settings::default();
        let normalizer = RecordNormalizer::new(&settings, &IdentityVendors);
        let a = normalizer.normalize(RawRecord::new(), None, "ABC", "aaaa.html");
        let b = normalizer.normalize(RawRecord::new(), None, "ABC", "bbbb.html");
        let a2 = normalizer.normalize(RawRecord::new(), None, "ABC", "aaaa.html");
        assert_ne!(a.record.reference_number, b.record.reference_number);
        assert_eq!(a.record.reference_number, a2.record.reference_number);
    }

    #[test]
    fn null_raw_values_count_as_missing() {
        let settings = Settings::default();
        let out = normalize(
            &settings,
            raw(json!({ "vendorName": null, "comments": null })),
            None,
        );
        assert_eq!(out.record.comments, "");
        assert_eq!(out.record.vendor_name, UNKNOWN_VENDOR);
    }
}

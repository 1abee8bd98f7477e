//! The canonical contract record schema and the fetch-time metadata sidecar.
//!
//! Every department's data is reduced to [`ContractRecord`]. Serialized, a
//! record always carries exactly the keys in [`SCHEMA_KEYS`]; values that are
//! unknown serialize as the schema default (`""` for scalars, `[]` for
//! `amendedValues`).

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Canonical record keys, in serialization order.
pub const SCHEMA_KEYS: &[&str] = &[
    "uuid",
    "vendorName",
    "referenceNumber",
    "contractDate",
    "description",
    "extraDescription",
    "objectCode",
    "contractPeriodStart",
    "contractPeriodEnd",
    "startYear",
    "endYear",
    "deliveryDate",
    "originalValue",
    "contractValue",
    "comments",
    "ownerAcronym",
    "sourceYear",
    "sourceQuarter",
    "sourceFiscal",
    "sourceFilename",
    "sourceURL",
    "amendedValues",
];

/// Monetary keys parsed into numbers during cleanup.
pub const MONEY_KEYS: &[&str] = &["originalValue", "contractValue"];

/// Date keys rewritten as `YYYY-MM-DD` during cleanup.
pub const DATE_KEYS: &[&str] = &[
    "contractDate",
    "contractPeriodStart",
    "contractPeriodEnd",
    "deliveryDate",
];

/// A normalized contract disclosure record.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContractRecord {
    pub uuid: String,
    pub vendor_name: String,
    pub reference_number: String,
    pub contract_date: String,
    pub description: String,
    pub extra_description: String,
    pub object_code: String,
    pub contract_period_start: String,
    pub contract_period_end: String,
    #[serde(with = "blank")]
    pub start_year: Option<i32>,
    #[serde(with = "blank")]
    pub end_year: Option<i32>,
    pub delivery_date: String,
    #[serde(with = "blank")]
    pub original_value: Option<f64>,
    #[serde(with = "blank")]
    pub contract_value: Option<f64>,
    pub comments: String,
    pub owner_acronym: String,
    #[serde(with = "blank")]
    pub source_year: Option<i32>,
    #[serde(with = "blank")]
    pub source_quarter: Option<u32>,
    pub source_fiscal: String,
    pub source_filename: String,
    #[serde(rename = "sourceURL")]
    pub source_url: String,
    pub amended_values: Vec<f64>,
}

impl ContractRecord {
    /// The schema defaults as a JSON object, one entry per [`SCHEMA_KEYS`] key.
    pub fn default_map() -> Map<String, Value> {
        match serde_json::to_value(Self::default()) {
            Ok(Value::Object(map)) => map,
            _ => SCHEMA_KEYS
                .iter()
                .map(|k| {
                    let v = if *k == "amendedValues" {
                        Value::Array(Vec::new())
                    } else {
                        Value::String(String::new())
                    };
                    (k.to_string(), v)
                })
                .collect(),
        }
    }
}

/// Fetch-time context persisted next to a cached contract page.
///
/// Only written when both the fiscal year and quarter of the quarter page were
/// known; a missing sidecar means "no fiscal attribution".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sidecar {
    #[serde(rename = "sourceURL")]
    pub source_url: String,
    #[serde(rename = "sourceYear")]
    pub source_year: i32,
    #[serde(rename = "sourceQuarter")]
    pub source_quarter: u32,
}

/// `Option<T>` that serializes `None` as the empty string and accepts any
/// string back as `None`.
mod blank {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<T, S>(value: &Option<T>, serializer: S) -> Result<S::Ok, S::Error>
    where
        T: Serialize,
        S: Serializer,
    {
        match value {
            Some(v) => v.serialize(serializer),
            None => serializer.serialize_str(""),
        }
    }

    pub fn deserialize<'de, T, D>(deserializer: D) -> Result<Option<T>, D::Error>
    where
        T: Deserialize<'de>,
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum OrBlank<T> {
            Value(T),
            Blank(String),
        }

        match OrBlank::<T>::deserialize(deserializer)? {
            OrBlank::Value(v) => Ok(Some(v)),
            OrBlank::Blank(_) => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_record_has_exactly_schema_keys() {
        let map = ContractRecord::default_map();
        assert_eq!(map.len(), SCHEMA_KEYS.len());
        for key in SCHEMA_KEYS {
            assert!(map.contains_key(*key), "missing {key}");
        }
    }

    #[test]
    fn defaults_are_blank_strings_and_empty_list() {
        let map = ContractRecord::default_map();
        assert_eq!(map["sourceYear"], Value::String(String::new()));
        assert_eq!(map["contractValue"], Value::String(String::new()));
        assert_eq!(map["amendedValues"], Value::Array(Vec::new()));
    }

    #[test]
    fn record_reads_back_blank_numbers() {
        let record = ContractRecord {
            uuid: "ABC-1".into(),
            reference_number: "1".into(),
            contract_value: Some(1250.5),
            source_year: None,
            ..Default::default()
        };
        let json = serde_json::to_string_pretty(&record).unwrap();
        let parsed: ContractRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, record);
    }

    #[test]
    fn sidecar_uses_schema_key_names() {
        let sidecar = Sidecar {
            source_url: "https://example.gc.ca/c/1".into(),
            source_year: 2019,
            source_quarter: 3,
        };
        let value = serde_json::to_value(&sidecar).unwrap();
        assert_eq!(value["sourceURL"], "https://example.gc.ca/c/1");
        assert_eq!(value["sourceYear"], 2019);
        assert_eq!(value["sourceQuarter"], 3);
    }
}

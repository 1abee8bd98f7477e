//! Vendor-name canonicalization.

use std::collections::HashMap;
use std::path::Path;

use crate::CoreError;

/// Corporate suffixes ignored when matching vendor names.
const SUFFIXES: &[&str] = &["INC", "LTD", "LTEE", "CORP", "CORPORATION", "LIMITED", "LLC"];

/// Maps a raw vendor string to its canonical form.
pub trait VendorLookup {
    fn canonicalize(&self, name: &str) -> String;
}

/// Leaves vendor names as extracted.
#[derive(Debug, Clone, Copy, Default)]
pub struct IdentityVendors;

impl VendorLookup for IdentityVendors {
    fn canonicalize(&self, name: &str) -> String {
        name.to_string()
    }
}

/// Dictionary of known vendor spellings.
#[derive(Debug, Clone, Default)]
pub struct VendorTable {
    /// match key → canonical name
    names: HashMap<String, String>,
}

impl VendorTable {
    /// Build from `(canonical, variants)` pairs. The canonical name always
    /// matches itself.
    pub fn new<I, V>(entries: I) -> Self
    where
        I: IntoIterator<Item = (String, V)>,
        V: IntoIterator<Item = String>,
    {
        let mut names = HashMap::new();
        for (canonical, variants) in entries {
            names.insert(match_key(&canonical), canonical.clone());
            for variant in variants {
                names.insert(match_key(&variant), canonical.clone());
            }
        }
        Self { names }
    }

    /// Parse `{ "Canonical Name": ["VARIANT ONE", "Variant Two"] }`.
    pub fn from_json(json: &str) -> Result<Self, CoreError> {
        let entries: HashMap<String, Vec<String>> = serde_json::from_str(json)?;
        Ok(Self::new(entries))
    }

    pub fn from_file(path: &Path) -> Result<Self, CoreError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

impl VendorLookup for VendorTable {
    fn canonicalize(&self, name: &str) -> String {
        match self.names.get(&match_key(name)) {
            Some(canonical) => canonical.clone(),
            None => name.trim().to_string(),
        }
    }
}

/// Uppercase, periods and apostrophes dropped, other punctuation treated as
/// whitespace, whitespace collapsed, trailing corporate suffixes removed.
fn match_key(name: &str) -> String {
    let upper: String = name
        .to_uppercase()
        .chars()
        .filter(|c| !matches!(c, '.' | '\''))
        .map(|c| if c.is_alphanumeric() { c } else { ' ' })
        .collect();
    let mut words: Vec<&str> = upper.split_whitespace().collect();
    while words.len() > 1 && words.last().is_some_and(|w| SUFFIXES.contains(w)) {
        words.pop();
    }
    words.join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    const TABLE: &str = r#"{
        "IBM Canada Ltd.": ["I.B.M. CANADA", "IBM Canada Limited"],
        "Deloitte LLP": ["DELOITTE & TOUCHE"]
    }"#;

    #[test]
    fn variants_map_to_canonical() {
        let table = VendorTable::from_json(TABLE).unwrap();
        assert_eq!(table.canonicalize("i.b.m. canada"), "IBM Canada Ltd.");
        assert_eq!(table.canonicalize("IBM CANADA LTD"), "IBM Canada Ltd.");
        assert_eq!(table.canonicalize("Deloitte & Touche"), "Deloitte LLP");
    }

    #[test]
    fn unknown_vendor_is_trimmed() {
        let table = VendorTable::from_json(TABLE).unwrap();
        assert_eq!(table.canonicalize("  Acme Widgets "), "Acme Widgets");
    }

    #[test]
    fn suffix_only_name_is_kept() {
        assert_eq!(match_key("Inc."), "INC");
        assert_eq!(match_key("Acme Corp., Inc."), "ACME");
    }

    #[test]
    fn identity_leaves_name() {
        assert_eq!(IdentityVendors.canonicalize(" x "), " x ");
    }

    #[test]
    fn malformed_table_is_an_error() {
        assert!(matches!(
            VendorTable::from_json("[1, 2]"),
            Err(CoreError::VendorTable(_))
        ));
    }
}

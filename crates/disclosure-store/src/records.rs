//! Normalized record output, one pretty-printed JSON object per contract.

use std::fs;
use std::io::ErrorKind;
use std::path::PathBuf;

use disclosure_core::ContractRecord;

use crate::paths::JSON_EXT;
use crate::{Paths, StoreError, write_atomic};

pub struct RecordStore<'a> {
    paths: &'a Paths,
    acronym: &'a str,
}

impl<'a> RecordStore<'a> {
    pub fn new(paths: &'a Paths, acronym: &'a str) -> Self {
        Self { paths, acronym }
    }

    /// Write (or replace) the record for `stem`.
    pub fn write(&self, stem: &str, record: &ContractRecord) -> Result<PathBuf, StoreError> {
        let path = self.paths.record(self.acronym, stem);
        let mut json = serde_json::to_vec_pretty(record)?;
        json.push(b'\n');
        write_atomic(&path, &json)?;
        Ok(path)
    }

    pub fn read(&self, stem: &str) -> Result<Option<ContractRecord>, StoreError> {
        let path = self.paths.record(self.acronym, stem);
        match fs::read(&path) {
            Ok(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(StoreError::io(&path, e)),
        }
    }

    /// Stems of every record written for this department, sorted.
    pub fn stems(&self) -> Result<Vec<String>, StoreError> {
        let dir = self.paths.output_dir(self.acronym);
        let entries = match fs::read_dir(&dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(StoreError::io(&dir, e)),
        };
        let mut stems = Vec::new();
        for entry in entries {
            let path = entry.map_err(|e| StoreError::io(&dir, e))?.path();
            if path.is_file()
                && path.extension().is_some_and(|ext| ext == JSON_EXT)
                && let Some(stem) = path.file_stem()
            {
                stems.push(stem.to_string_lossy().into_owned());
            }
        }
        stems.sort();
        Ok(stems)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;

    fn record() -> ContractRecord {
        ContractRecord {
            owner_acronym: "ABC".into(),
            reference_number: "C-1".into(),
            uuid: "ABC-C-1".into(),
            vendor_name: "Acme".into(),
            contract_value: Some(1500.0),
            ..ContractRecord::default()
        }
    }

    #[test]
    fn record_round_trips_with_schema_keys() {
        let tmp = tempfile::TempDir::new().unwrap();
        let paths = Paths::under(tmp.path());
        let store = RecordStore::new(&paths, "ABC");

        let path = store.write("s1", &record()).unwrap();
        let value: Value = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        let object = value.as_object().unwrap();
        for key in disclosure_core::SCHEMA_KEYS {
            assert!(object.contains_key(*key), "missing {key}");
        }
        assert_eq!(object["originalValue"], "");
        assert_eq!(store.read("s1").unwrap(), Some(record()));
    }

    #[test]
    fn stems_lists_written_records() {
        let tmp = tempfile::TempDir::new().unwrap();
        let paths = Paths::under(tmp.path());
        let store = RecordStore::new(&paths, "ABC");
        assert!(store.stems().unwrap().is_empty());

        store.write("b", &record()).unwrap();
        store.write("a", &record()).unwrap();
        assert_eq!(store.stems().unwrap(), vec!["a", "b"]);
        assert_eq!(store.read("missing").unwrap(), None);
    }
}

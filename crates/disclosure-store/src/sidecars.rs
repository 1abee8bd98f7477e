//! Per-contract metadata sidecars: the fiscal attribution known at fetch time.

use std::fs;
use std::io::ErrorKind;
use std::path::PathBuf;

use disclosure_core::Sidecar;
use tracing::warn;

use crate::{Paths, StoreError, write_atomic};

pub struct SidecarStore<'a> {
    paths: &'a Paths,
    acronym: &'a str,
}

impl<'a> SidecarStore<'a> {
    pub fn new(paths: &'a Paths, acronym: &'a str) -> Self {
        Self { paths, acronym }
    }

    pub fn write(&self, stem: &str, sidecar: &Sidecar) -> Result<PathBuf, StoreError> {
        let path = self.paths.sidecar(self.acronym, stem);
        let json = serde_json::to_vec_pretty(sidecar)?;
        write_atomic(&path, &json)?;
        Ok(path)
    }

    /// The sidecar for `stem`, if one exists. A sidecar that cannot be decoded
    /// is logged and treated as absent.
    pub fn read(&self, stem: &str) -> Result<Option<Sidecar>, StoreError> {
        let path = self.paths.sidecar(self.acronym, stem);
        let bytes = match fs::read(&path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(StoreError::io(&path, e)),
        };
        match serde_json::from_slice(&bytes) {
            Ok(sidecar) => Ok(Some(sidecar)),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "ignoring unreadable sidecar");
                Ok(None)
            }
        }
    }
}

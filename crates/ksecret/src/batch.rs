//! JSON batch format for `export` and `import`
//!
//! A batch is an array of flat objects, one per record: every field by name
//! plus the mandatory `path`.

use std::collections::BTreeMap;
use std::io;
use thiserror::Error;

use crate::flatten::EntryMap;
use crate::merge::{self, FieldSpec};
use crate::report::Report;
use crate::store::Database;

/// Key holding the record path
pub const PATH_KEY: &str = "path";

/// One record of a batch, keys sorted
pub type BatchRecord = BTreeMap<String, String>;

#[derive(Error, Debug)]
pub enum BatchError {
    #[error("missing path in entry #{0}")]
    MissingPath(usize),

    #[error("{0}")]
    Json(#[from] serde_json::Error),
}

/// Every live record of `map`, in traversal order
pub fn export(map: &EntryMap) -> Vec<BatchRecord> {
    map.iter()
        .map(|(path, entry)| {
            let mut record: BatchRecord = entry
                .values()
                .iter()
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect();
            record.insert(PATH_KEY.to_string(), path.to_string());
            record
        })
        .collect()
}

/// Pretty JSON with a trailing newline
pub fn to_json(records: &[BatchRecord]) -> Result<String, serde_json::Error> {
    let mut text = serde_json::to_string_pretty(records)?;
    text.push('\n');
    Ok(text)
}

/// Parse a batch; every record must carry a path
pub fn parse(text: &str) -> Result<Vec<BatchRecord>, BatchError> {
    let records: Vec<BatchRecord> = serde_json::from_str(text)?;

    if let Some(index) = records.iter().position(|r| !r.contains_key(PATH_KEY)) {
        return Err(BatchError::MissingPath(index));
    }

    Ok(records)
}

/// Create every record that does not exist yet; returns how many were created
pub fn import(db: &mut Database, records: &[BatchRecord], report: &mut Report) -> io::Result<usize> {
    let mut created = 0;

    for record in records {
        let Some(path) = record.get(PATH_KEY) else {
            continue;
        };

        let fields: Vec<FieldSpec> = record
            .iter()
            .filter(|(name, _)| name.as_str() != PATH_KEY)
            .map(|(name, value)| FieldSpec::new(name.as_str(), value.as_str()))
            .collect();

        if merge::apply(db, path, &fields, &[], false, report)?.is_modified() {
            created += 1;
        }
    }

    Ok(created)
}

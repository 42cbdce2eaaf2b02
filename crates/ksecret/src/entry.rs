//! Flattened view of one record: string fields and binary attachments

use std::collections::HashMap;

/// Field names with meaning across the crate
pub const TITLE: &str = "Title";
pub const USER_NAME: &str = "UserName";
pub const PASSWORD: &str = "Password";
pub const URL: &str = "URL";
pub const NOTES: &str = "Notes";

/// Named values and attachments of a record, keyed by name
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Entry {
    values: HashMap<String, String>,
    binaries: HashMap<String, Vec<u8>>,
}

impl Entry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_value(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.values.insert(name.into(), value.into());
    }

    pub fn value(&self, name: &str) -> Option<&str> {
        self.values.get(name).map(String::as_str)
    }

    /// Value of `name`, or empty when absent
    pub fn value_or_empty(&self, name: &str) -> &str {
        self.value(name).unwrap_or_default()
    }

    pub fn set_binary(&mut self, name: impl Into<String>, data: Vec<u8>) {
        self.binaries.insert(name.into(), data);
    }

    pub fn binary(&self, name: &str) -> Option<&[u8]> {
        self.binaries.get(name).map(Vec::as_slice)
    }

    /// Field names (unordered)
    pub fn names(&self) -> Vec<&str> {
        self.values.keys().map(String::as_str).collect()
    }

    /// Attachment names (unordered)
    pub fn binaries(&self) -> Vec<&str> {
        self.binaries.keys().map(String::as_str).collect()
    }

    pub fn values(&self) -> &HashMap<String, String> {
        &self.values
    }
}

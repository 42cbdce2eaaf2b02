//! Annotations embedded in a record's Notes field
//!
//! Every line of the form `secret-<key>=<value>` is one annotation, e.g.
//! `secret-postgresql-user=UserName` yields key `postgresql-user` with value
//! `UserName`. Other lines are ordinary notes and are ignored.

use std::collections::HashMap;

use crate::entry::{Entry, NOTES};

const PREFIX: &str = "secret-";

/// Annotation keys with special meaning to the manifest generator
pub const TYPE: &str = "type";
pub const TAGS: &str = "tags";
pub const NAMESPACE: &str = "namespace";

/// Ordered annotations of one entry
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Notes {
    keys: Vec<String>,
    entries: HashMap<String, String>,
}

impl Notes {
    pub fn parse(entry: &Entry) -> Self {
        entry.value(NOTES).map(Self::from_text).unwrap_or_default()
    }

    pub fn from_text(text: &str) -> Self {
        let mut notes = Self::default();

        for line in text.replace('\r', "").split('\n') {
            let Some(rest) = line.strip_prefix(PREFIX) else {
                continue;
            };

            // The key must be non-empty: `=` right after the prefix is no annotation
            match line.find('=') {
                Some(pos) if pos > PREFIX.len() => {
                    let key = &rest[..pos - PREFIX.len()];
                    let value = &line[pos + 1..];
                    notes.insert(key, value);
                }
                _ => {}
            }
        }

        notes
    }

    fn insert(&mut self, key: &str, value: &str) {
        if self
            .entries
            .insert(key.to_string(), value.to_string())
            .is_none()
        {
            self.keys.push(key.to_string());
        }
    }

    /// Value for `key`, empty when absent
    pub fn get(&self, key: &str) -> &str {
        self.entries.get(key).map(String::as_str).unwrap_or_default()
    }

    /// Keys in first-seen order, without `type` and `tags`
    pub fn keys(&self) -> Vec<&str> {
        self.keys
            .iter()
            .map(String::as_str)
            .filter(|key| *key != TYPE && *key != TAGS)
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Comma-separated annotation split into its items
    pub fn list(&self, key: &str) -> Vec<&str> {
        self.get(key).split(',').collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry_with_notes(notes: &str) -> Entry {
        let mut entry = Entry::new();
        entry.set_value(NOTES, notes);
        entry
    }

    #[test]
    fn test_parse_annotations() {
        let entry = entry_with_notes(
            "some free text\nsecret-type=opaque\nsecret-password=Password\nsecret-user=UserName",
        );
        let notes = Notes::parse(&entry);

        assert_eq!(notes.get("type"), "opaque");
        assert_eq!(notes.get("password"), "Password");
        assert_eq!(notes.keys(), vec!["password", "user"]);
    }

    #[test]
    fn test_missing_notes_field() {
        let notes = Notes::parse(&Entry::new());
        assert!(notes.is_empty());
        assert!(notes.keys().is_empty());
        assert_eq!(notes.get("type"), "");
    }

    #[test]
    fn test_carriage_returns_are_removed() {
        let notes = Notes::from_text("secret-type=tls\r\nsecret-user=UserName\r\n");
        assert_eq!(notes.get("type"), "tls");
        assert_eq!(notes.get("user"), "UserName");
    }

    #[test]
    fn test_empty_key_is_skipped() {
        let notes = Notes::from_text("secret-=value\nsecret-novalue\nsecret-ok=1");
        assert_eq!(notes.keys(), vec!["ok"]);
        assert_eq!(notes.get(""), "");
    }

    #[test]
    fn test_value_may_contain_equals() {
        let notes = Notes::from_text("secret-dsn=a=b=c");
        assert_eq!(notes.get("dsn"), "a=b=c");
    }

    #[test]
    fn test_empty_value_is_kept() {
        let notes = Notes::from_text("secret-namespace=\nsecret-tags=");
        assert_eq!(notes.get("namespace"), "");
        assert_eq!(notes.list("namespace"), vec![""]);
        assert_eq!(notes.keys(), vec!["namespace"]);
    }

    #[test]
    fn test_reserved_keys_excluded_from_listing() {
        let notes = Notes::from_text("secret-tags=a,b\nsecret-type=docker\nsecret-namespace=x");
        assert_eq!(notes.keys(), vec!["namespace"]);
        assert_eq!(notes.list("tags"), vec!["a", "b"]);
    }

    #[test]
    fn test_duplicate_key_last_value_wins_once_listed() {
        let notes = Notes::from_text("secret-a=First\nsecret-b=B\nsecret-a=Second");
        assert_eq!(notes.keys(), vec!["a", "b"]);
        assert_eq!(notes.get("a"), "Second");
    }

    #[test]
    fn test_prefix_must_start_line() {
        let notes = Notes::from_text(" secret-a=1\nmy-secret-b=2");
        assert!(notes.is_empty());
    }
}

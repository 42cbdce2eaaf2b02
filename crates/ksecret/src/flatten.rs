//! Flat, path-keyed view of the group tree
//!
//! Paths are built as `/<group>/<group>/<title>`; the root group itself
//! contributes only the leading `/`. Entries of a group come before the
//! entries of its child groups. The recycle bin is skipped entirely.

use std::collections::HashMap;
use uuid::Uuid;

use crate::entry::Entry;
use crate::store::{Binary, Database, Group, Record};

/// All live records of a store, in traversal order
#[derive(Debug, Clone, Default)]
pub struct EntryMap {
    paths: Vec<String>,
    entries: HashMap<String, Entry>,
}

impl EntryMap {
    pub fn new(db: &Database) -> Self {
        Self::from_tree(&db.root, db.recycle_bin(), &db.binaries)
    }

    pub fn from_tree(root: &Group, recycle_bin: Option<Uuid>, binaries: &[Binary]) -> Self {
        let table: HashMap<u32, &Binary> = binaries.iter().map(|b| (b.id, b)).collect();

        let mut map = Self::default();
        map.process_group(root, "/", recycle_bin, &table);
        map
    }

    fn process_group(
        &mut self,
        group: &Group,
        path: &str,
        recycle_bin: Option<Uuid>,
        binaries: &HashMap<u32, &Binary>,
    ) {
        if recycle_bin == Some(group.uuid) {
            tracing::debug!(path, "skipping recycle bin");
            return;
        }

        for record in &group.entries {
            let key = format!("{}{}", path, record.title());
            let entry = to_entry(record, binaries);

            // Two records with the same title share a path; the later one wins
            if self.entries.insert(key.clone(), entry).is_none() {
                self.paths.push(key);
            }
        }

        for child in &group.groups {
            let child_path = format!("{}{}/", path, child.name);
            self.process_group(child, &child_path, recycle_bin, binaries);
        }
    }

    /// Paths in traversal order
    pub fn paths(&self) -> &[String] {
        &self.paths
    }

    /// Entry stored at `path` (exact match, leading `/` included)
    pub fn get(&self, path: &str) -> Option<&Entry> {
        self.entries.get(path)
    }

    /// (path, entry) pairs in traversal order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Entry)> {
        self.paths
            .iter()
            .filter_map(|path| self.entries.get(path).map(|e| (path.as_str(), e)))
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }
}

fn to_entry(record: &Record, binaries: &HashMap<u32, &Binary>) -> Entry {
    let mut entry = Entry::new();

    for field in &record.fields {
        entry.set_value(field.key.as_str(), field.value.as_str());
    }

    for attachment in &record.attachments {
        match binaries.get(&attachment.id).and_then(|b| b.decode()) {
            Some(data) => entry.set_binary(attachment.name.as_str(), data),
            None => tracing::debug!(
                name = %attachment.name,
                id = attachment.id,
                "skipping unresolved attachment"
            ),
        }
    }

    entry
}

/// Add a missing leading `/`
pub fn normalize_path(path: &str) -> String {
    if path.starts_with('/') {
        path.to_string()
    } else {
        format!("/{}", path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(title: &str, fields: &[(&str, &str)]) -> Record {
        let mut record = Record::new();
        record.set("Title", title.to_string(), false);
        for (key, value) in fields {
            record.set(key, value.to_string(), false);
        }
        record
    }

    fn sample() -> Database {
        let mut db = Database::new("root");
        db.root.entries.push(record("top", &[("UserName", "u0")]));

        let prod = db.root.group_or_create("prod");
        prod.entries.push(record("db", &[("Password", "p1")]));
        prod.group_or_create("eu")
            .entries
            .push(record("cache", &[]));

        db.root
            .group_or_create("dev")
            .entries
            .push(record("db", &[("Password", "p2")]));
        db
    }

    #[test]
    fn test_traversal_order() {
        let map = EntryMap::new(&sample());
        assert_eq!(
            map.paths(),
            ["/top", "/prod/db", "/prod/eu/cache", "/dev/db"]
        );
    }

    #[test]
    fn test_entries_carry_all_fields() {
        let map = EntryMap::new(&sample());
        let entry = map.get("/prod/db").unwrap();
        assert_eq!(entry.value("Title"), Some("db"));
        assert_eq!(entry.value("Password"), Some("p1"));
        assert_eq!(map.get("/dev/db").unwrap().value("Password"), Some("p2"));
        assert!(map.get("prod/db").is_none());
    }

    #[test]
    fn test_recycle_bin_is_invisible() {
        let mut db = sample();
        let trash = db.root.group_or_create("Recycle Bin");
        trash.entries.push(record("deleted", &[]));
        trash.group_or_create("old")
            .entries
            .push(record("older", &[]));
        let trash_uuid = trash.uuid;
        db.meta.recycle_bin = Some(trash_uuid);

        let map = EntryMap::new(&db);
        assert_eq!(map.len(), 4);
        assert!(map.paths().iter().all(|p| !p.starts_with("/Recycle Bin")));
        assert!(map.get("/Recycle Bin/deleted").is_none());
        assert!(map.get("/Recycle Bin/old/older").is_none());
    }

    #[test]
    fn test_recycle_bin_as_root_hides_everything() {
        let mut db = sample();
        db.meta.recycle_bin = Some(db.root.uuid);
        assert!(EntryMap::new(&db).is_empty());
    }

    #[test]
    fn test_attachments_resolved_by_id() {
        let mut db = Database::new("root");
        db.binaries.push(Binary::encode(0, b"crt").unwrap());
        db.binaries.push(Binary {
            id: 1,
            compressed: true,
            content: "garbage".to_string(),
        });

        let mut rec = record("tls", &[]);
        for (name, id) in [("tls.crt", 0), ("broken", 1), ("missing", 9)] {
            rec.attachments.push(crate::store::AttachmentRef {
                name: name.to_string(),
                id,
            });
        }
        db.root.entries.push(rec);

        let map = EntryMap::new(&db);
        let entry = map.get("/tls").unwrap();
        assert_eq!(entry.binary("tls.crt"), Some(&b"crt"[..]));
        assert_eq!(entry.binaries(), vec!["tls.crt"]);
    }

    #[test]
    fn test_duplicate_titles_share_one_path() {
        let mut db = Database::new("root");
        db.root.entries.push(record("A", &[("Password", "first")]));
        db.root.entries.push(record("A", &[("Password", "second")]));

        let map = EntryMap::new(&db);
        assert_eq!(map.paths(), ["/A"]);
        assert_eq!(map.get("/A").unwrap().value("Password"), Some("second"));
    }

    #[test]
    fn test_normalize_path() {
        assert_eq!(normalize_path("a/b"), "/a/b");
        assert_eq!(normalize_path("/a/b"), "/a/b");
    }
}

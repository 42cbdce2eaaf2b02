//! In-memory model of a store: group tree, records and attachment table
//!
//! The tree owns its children directly, so creating or removing a group or
//! record is a plain `Vec` operation on a `&mut Group`.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use chrono::{DateTime, Utc};
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::io::{Read, Write};
use uuid::Uuid;

use crate::entry::TITLE;

/// Value written to `Meta::generator`
pub const GENERATOR: &str = "ksecret";

/// Store-wide metadata
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Meta {
    pub generator: String,
    pub name: String,
    pub created: DateTime<Utc>,
    /// Group whose subtree is the recycle bin
    #[serde(default)]
    pub recycle_bin: Option<Uuid>,
}

/// A complete decrypted store
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Database {
    pub meta: Meta,
    pub root: Group,
    /// Attachment contents, referenced from records by id
    #[serde(default)]
    pub binaries: Vec<Binary>,
}

impl Database {
    /// Empty store whose root group is called `name`
    pub fn new(name: &str) -> Self {
        Self {
            meta: Meta {
                generator: GENERATOR.to_string(),
                name: name.to_string(),
                created: Utc::now(),
                recycle_bin: None,
            },
            root: Group::new(name),
            binaries: Vec::new(),
        }
    }

    pub fn recycle_bin(&self) -> Option<Uuid> {
        self.meta.recycle_bin
    }

    /// Drop attachment contents no record refers to; returns how many went
    pub fn prune_binaries(&mut self) -> usize {
        let mut used = HashSet::new();
        self.root.attachment_ids(&mut used);

        let before = self.binaries.len();
        self.binaries.retain(|b| used.contains(&b.id));
        let removed = before - self.binaries.len();
        if removed > 0 {
            tracing::debug!(removed, "pruned unreferenced attachments");
        }
        removed
    }
}

/// A named folder of records and sub-groups
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Group {
    pub uuid: Uuid,
    pub name: String,
    #[serde(default)]
    pub groups: Vec<Group>,
    #[serde(default)]
    pub entries: Vec<Record>,
}

impl Group {
    pub fn new(name: &str) -> Self {
        Self {
            uuid: Uuid::new_v4(),
            name: name.to_string(),
            groups: Vec::new(),
            entries: Vec::new(),
        }
    }

    /// Index of the direct child group called `name`
    pub fn find_group(&self, name: &str) -> Option<usize> {
        self.groups.iter().position(|g| g.name == name)
    }

    /// Direct child group called `name`, appended when missing
    pub fn group_or_create(&mut self, name: &str) -> &mut Group {
        let index = match self.find_group(name) {
            Some(index) => index,
            None => {
                tracing::debug!(group = name, "creating group");
                self.groups.push(Group::new(name));
                self.groups.len() - 1
            }
        };
        &mut self.groups[index]
    }

    /// Attachment ids referenced anywhere in this subtree, recycle bin included
    pub fn attachment_ids(&self, ids: &mut HashSet<u32>) {
        for record in &self.entries {
            ids.extend(record.attachments.iter().map(|a| a.id));
        }
        for group in &self.groups {
            group.attachment_ids(ids);
        }
    }

    /// Index of the first record carrying `title` as any of its Title fields
    pub fn find_entry(&self, title: &str) -> Option<usize> {
        self.entries.iter().position(|r| r.has_title(title))
    }
}

/// One stored field of a record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Field {
    pub key: String,
    pub value: String,
    /// Sensitive value (passwords); hidden by UIs
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub protected: bool,
}

/// Reference from a record to an entry of the attachment table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttachmentRef {
    pub name: String,
    pub id: u32,
}

/// A leaf record: ordered fields plus attachment references
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    pub uuid: Uuid,
    #[serde(default)]
    pub fields: Vec<Field>,
    #[serde(default)]
    pub attachments: Vec<AttachmentRef>,
}

impl Default for Record {
    fn default() -> Self {
        Self::new()
    }
}

impl Record {
    pub fn new() -> Self {
        Self {
            uuid: Uuid::new_v4(),
            fields: Vec::new(),
            attachments: Vec::new(),
        }
    }

    /// First Title field, empty when there is none
    pub fn title(&self) -> &str {
        self.value(TITLE).unwrap_or_default()
    }

    fn has_title(&self, title: &str) -> bool {
        self.fields
            .iter()
            .any(|f| f.key == TITLE && f.value == title)
    }

    pub fn value(&self, key: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|f| f.key == key)
            .map(|f| f.value.as_str())
    }

    /// Set a field, replacing the value in place if the key exists
    pub fn set(&mut self, key: &str, value: String, protected: bool) {
        match self.fields.iter_mut().find(|f| f.key == key) {
            Some(field) => {
                field.value = value;
                field.protected = protected;
            }
            None => self.fields.push(Field {
                key: key.to_string(),
                value,
                protected,
            }),
        }
    }
}

/// Attachment content, base64 text, optionally gzip-compressed first
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Binary {
    pub id: u32,
    #[serde(default)]
    pub compressed: bool,
    pub content: String,
}

impl Binary {
    /// Compress and encode `data` under `id`
    pub fn encode(id: u32, data: &[u8]) -> std::io::Result<Self> {
        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(data)?;
        let compressed = encoder.finish()?;

        Ok(Self {
            id,
            compressed: true,
            content: STANDARD.encode(compressed),
        })
    }

    /// Raw bytes, or `None` when the content is malformed
    pub fn decode(&self) -> Option<Vec<u8>> {
        let raw = STANDARD.decode(self.content.trim()).ok()?;
        if !self.compressed {
            return Some(raw);
        }

        let mut data = Vec::new();
        GzDecoder::new(&raw[..]).read_to_end(&mut data).ok()?;
        Some(data)
    }
}

/// Next free id in an attachment table
pub fn next_binary_id(binaries: &[Binary]) -> u32 {
    binaries.iter().map(|b| b.id + 1).max().unwrap_or(0)
}

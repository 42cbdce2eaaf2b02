//! Create-or-update of a single record addressed by path
//!
//! Missing groups along the path are created. An existing record (matched by
//! Title) is either left alone or replaced as a whole, never merged.

use std::fmt;
use std::io;

use crate::entry::{NOTES, PASSWORD, TITLE};
use crate::pattern;
use crate::report::Report;
use crate::store::{next_binary_id, AttachmentRef, Binary, Database, Record};

/// One `name=value` assignment for a record field
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldSpec {
    pub name: String,
    pub value: String,
}

impl FieldSpec {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }

    /// Split at the first `=`; `None` when there is no `=`
    pub fn parse(spec: &str) -> Option<Self> {
        spec.split_once('=')
            .map(|(name, value)| Self::new(name, value))
    }

    /// Parse every spec, dropping those without `=`
    pub fn parse_all<S: AsRef<str>>(specs: &[S]) -> Vec<Self> {
        specs
            .iter()
            .filter_map(|s| {
                let parsed = Self::parse(s.as_ref());
                if parsed.is_none() {
                    tracing::debug!(spec = s.as_ref(), "ignoring field without '='");
                }
                parsed
            })
            .collect()
    }
}

/// A named file to attach to the new record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attachment {
    pub name: String,
    pub data: Vec<u8>,
}

/// What happened to the addressed record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Created,
    Updated,
    Unchanged,
}

impl Outcome {
    pub fn is_modified(&self) -> bool {
        !matches!(self, Self::Unchanged)
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Created => "created",
            Self::Updated => "updated",
            Self::Unchanged => "unchanged",
        };
        write!(f, "{}", s)
    }
}

/// Group names and title of a path; one leading `/` is ignored
pub fn split_path(path: &str) -> (Vec<&str>, &str) {
    let path = path.strip_prefix('/').unwrap_or(path);
    match path.rsplit_once('/') {
        Some((groups, title)) => (groups.split('/').collect(), title),
        None => (Vec::new(), path),
    }
}

/// Create the record at `path`, or replace it when `overwrite` is set.
///
/// Writes `/<path> created` or `/<path> updated` to the report transcript.
pub fn apply(
    db: &mut Database,
    path: &str,
    fields: &[FieldSpec],
    attachments: &[Attachment],
    overwrite: bool,
    report: &mut Report,
) -> io::Result<Outcome> {
    let (group_names, title) = split_path(path);

    let binaries = &mut db.binaries;
    let mut group = &mut db.root;
    for name in &group_names {
        group = group.group_or_create(name);
    }

    let existing = group.find_entry(title);
    if existing.is_some() && !overwrite {
        tracing::debug!(path, "record exists, leaving it untouched");
        return Ok(Outcome::Unchanged);
    }

    let mut record = build_record(title, fields, report);
    for attachment in attachments {
        let id = next_binary_id(binaries);
        binaries.push(Binary::encode(id, &attachment.data)?);
        record.attachments.push(AttachmentRef {
            name: attachment.name.clone(),
            id,
        });
    }

    let outcome = match existing {
        Some(index) => {
            group.entries.remove(index);
            Outcome::Updated
        }
        None => Outcome::Created,
    };
    group.entries.push(record);

    if outcome == Outcome::Updated {
        db.prune_binaries();
    }

    let display = path.strip_prefix('/').unwrap_or(path);
    report.info(format!("/{} {}", display, outcome));

    Ok(outcome)
}

fn build_record(title: &str, fields: &[FieldSpec], report: &mut Report) -> Record {
    let mut record = Record::new();
    record.set(TITLE, title.to_string(), false);

    for field in fields {
        match field.name.as_str() {
            // The path decides the title
            TITLE => {}
            PASSWORD => {
                let value = match generation_pattern(&field.value) {
                    Some(pattern) => pattern::generate(pattern, report),
                    None => field.value.clone(),
                };
                record.set(PASSWORD, value, true);
            }
            NOTES => record.set(NOTES, field.value.replace("\\n", "\n"), false),
            name => record.set(name, field.value.clone(), false),
        }
    }

    record
}

/// Interior of a `{pattern}` value
fn generation_pattern(value: &str) -> Option<&str> {
    value.strip_prefix('{')?.strip_suffix('}')
}

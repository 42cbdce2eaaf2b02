//! Command implementations shared by the binary and the integration tests
//!
//! Each command opens the store once, works on the in-memory tree and saves
//! only when something changed, the command finished without a hard error,
//! and it is not a dry run.

use anyhow::{bail, Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::batch;
use crate::flatten::{normalize_path, EntryMap};
use crate::manifest::{self, SecretOptions};
use crate::merge::{self, Attachment, FieldSpec};
use crate::report::Report;
use crate::vault::Vault;

/// Read misses for `get`
#[derive(Error, Debug)]
pub enum LookupError {
    #[error("path '{0}' does not exist")]
    PathNotFound(String),

    #[error("field '{field}' does not exist in path '{path}'")]
    FieldNotFound { path: String, field: String },

    #[error("attachment '{name}' does not exist in path '{path}'")]
    AttachmentNotFound { path: String, name: String },
}

/// What `get` should print
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GetTarget {
    Field(String),
    Attachment(String),
}

/// Store handle plus the credentials to open it
#[derive(Debug, Clone)]
pub struct Session {
    pub vault: Vault,
    pub password: String,
    /// Never write the store back
    pub dry_run: bool,
}

impl Session {
    pub fn new(database: &Path, password: &str) -> Self {
        Self {
            vault: Vault::new(database),
            password: password.to_string(),
            dry_run: false,
        }
    }

    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    fn open_map(&self) -> Result<EntryMap> {
        let db = self.vault.open(&self.password)?;
        Ok(EntryMap::new(&db))
    }
}

/// Create an empty store file
pub fn cmd_init(session: &Session, force: bool) -> Result<Report> {
    session.vault.init(&session.password, force)?;

    let mut report = Report::new();
    report.info(format!(
        "successfully created store: {}",
        session.vault.path().display()
    ));
    Ok(report)
}

/// Value of one field (or attachment) of the record at `path`
pub fn cmd_get(session: &Session, path: &str, target: &GetTarget) -> Result<Vec<u8>> {
    let map = session.open_map()?;
    Ok(lookup(&map, path, target)?)
}

/// Resolve `path` (leading `/` optional) and read `target` from it
pub fn lookup(map: &EntryMap, path: &str, target: &GetTarget) -> Result<Vec<u8>, LookupError> {
    let path = normalize_path(path);
    let entry = map
        .get(&path)
        .ok_or_else(|| LookupError::PathNotFound(path.clone()))?;

    match target {
        GetTarget::Field(field) => entry
            .value(field)
            .map(|v| v.as_bytes().to_vec())
            .ok_or_else(|| LookupError::FieldNotFound {
                path: path.clone(),
                field: field.clone(),
            }),
        GetTarget::Attachment(name) => entry
            .binary(name)
            .map(<[u8]>::to_vec)
            .ok_or_else(|| LookupError::AttachmentNotFound {
                path: path.clone(),
                name: name.clone(),
            }),
    }
}

/// Create or replace the record at `path`
pub fn cmd_set(
    session: &Session,
    path: &str,
    fields: &[String],
    attachments: &[(String, PathBuf)],
) -> Result<Report> {
    let attachments = read_attachments(attachments)?;
    let fields = FieldSpec::parse_all(fields);

    let mut db = session.vault.open(&session.password)?;
    let mut report = Report::new();
    let outcome = merge::apply(&mut db, path, &fields, &attachments, true, &mut report)?;

    if outcome.is_modified() {
        persist(session, &db)?;
    }
    Ok(report)
}

fn read_attachments(specs: &[(String, PathBuf)]) -> Result<Vec<Attachment>> {
    specs
        .iter()
        .map(|(name, file)| {
            let data = fs::read(file)
                .with_context(|| format!("cannot read attachment {}", file.display()))?;
            Ok(Attachment {
                name: name.clone(),
                data,
            })
        })
        .collect()
}

/// Create every record of the batch file that does not exist yet
pub fn cmd_import(session: &Session, input: &Path) -> Result<Report> {
    if !input.exists() {
        bail!("{} file does not exist", input.display());
    }
    let text = fs::read_to_string(input)
        .with_context(|| format!("cannot read {}", input.display()))?;
    let records = batch::parse(&text)?;

    let mut db = session.vault.open(&session.password)?;
    let mut report = Report::new();
    let created = batch::import(&mut db, &records, &mut report)?;

    tracing::debug!(created, total = records.len(), "import finished");
    if created > 0 {
        persist(session, &db)?;
    }
    Ok(report)
}

/// Write every live record to a batch file
pub fn cmd_export(session: &Session, output: &Path) -> Result<Report> {
    let map = session.open_map()?;
    let records = batch::export(&map);
    write_output(output, &batch::to_json(&records)?)?;

    let mut report = Report::new();
    report.info(format!(
        "exported {} entries to {}",
        records.len(),
        output.display()
    ));
    Ok(report)
}

/// Write the Secret manifests of all annotated records
pub fn cmd_secrets(session: &Session, output: &Path, options: &SecretOptions) -> Result<Report> {
    let map = session.open_map()?;

    let mut report = Report::new();
    let document = manifest::generate(&map, options, &mut report)?;
    write_output(output, &document.to_text())?;

    tracing::debug!(manifests = document.len(), "secrets written");
    Ok(report)
}

/// All live paths in traversal order
pub fn cmd_list(session: &Session) -> Result<Vec<String>> {
    Ok(session.open_map()?.paths().to_vec())
}

fn persist(session: &Session, db: &crate::store::Database) -> Result<()> {
    if session.dry_run {
        tracing::info!("dry run, store not written");
        return Ok(());
    }
    session.vault.save(db, &session.password)?;
    Ok(())
}

fn write_output(path: &Path, text: &str) -> Result<()> {
    fs::write(path, text).with_context(|| format!("cannot write {}", path.display()))
}

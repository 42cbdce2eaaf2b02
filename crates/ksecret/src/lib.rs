//! ksecret - path-addressed secrets store for Kubernetes deployments
//!
//! Records live in an encrypted tree of groups and are addressed by path
//! (`/prod/db/postgres`). Records whose Notes carry `secret-...` annotations
//! can be rendered as Kubernetes Secret manifests.
//!
//! Layers, bottom-up:
//! - `store` / `vault`: the tree model and its encrypted file
//! - `flatten`: the tree as path-keyed `Entry` values
//! - `notes`: annotations inside the Notes field
//! - `merge`: create-or-update of one record by path
//! - `manifest`: Secret manifests from annotated entries
//! - `batch`: JSON export/import
//! - `commands`: the CLI operations on top of all of the above

pub mod batch;
pub mod commands;
pub mod entry;
pub mod flatten;
pub mod manifest;
pub mod merge;
pub mod notes;
pub mod pattern;
pub mod report;
pub mod store;
pub mod vault;

pub use entry::Entry;
pub use flatten::EntryMap;
pub use manifest::{SecretDocument, SecretOptions, SecretType};
pub use merge::{FieldSpec, Outcome};
pub use notes::Notes;
pub use report::{Diagnostic, Report, Severity};
pub use store::Database;
pub use vault::{Vault, VaultError};

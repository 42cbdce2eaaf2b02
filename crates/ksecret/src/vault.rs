//! Vault - the encrypted store file
//!
//! The whole `Database` is serialized as JSON and encrypted with an age
//! passphrase (scrypt) recipient. The file is read once per invocation and
//! written back wholesale.

use age::secrecy::Secret;
use std::fs::{self, File, Permissions};
use std::io::{Read, Write};
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::store::Database;

/// Vault-specific errors
#[derive(Error, Debug)]
pub enum VaultError {
    #[error("{0} does not exist - run 'ksecret init' first")]
    NotInitialized(String),

    #[error("{0} already exists - use --force to overwrite")]
    AlreadyExists(String),

    #[error("Encryption error: {0}")]
    Encryption(String),

    #[error("Decryption error: {0}")]
    Decryption(String),

    #[error("Invalid store content: {0}")]
    Format(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Handle to a store file on disk
#[derive(Debug, Clone)]
pub struct Vault {
    path: PathBuf,
}

impl Vault {
    pub fn new(path: &Path) -> Self {
        Self {
            path: path.to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    /// Create an empty store named after the file stem
    pub fn init(&self, password: &str, force: bool) -> Result<Database, VaultError> {
        if self.exists() && !force {
            return Err(VaultError::AlreadyExists(self.path.display().to_string()));
        }

        let name = self
            .path
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_else(|| "root".to_string());

        let db = Database::new(&name);
        self.save(&db, password)?;
        Ok(db)
    }

    /// Decrypt and decode the store
    pub fn open(&self, password: &str) -> Result<Database, VaultError> {
        if !self.exists() {
            return Err(VaultError::NotInitialized(self.path.display().to_string()));
        }

        let encrypted = fs::read(&self.path)?;
        let plain = decrypt(&encrypted, password)?;
        let db: Database = serde_json::from_slice(&plain)?;

        tracing::info!(path = %self.path.display(), "opened store");
        Ok(db)
    }

    /// Encode, encrypt and write the store.
    ///
    /// The data goes to a sibling `.tmp` file readable only by the owner,
    /// which then replaces the store in one rename.
    pub fn save(&self, db: &Database, password: &str) -> Result<(), VaultError> {
        let plain = serde_json::to_vec(db)?;
        let encrypted = encrypt(&plain, password)?;

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let temp_path = self.temp_path();
        let mut file = File::create(&temp_path)?;
        fs::set_permissions(&temp_path, Permissions::from_mode(0o600))?;
        file.write_all(&encrypted)?;
        file.sync_all()?;
        drop(file);
        fs::rename(&temp_path, &self.path)?;

        tracing::info!(path = %self.path.display(), "saved store");
        Ok(())
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self.path.as_os_str().to_owned();
        name.push(".tmp");
        PathBuf::from(name)
    }
}

fn encrypt(plain: &[u8], password: &str) -> Result<Vec<u8>, VaultError> {
    let encryptor = age::Encryptor::with_user_passphrase(Secret::new(password.to_owned()));

    let mut encrypted = vec![];
    let mut writer = encryptor
        .wrap_output(&mut encrypted)
        .map_err(|e| VaultError::Encryption(e.to_string()))?;

    writer
        .write_all(plain)
        .map_err(|e| VaultError::Encryption(e.to_string()))?;

    writer
        .finish()
        .map_err(|e| VaultError::Encryption(e.to_string()))?;

    Ok(encrypted)
}

fn decrypt(encrypted: &[u8], password: &str) -> Result<Vec<u8>, VaultError> {
    let decryptor = match age::Decryptor::new(encrypted)
        .map_err(|e| VaultError::Decryption(e.to_string()))?
    {
        age::Decryptor::Passphrase(d) => d,
        _ => {
            return Err(VaultError::Decryption(
                "store is not passphrase encrypted".to_string(),
            ))
        }
    };

    let mut reader = decryptor
        .decrypt(&Secret::new(password.to_owned()), None)
        .map_err(|e| VaultError::Decryption(e.to_string()))?;

    let mut plain = vec![];
    reader
        .read_to_end(&mut plain)
        .map_err(|e| VaultError::Decryption(e.to_string()))?;

    Ok(plain)
}

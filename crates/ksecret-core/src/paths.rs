//! Standard paths used by ksecret

use std::path::PathBuf;

/// Application directory name under the platform data/config dirs
const APP_DIR: &str = "ksecret";

/// File name of the default store
const DEFAULT_STORE: &str = "vault.ksdb";

/// Standard ksecret paths
#[derive(Debug, Clone)]
pub struct Paths {
    /// Data directory (~/.local/share/ksecret)
    pub data: PathBuf,
    /// Config directory (~/.config/ksecret)
    pub config: PathBuf,
}

impl Default for Paths {
    fn default() -> Self {
        Self::new()
    }
}

impl Paths {
    pub fn new() -> Self {
        let data = dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("~/.local/share"))
            .join(APP_DIR);

        let config = dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("~/.config"))
            .join(APP_DIR);

        Self { data, config }
    }

    /// Store used when neither flag, environment nor config name one
    pub fn default_store(&self) -> PathBuf {
        self.data.join(DEFAULT_STORE)
    }

    /// Location of the JSON config file
    pub fn config_file(&self) -> PathBuf {
        self.config.join("config.json")
    }
}

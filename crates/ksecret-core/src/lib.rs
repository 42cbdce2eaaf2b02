//! ksecret core - shared functionality for the ksecret tools
//!
//! Standard locations and the JSON configuration file.

pub mod config;
pub mod paths;

pub use config::Config;
pub use paths::Paths;

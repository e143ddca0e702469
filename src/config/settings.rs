//! Application settings loading from config.toml
//!
//! The settings file names the single active project this deployment manages
//! and the address the HTTP API listens on. The project is looked up (or
//! created) once at startup; nothing else in the system refers to it by name.

use crate::errors::{Error, Result};
use rust_decimal::Decimal;
use serde::Deserialize;
use std::path::Path;

/// Configuration structure representing the entire config.toml file
#[derive(Debug, Deserialize, Clone)]
pub struct Settings {
    /// The single active project of this deployment
    pub proyecto: ProyectoConfig,
    /// HTTP server settings
    #[serde(default)]
    pub server: ServerConfig,
}

/// Identity of the active project, seeded on first run
#[derive(Debug, Deserialize, Clone)]
pub struct ProyectoConfig {
    /// Project name
    pub nombre: String,
    /// Total project budget, if one was defined
    pub presupuesto_total: Option<Decimal>,
}

/// HTTP server settings
#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    /// Address the API listens on
    #[serde(default = "default_bind")]
    pub bind: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
        }
    }
}

fn default_bind() -> String {
    "127.0.0.1:3000".to_string()
}

/// Loads settings from a TOML file
///
/// # Errors
/// Returns an error if:
/// - The file cannot be read
/// - The TOML syntax is invalid
/// - Required fields are missing
pub fn load_settings<P: AsRef<Path>>(path: P) -> Result<Settings> {
    let contents = std::fs::read_to_string(path.as_ref()).map_err(|e| Error::Config {
        message: format!("Failed to read config file: {e}"),
    })?;

    toml::from_str(&contents).map_err(|e| Error::Config {
        message: format!("Failed to parse config.toml: {e}"),
    })
}

/// Loads settings from the default location (./config.toml)
pub fn load_default_settings() -> Result<Settings> {
    load_settings("config.toml")
}

//! Network configuration files.
//!
//! Provides format detection (RON/JSON/TOML) and deserialization of
//! [`NetworkConfig`] so hosts can keep arena settings next to their other
//! data files.

use serde::de::DeserializeOwned;
use std::path::{Path, PathBuf};

use oxygrid_network::NetworkConfig;

// ===========================================================================
// Errors
// ===========================================================================

/// Why a [`NetworkConfig`] could not be read.
#[derive(Debug, thiserror::Error)]
pub enum ConfigLoadError {
    /// Not a `.ron`, `.toml` or `.json` path.
    #[error("no network config format for {file}")]
    UnsupportedFormat { file: PathBuf },

    /// Malformed document or a field of the wrong type.
    #[error("bad network config in {file}: {detail}")]
    Parse { file: PathBuf, detail: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

// ===========================================================================
// Format detection
// ===========================================================================

/// Serialization used by a network config document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Ron,
    Toml,
    Json,
}

impl Format {
    /// Matches file extensions case-insensitively.
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "ron" => Some(Self::Ron),
            "toml" => Some(Self::Toml),
            "json" => Some(Self::Json),
            _ => None,
        }
    }
}

/// Pick the [`Format`] for a config path.
pub fn detect_format(path: &Path) -> Result<Format, ConfigLoadError> {
    path.extension()
        .and_then(|e| e.to_str())
        .and_then(Format::from_extension)
        .ok_or_else(|| ConfigLoadError::UnsupportedFormat {
            file: path.to_path_buf(),
        })
}

// ===========================================================================
// Deserialization
// ===========================================================================

fn deserialize_str<T: DeserializeOwned>(
    content: &str,
    format: Format,
    file: &Path,
) -> Result<T, ConfigLoadError> {
    let parse_error = |detail: String| ConfigLoadError::Parse {
        file: file.to_path_buf(),
        detail,
    };
    match format {
        Format::Ron => ron::from_str(content).map_err(|e| parse_error(e.to_string())),
        Format::Json => serde_json::from_str(content).map_err(|e| parse_error(e.to_string())),
        Format::Toml => toml::from_str(content).map_err(|e| parse_error(e.to_string())),
    }
}

/// Parse a [`NetworkConfig`] from an in-memory document.
///
/// Missing fields take their defaults.
pub fn parse_network_config(content: &str, format: Format) -> Result<NetworkConfig, ConfigLoadError> {
    deserialize_str(content, format, Path::new("<inline>"))
}

/// Read a [`NetworkConfig`] from a `.ron`, `.toml` or `.json` file.
pub fn load_network_config(path: &Path) -> Result<NetworkConfig, ConfigLoadError> {
    let format = detect_format(path)?;
    let content = std::fs::read_to_string(path)?;
    deserialize_str(&content, format, path)
}

// ===========================================================================
// Tests
// ===========================================================================

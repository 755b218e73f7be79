//! Configuration discovery and loading from disk.

use std::fs;
use std::path::{Path, PathBuf};

use crate::config::schema::RotationConfig;
use crate::config::validation::{validate_config, ValidationError};

/// File name looked up in the home and working directories.
const HOME_FILE: &str = ".rotation.toml";
const LOCAL_FILE: &str = "rotation.toml";

/// Error type for configuration loading.
#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Parse(toml::de::Error),
    Validation(Vec<ValidationError>),
    NotFound(Vec<PathBuf>),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Io(e) => write!(f, "IO error: {}", e),
            ConfigError::Parse(e) => write!(f, "Parse error: {}", e),
            ConfigError::Validation(errors) => {
                write!(f, "Validation failed: ")?;
                for (i, err) in errors.iter().enumerate() {
                    if i > 0 { write!(f, ", ")?; }
                    write!(f, "{}", err)?;
                }
                Ok(())
            }
            ConfigError::NotFound(searched) => {
                write!(f, "No configuration file found (searched ")?;
                for (i, path) in searched.iter().enumerate() {
                    if i > 0 { write!(f, ", ")?; }
                    write!(f, "{}", path.display())?;
                }
                write!(f, ")")
            }
        }
    }
}

impl std::error::Error for ConfigError {}

/// Candidate configuration files, highest priority first.
pub fn search_paths() -> Vec<PathBuf> {
    let mut paths = vec![
        PathBuf::from("/etc/rotation/rotation.toml"),
        PathBuf::from("/etc/rotation.toml"),
    ];
    if let Some(home) = dirs::home_dir() {
        paths.push(home.join(HOME_FILE));
    }
    paths.push(PathBuf::from(LOCAL_FILE));
    paths
}

/// First existing file among `candidates`.
pub fn find_config(candidates: &[PathBuf]) -> Result<PathBuf, ConfigError> {
    candidates
        .iter()
        .find(|path| path.is_file())
        .cloned()
        .ok_or_else(|| ConfigError::NotFound(candidates.to_vec()))
}

/// Parse and validate configuration text.
pub fn parse_config(content: &str) -> Result<RotationConfig, ConfigError> {
    let config: RotationConfig = toml::from_str(content).map_err(ConfigError::Parse)?;

    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}

/// Load and validate configuration from a TOML file.
pub fn load_config(path: &Path) -> Result<RotationConfig, ConfigError> {
    let content = fs::read_to_string(path).map_err(ConfigError::Io)?;
    parse_config(&content)
}

/// Load from `explicit` if given, otherwise from the first file on the search path.
pub fn discover_config(explicit: Option<&Path>) -> Result<(PathBuf, RotationConfig), ConfigError> {
    let path = match explicit {
        Some(path) => path.to_path_buf(),
        None => find_config(&search_paths())?,
    };
    tracing::debug!(path = %path.display(), "Loading configuration");
    let config = load_config(&path)?;
    Ok((path, config))
}

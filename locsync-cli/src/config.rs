use std::path::{Path, PathBuf};

use serde::Deserialize;

/// Name of the config file looked up in the working directory.
pub const CONFIG_FILE_NAME: &str = "locsync.toml";

/// Settings read from `locsync.toml`. Every key is optional and can be
/// overridden on the command line.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Project name; the store keeps one directory of tables per project.
    pub project: Option<String>,
    pub dev_language: Option<String>,
    /// Root directory of the CSV translation store.
    pub store_dir: Option<PathBuf>,
    /// Comment placed before strings appended to a file.
    pub marker: Option<String>,
}

impl Config {
    pub fn from_toml(text: &str) -> Result<Config, String> {
        toml::from_str(text).map_err(|e| format!("Invalid config: {}", e))
    }

    /// Loads `path` when given (it must exist), else `locsync.toml` in the
    /// working directory when present, else the defaults.
    pub fn load(path: Option<&Path>) -> Result<Config, String> {
        let path = match path {
            Some(path) => path.to_path_buf(),
            None => {
                let default = PathBuf::from(CONFIG_FILE_NAME);
                if !default.is_file() {
                    return Ok(Config::default());
                }
                default
            }
        };
        let text = std::fs::read_to_string(&path)
            .map_err(|e| format!("Cannot read config '{}': {}", path.display(), e))?;
        Self::from_toml(&text).map_err(|e| format!("{} ({})", e, path.display()))
    }
}

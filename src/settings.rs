use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{ImportError, Result};
use crate::reader::ReaderOptions;

const SETTINGS_FILE: &str = "settings.json";
const DB_FILE: &str = "budget.db";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    pub data_dir: String,
    /// Leading lines discarded before data rows; the last one is the header.
    #[serde(default = "default_skip_lines")]
    pub skip_lines: usize,
    #[serde(default = "default_delimiter")]
    pub delimiter: char,
    #[serde(default = "default_quote")]
    pub quote: char,
}

fn default_skip_lines() -> usize {
    1
}

fn default_delimiter() -> char {
    ','
}

fn default_quote() -> char {
    '"'
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            data_dir: home().join("Documents").join("budget").to_string_lossy().to_string(),
            skip_lines: default_skip_lines(),
            delimiter: default_delimiter(),
            quote: default_quote(),
        }
    }
}

impl Settings {
    /// Read settings from `path`. A missing file yields the defaults; a file
    /// that is not valid settings JSON is an error rather than silently reset.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        serde_json::from_str(&content)
            .map_err(|e| ImportError::Settings(format!("{}: {e}", path.display())))
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(dir) = path.parent() {
            std::fs::create_dir_all(dir)?;
        }
        let json = serde_json::to_string_pretty(self).map_err(|e| ImportError::Settings(e.to_string()))?;
        std::fs::write(path, format!("{json}\n"))?;
        Ok(())
    }

    pub fn db_path(&self) -> PathBuf {
        PathBuf::from(&self.data_dir).join(DB_FILE)
    }

    /// Reader options for this installation, with per-command overrides applied.
    pub fn reader_options(&self, skip_lines: Option<usize>, delimiter: Option<char>) -> Result<ReaderOptions> {
        let delimiter = delimiter.unwrap_or(self.delimiter);
        Ok(ReaderOptions {
            skip_lines: skip_lines.unwrap_or(self.skip_lines),
            delimiter: ascii_byte("delimiter", delimiter)?,
            quote: ascii_byte("quote", self.quote)?,
        })
    }
}

fn ascii_byte(name: &str, c: char) -> Result<u8> {
    if c.is_ascii() {
        Ok(c as u8)
    } else {
        Err(ImportError::Settings(format!("{name} must be a single ASCII character, got '{c}'")))
    }
}

fn home() -> PathBuf {
    dirs::home_dir().unwrap_or_else(|| PathBuf::from("."))
}

fn settings_path() -> PathBuf {
    home().join(".config").join("budget").join(SETTINGS_FILE)
}

pub fn load_settings() -> Result<Settings> {
    Settings::load(&settings_path())
}

pub fn save_settings(settings: &Settings) -> Result<()> {
    settings.save(&settings_path())
}

/// Database file under the configured data directory.
pub fn db_path() -> Result<PathBuf> {
    Ok(load_settings()?.db_path())
}

/// Expand a leading `~` to the home directory and make relative paths
/// absolute against the working directory.
pub fn expand_data_dir(path: &str) -> Result<PathBuf> {
    let expanded = match path.strip_prefix('~') {
        Some(rest) => home().join(rest.trim_start_matches('/')),
        None => PathBuf::from(path),
    };
    if expanded.is_absolute() {
        Ok(expanded)
    } else {
        Ok(std::env::current_dir()?.join(expanded))
    }
}

//! `KEY=value` configuration file that the importer both reads and rewrites.
//!
//! Values are taken literally: no `$VAR` expansion and no trailing comments.
//! Only the quoting written by [`ConfigStore::save`] is undone on read.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::Local;
use thiserror::Error;

pub const DEFAULT_CONFIG_PATH: &str = "config.properties";

pub const CSV_FILE_PATH: &str = "CSV_FILE_PATH";
pub const JDBC_URL: &str = "JDBC_URL";
pub const JDBC_USERNAME: &str = "JDBC_USERNAME";
pub const JDBC_PASSWORD: &str = "JDBC_PASSWORD";

const HEADER_COMMENT: &str = "Updated Encrypted password";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("{} line {line}: expected KEY=value", path.display())]
    Parse { path: PathBuf, line: usize },
    #[error("failed to write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("missing required key {0}")]
    MissingKey(&'static str),
}

#[derive(Debug, Clone)]
pub struct ConfigStore {
    path: PathBuf,
    entries: Vec<(String, String)>,
}

impl ConfigStore {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref().to_path_buf();
        let contents = fs::read_to_string(&path).map_err(|source| ConfigError::Read {
            path: path.clone(),
            source,
        })?;

        let mut entries: Vec<(String, String)> = Vec::new();
        for (idx, line) in contents.lines().enumerate() {
            let line = line.trim_start();
            if line.is_empty() || line.starts_with('#') || line.starts_with('!') {
                continue;
            }
            let (key, value) = parse_entry(line).ok_or_else(|| ConfigError::Parse {
                path: path.clone(),
                line: idx + 1,
            })?;
            match entries.iter_mut().find(|(existing, _)| *existing == key) {
                Some(entry) => entry.1 = value,
                None => entries.push((key.to_string(), value)),
            }
        }

        Ok(Self { path, entries })
    }

    pub fn empty(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            entries: Vec::new(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn require(&self, key: &'static str) -> Result<&str, ConfigError> {
        self.get(key).ok_or(ConfigError::MissingKey(key))
    }

    pub fn set(&mut self, key: &str, value: impl Into<String>) {
        let value = value.into();
        match self.entries.iter_mut().find(|(k, _)| k == key) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((key.to_string(), value)),
        }
    }

    /// Rewrites the file in place. Entries keep their original order;
    /// comments from the previous file are replaced by the header.
    pub fn save(&self) -> Result<(), ConfigError> {
        let write_err = |source| ConfigError::Write {
            path: self.path.clone(),
            source,
        };

        let mut contents = format!(
            "# {HEADER_COMMENT}\n# {}\n",
            Local::now().to_rfc2822()
        );
        for (key, value) in &self.entries {
            contents.push_str(key);
            contents.push('=');
            contents.push_str(&quote_value(value));
            contents.push('\n');
        }

        let tmp_path = self.path.with_extension("tmp");
        let mut file = fs::File::create(&tmp_path).map_err(write_err)?;
        file.write_all(contents.as_bytes()).map_err(write_err)?;
        file.sync_all().map_err(write_err)?;
        drop(file);
        fs::rename(&tmp_path, &self.path).map_err(write_err)
    }
}

/// Splits at the first `=`. Unquoted values are kept verbatim, including
/// `$`, `#` and trailing whitespace.
fn parse_entry(line: &str) -> Option<(&str, String)> {
    let (key, value) = line.split_once('=')?;
    let key = key.trim();
    if key.is_empty() {
        return None;
    }
    Some((key, unquote_value(value.trim_start())))
}

fn unquote_value(raw: &str) -> String {
    if raw.len() >= 2 && raw.starts_with('\'') && raw.ends_with('\'') {
        return raw[1..raw.len() - 1].to_string();
    }
    if raw.len() >= 2 && raw.starts_with('"') && raw.ends_with('"') {
        let inner = &raw[1..raw.len() - 1];
        let mut value = String::with_capacity(inner.len());
        let mut chars = inner.chars();
        while let Some(c) = chars.next() {
            if c != '\\' {
                value.push(c);
                continue;
            }
            match chars.next() {
                Some('n') => value.push('\n'),
                Some(escaped) => value.push(escaped),
                None => value.push('\\'),
            }
        }
        return value;
    }
    raw.to_string()
}

fn is_plain(value: &str) -> bool {
    !value.is_empty()
        && value
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.' | '/' | ':'))
}

fn quote_value(value: &str) -> String {
    if is_plain(value) {
        return value.to_string();
    }
    if !value.contains('\'') && !value.contains('\n') {
        return format!("'{value}'");
    }

    let mut quoted = String::with_capacity(value.len() + 2);
    quoted.push('"');
    for c in value.chars() {
        match c {
            '\\' | '"' | '\'' | '$' => {
                quoted.push('\\');
                quoted.push(c);
            }
            '\n' => quoted.push_str("\\n"),
            _ => quoted.push(c),
        }
    }
    quoted.push('"');
    quoted
}

/// Connection target read from the configuration.
#[derive(Clone)]
pub struct DatabaseSettings {
    pub url: String,
    pub username: String,
    /// `JDBC_PASSWORD` exactly as configured: plaintext on first run, an
    /// `ENC(...)` value afterwards.
    pub stored_password: String,
}

impl std::fmt::Debug for DatabaseSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DatabaseSettings")
            .field("url", &self.url)
            .field("username", &self.username)
            .field("stored_password", &"<redacted>")
            .finish()
    }
}

#[derive(Debug, Clone)]
pub struct ImportSettings {
    pub source_dir: PathBuf,
    pub database: DatabaseSettings,
}

impl ImportSettings {
    pub fn from_store(store: &ConfigStore) -> Result<Self, ConfigError> {
        Ok(Self {
            source_dir: PathBuf::from(store.require(CSV_FILE_PATH)?),
            database: DatabaseSettings {
                url: store.require(JDBC_URL)?.to_string(),
                username: store.require(JDBC_USERNAME)?.to_string(),
                stored_password: store.require(JDBC_PASSWORD)?.to_string(),
            },
        })
    }
}

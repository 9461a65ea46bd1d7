//! Store configuration
//!
//! A [`Config`] is fixed once the store behind a context has flushed;
//! [`ConfigUpdate`] carries the partial changes accepted before that.

use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// On-disk format of a backing file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum FileFormat {
    /// Compact binary encoding; accepts any value
    #[default]
    Pickle,
    /// JSON object; no non-finite floats
    Json,
    /// Two-column `name,value` table; scalars only
    Csv,
}

impl FileFormat {
    pub const ALL: [FileFormat; 3] = [FileFormat::Pickle, FileFormat::Json, FileFormat::Csv];

    pub fn as_str(&self) -> &'static str {
        match self {
            FileFormat::Pickle => "pickle",
            FileFormat::Json => "json",
            FileFormat::Csv => "csv",
        }
    }
}

impl std::fmt::Display for FileFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FileFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pickle" | "binary" | "bin" => Ok(FileFormat::Pickle),
            "json" => Ok(FileFormat::Json),
            "csv" => Ok(FileFormat::Csv),
            other => Err(format!("unknown file format '{}'", other)),
        }
    }
}

/// Format-specific options forwarded to the codec
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CodecOptions {
    /// Indent JSON output
    pub pretty: bool,
    /// CSV field separator
    pub delimiter: u8,
}

impl Default for CodecOptions {
    fn default() -> Self {
        Self {
            pretty: false,
            delimiter: b',',
        }
    }
}

/// Full configuration of one store
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Flush on process exit and on interrupt
    pub auto_save: bool,
    pub file_format: FileFormat,
    pub options: CodecOptions,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            auto_save: true,
            file_format: FileFormat::Pickle,
            options: CodecOptions::default(),
        }
    }
}

impl Config {
    pub fn with_auto_save(mut self, auto_save: bool) -> Self {
        self.auto_save = auto_save;
        self
    }

    pub fn with_format(mut self, file_format: FileFormat) -> Self {
        self.file_format = file_format;
        self
    }

    pub fn with_options(mut self, options: CodecOptions) -> Self {
        self.options = options;
        self
    }

    /// Apply the fields set in `update`
    pub fn merge(&mut self, update: &ConfigUpdate) {
        if let Some(auto_save) = update.auto_save {
            self.auto_save = auto_save;
        }
        if let Some(file_format) = update.file_format {
            self.file_format = file_format;
        }
        if let Some(options) = update.options {
            self.options = options;
        }
    }
}

/// Partial configuration change; `None` leaves a setting as it is
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ConfigUpdate {
    pub auto_save: Option<bool>,
    pub file_format: Option<FileFormat>,
    pub options: Option<CodecOptions>,
}

impl From<Config> for ConfigUpdate {
    fn from(config: Config) -> Self {
        Self {
            auto_save: Some(config.auto_save),
            file_format: Some(config.file_format),
            options: Some(config.options),
        }
    }
}

//! Output formatting

use serde::Serialize;
use std::path::PathBuf;

use crate::config::FileFormat;
use crate::output::human::format_human;
use crate::output::json::format_json;
use crate::value::{Mapping, Value};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Human,
    Json,
}

/// Summary of a backing file
#[derive(Debug, Clone, Serialize)]
pub struct StoreInfo {
    pub path: PathBuf,
    pub exists: bool,
    /// Format the file was decoded with
    pub format: Option<FileFormat>,
    pub entries: usize,
    pub size: u64,
}

/// Something the CLI prints
#[derive(Debug, Clone)]
pub enum Report {
    Entries(Mapping),
    Entry { name: String, value: Value },
    Info(StoreInfo),
    Message(String),
}

pub fn format_output(report: &Report, format: &OutputFormat) -> String {
    match format {
        OutputFormat::Human => format_human(report),
        OutputFormat::Json => format_json(report),
    }
}

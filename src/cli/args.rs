//! CLI argument parsing

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::config::FileFormat;

#[derive(Parser)]
#[command(name = "pvars")]
#[command(author, version, about = "Inspect and edit persistent variable stores", long_about = None)]
pub struct Args {
    #[command(subcommand)]
    pub command: SubCommand,

    /// Format to write in (default: the format the file is already in)
    #[arg(long, global = true, env = "PVARS_FORMAT")]
    pub format: Option<FileFormat>,

    /// Indent JSON files when writing
    #[arg(long, global = true)]
    pub pretty: bool,

    /// Output format as JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum SubCommand {
    /// Print every entry in a store
    Show {
        /// Backing file
        file: PathBuf,
    },

    /// Print one entry
    Get {
        file: PathBuf,
        name: String,
    },

    /// Set an entry from a JSON literal
    Set {
        file: PathBuf,
        name: String,
        /// Value as JSON, e.g. 5, "text", [1, 2] or {"k": true}
        value: String,
    },

    /// Delete an entry
    Remove {
        file: PathBuf,
        name: String,
    },

    /// Delete every entry
    Clear {
        file: PathBuf,
    },

    /// Show format, entry count and size of a store
    Info {
        file: PathBuf,
    },
}

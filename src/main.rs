//! pvars CLI - inspect and edit persistent variable stores

use std::path::Path;

use anyhow::{anyhow, Context as _};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use pvars::cli::{Args, SubCommand};
use pvars::output::{format_output, OutputFormat, Report, StoreInfo};
use pvars::{Config, ConfigUpdate, Context, Value};

fn main() {
    let args = Args::parse();
    init_logging(args.verbose);

    if let Err(e) = run(args) {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

fn init_logging(verbose: bool) {
    let fallback = if verbose { "pvars=debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_env("PVARS_LOG").unwrap_or_else(|_| EnvFilter::new(fallback));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Open a store for editing. Nothing is written unless a command saves.
fn open(file: &Path, args: &Args) -> anyhow::Result<Context> {
    let ctx = Context::open(file, Config::default().with_auto_save(false))
        .with_context(|| format!("opening {}", file.display()))?;

    // Keep the file in the format it already has unless told otherwise
    let format = args.format.or(ctx.loaded_format()).unwrap_or_default();
    let mut options = ctx.config().options;
    options.pretty = args.pretty;
    ctx.configure(ConfigUpdate {
        file_format: Some(format),
        options: Some(options),
        ..Default::default()
    })?;
    Ok(ctx)
}

fn run(args: Args) -> anyhow::Result<()> {
    let output_format = if args.json { OutputFormat::Json } else { OutputFormat::Human };

    let report = match &args.command {
        SubCommand::Show { file } => Report::Entries(open(file, &args)?.all().snapshot()),

        SubCommand::Get { file, name } => {
            let ctx = open(file, &args)?;
            let value = ctx
                .all()
                .get(name)
                .ok_or_else(|| anyhow!("no entry named '{}'", name))?;
            Report::Entry {
                name: name.clone(),
                value,
            }
        }

        SubCommand::Set { file, name, value } => {
            let json: serde_json::Value = serde_json::from_str(value)
                .with_context(|| format!("'{}' is not a JSON value", value))?;
            let value = Value::from(json);
            let ctx = open(file, &args)?;
            ctx.all().insert(name, value.clone());
            ctx.save()?;
            Report::Entry {
                name: name.clone(),
                value,
            }
        }

        SubCommand::Remove { file, name } => {
            let ctx = open(file, &args)?;
            ctx.all()
                .remove(name)
                .ok_or_else(|| anyhow!("no entry named '{}'", name))?;
            ctx.save()?;
            Report::Message(format!("Removed '{}'", name))
        }

        SubCommand::Clear { file } => {
            let ctx = open(file, &args)?;
            let all = ctx.all();
            let count = all.len();
            all.clear();
            ctx.save()?;
            Report::Message(format!("Cleared {} entries", count))
        }

        SubCommand::Info { file } => {
            let ctx = open(file, &args)?;
            let metadata = std::fs::metadata(ctx.path()).ok();
            Report::Info(StoreInfo {
                path: ctx.path().to_path_buf(),
                exists: metadata.is_some(),
                format: ctx.loaded_format(),
                entries: ctx.all().len(),
                size: metadata.map(|m| m.len()).unwrap_or(0),
            })
        }
    };

    println!("{}", format_output(&report, &output_format));
    Ok(())
}

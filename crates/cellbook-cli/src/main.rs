//! Cellbook CLI - read and edit workbook ranges from the command line

use anyhow::{Context, Result};
use cellbook::prelude::*;
use cellbook::host;
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "cellbook")]
#[command(author, version, about = "Read and edit spreadsheet ranges")]
struct Cli {
    /// Log debug output (overridden by RUST_LOG)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show information about a workbook
    Info {
        /// Input XLSX file
        input: PathBuf,
    },

    /// Print the values of a cell, range or named range
    Read {
        /// Input XLSX file
        input: PathBuf,

        /// Reference such as B2, Sheet1!A1:C3 or a defined name
        reference: String,

        /// Print JSON instead of tab-separated text
        #[arg(long)]
        json: bool,
    },

    /// Write values into a range
    Fill {
        /// Input XLSX file
        input: PathBuf,

        /// Target range, e.g. A1:B2
        range: String,

        /// Values as JSON: rows of values, or a flat list for a single row or column
        values: String,

        /// Output file (default: overwrite the input)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Merge a change set (style, disabled, value) into every cell of some ranges
    Update {
        /// Input XLSX file
        input: PathBuf,

        /// Target ranges
        #[arg(required = true)]
        ranges: Vec<String>,

        /// Changes as a JSON object, e.g. '{"disabled": true}'
        #[arg(short, long)]
        changes: String,

        /// Output file (default: overwrite the input)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Extract a range into a new one-sheet workbook
    Slice {
        /// Input XLSX file
        input: PathBuf,

        /// Range to keep
        range: String,

        /// Output file
        #[arg(short, long)]
        output: PathBuf,
    },

    /// Print a workbook as JSON (sheets, cells, merges, named ranges)
    Export {
        /// Input XLSX file
        input: PathBuf,
    },

    /// Build a workbook from the JSON printed by `export`
    Import {
        /// JSON file
        input: PathBuf,

        /// Output file
        #[arg(short, long)]
        output: PathBuf,
    },

    /// Create a workbook from JSON rows
    New {
        /// Rows as JSON, e.g. '[["Item", "Qty"], ["Apples", 3]]'
        rows: String,

        /// Output file
        #[arg(short, long)]
        output: PathBuf,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Info { input } => show_info(&input),
        Commands::Read {
            input,
            reference,
            json,
        } => read_ref(&input, &reference, json),
        Commands::Fill {
            input,
            range,
            values,
            output,
        } => fill(&input, &range, &values, output.as_deref()),
        Commands::Update {
            input,
            ranges,
            changes,
            output,
        } => update(&input, &ranges, &changes, output.as_deref()),
        Commands::Slice {
            input,
            range,
            output,
        } => slice(&input, &range, &output),
        Commands::Export { input } => export(&input),
        Commands::Import { input, output } => import(&input, &output),
        Commands::New { rows, output } => new_workbook(&rows, &output),
    }
}

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    // A second init (e.g. under a test harness) is harmless
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

fn open(input: &Path) -> Result<Workbook> {
    debug!(path = %input.display(), "opening workbook");
    Workbook::open(input).with_context(|| format!("Failed to open '{}'", input.display()))
}

fn save(workbook: &Workbook, path: &Path) -> Result<()> {
    workbook
        .save(path)
        .with_context(|| format!("Failed to write '{}'", path.display()))?;
    info!(path = %path.display(), "saved workbook");
    eprintln!("Wrote '{}'", path.display());
    Ok(())
}

fn parse_json(text: &str, what: &str) -> Result<serde_json::Value> {
    serde_json::from_str(text).with_context(|| format!("Invalid JSON for {}", what))
}

fn show_info(input: &Path) -> Result<()> {
    let workbook = open(input)?;

    println!("File: {}", input.display());
    println!("Sheets: {}", workbook.sheet_count());
    for (name, sheet) in workbook.worksheets() {
        let used = sheet
            .used_range()
            .map(|r| r.to_string())
            .unwrap_or_else(|| "(empty)".to_string());
        println!("  {} - {} cells, used range {}", name, sheet.cell_count(), used);
        for region in sheet.merged_regions() {
            println!("    merged {}", region);
        }
    }

    let names = workbook.named_ranges();
    if !names.is_empty() {
        println!("Names: {}", names.len());
        for nr in names.iter() {
            println!("  {} = {}", nr.name, nr.target);
        }
    }

    Ok(())
}

fn read_ref(input: &Path, reference: &str, json: bool) -> Result<()> {
    let workbook = open(input)?;

    if json {
        let value = host::listval(&workbook, reference)
            .with_context(|| format!("Failed to read '{}'", reference))?;
        println!("{}", value);
        return Ok(());
    }

    match workbook
        .resolve_ref(reference)
        .with_context(|| format!("Failed to read '{}'", reference))?
    {
        CellOrRange::Single(text) => println!("{}", text),
        CellOrRange::Grid(rows) => {
            for row in rows {
                println!("{}", row.join("\t"));
            }
        }
    }
    Ok(())
}

fn fill(input: &Path, range: &str, values: &str, output: Option<&Path>) -> Result<()> {
    let workbook = open(input)?;
    let values = parse_json(values, "values")?;
    let filled = host::fill_range(&workbook, range, &values)
        .with_context(|| format!("Failed to fill '{}'", range))?;
    save(&filled, output.unwrap_or(input))
}

fn update(input: &Path, ranges: &[String], changes: &str, output: Option<&Path>) -> Result<()> {
    let workbook = open(input)?;
    let changes = parse_json(changes, "changes")?;
    let updated = host::update_ranges(&workbook, ranges, &changes)
        .with_context(|| format!("Failed to update {}", ranges.join(", ")))?;
    save(&updated, output.unwrap_or(input))
}

fn slice(input: &Path, range: &str, output: &Path) -> Result<()> {
    let workbook = open(input)?;
    let sliced = workbook
        .slice(range)
        .with_context(|| format!("Failed to slice '{}'", range))?;
    save(&sliced, output)
}

fn new_workbook(rows: &str, output: &Path) -> Result<()> {
    let rows = parse_json(rows, "rows")?;
    let workbook = host::spreadsheet(&rows).context("Failed to build workbook")?;
    save(&workbook, output)
}

fn export(input: &Path) -> Result<()> {
    let workbook = open(input)?;
    let value = host::workbook_to_json(&workbook).context("Failed to convert workbook")?;
    println!("{}", serde_json::to_string_pretty(&value)?);
    Ok(())
}

fn import(input: &Path, output: &Path) -> Result<()> {
    let text = std::fs::read_to_string(input)
        .with_context(|| format!("Failed to read '{}'", input.display()))?;
    let value = parse_json(&text, "workbook")?;
    let workbook = host::spreadsheet_from_workbook(&value).context("Failed to build workbook")?;
    save(&workbook, output)
}

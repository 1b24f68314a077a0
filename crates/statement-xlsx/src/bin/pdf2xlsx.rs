use std::path::PathBuf;
use std::process::ExitCode;
use std::str::FromStr;

use anyhow::{Context, Result, anyhow};
use chrono::Local;
use clap::{Args, Parser, Subcommand};
use statement_xlsx::{
    BatchReport, DEFAULT_OUTPUT_PREFIX, ExportFormat, FileOutcome, UploadedFile, convert_batch,
    export_table, output_file_name, write_xlsx,
};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(
    name = "pdf2xlsx",
    version,
    about = "Combine the tables of PDF statements into one spreadsheet"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Convert statements and write the combined spreadsheet.
    Convert(ConvertArgs),
}

#[derive(Debug, Args)]
struct ConvertArgs {
    /// Input PDF path. Repeatable; files are combined in the given order.
    #[arg(short, long = "input", required = true)]
    inputs: Vec<PathBuf>,

    /// Directory the combined spreadsheet is written to.
    #[arg(short, long, default_value = ".")]
    output_dir: PathBuf,

    /// Output format: xlsx or csv.
    #[arg(long, default_value = "xlsx")]
    format: String,

    /// File name prefix; a generation timestamp is appended.
    #[arg(long, default_value = DEFAULT_OUTPUT_PREFIX)]
    prefix: String,

    /// Log per-file details and extraction warnings.
    #[arg(short, long)]
    verbose: bool,
}

struct LoadedFile {
    name: String,
    bytes: Vec<u8>,
}

fn load_inputs(args: &ConvertArgs) -> Result<Vec<LoadedFile>> {
    args.inputs
        .iter()
        .map(|path| {
            let bytes = std::fs::read(path)
                .with_context(|| format!("failed to read '{}'", path.display()))?;
            let name = path.file_name().map_or_else(
                || path.display().to_string(),
                |name| name.to_string_lossy().into_owned(),
            );
            Ok(LoadedFile { name, bytes })
        })
        .collect()
}

fn log_report(report: &BatchReport, verbose: bool) {
    for outcome in &report.outcomes {
        match outcome {
            FileOutcome::Converted {
                file_name,
                table,
                warnings,
            } => {
                eprintln!("converted {file_name}: {} row(s)", table.row_count());
                if verbose {
                    for warning in warnings {
                        eprintln!("  - {warning}");
                    }
                }
            }
            FileOutcome::Skipped { file_name, error } => {
                eprintln!("skipped {file_name}: {error}");
            }
        }
    }
}

fn run_convert(args: &ConvertArgs) -> Result<Option<PathBuf>> {
    let format = ExportFormat::from_str(&args.format)
        .map_err(|error| anyhow!(error))
        .context("failed to parse --format")?;
    if args.prefix.trim().is_empty() {
        anyhow::bail!("--prefix must not be empty");
    }

    let files = load_inputs(args)?;
    let report = convert_batch(files.iter().map(|file| UploadedFile {
        file_name: &file.name,
        bytes: &file.bytes,
    }));
    log_report(&report, args.verbose);

    let Some(combined) = report.combined() else {
        return Ok(None);
    };

    std::fs::create_dir_all(&args.output_dir).with_context(|| {
        format!("failed to create output directory '{}'", args.output_dir.display())
    })?;
    let output = args
        .output_dir
        .join(output_file_name(&args.prefix, &Local::now(), format));
    let written = match format {
        ExportFormat::Xlsx => write_xlsx(&output, &combined),
        ExportFormat::Csv => export_table(&combined, format)
            .and_then(|bytes| std::fs::write(&output, bytes).map_err(Into::into)),
    };
    written.with_context(|| format!("failed to write '{}'", output.display()))?;

    Ok(Some(output))
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    let Commands::Convert(args) = cli.command;

    let default_filter = if args.verbose {
        "statement_xlsx=info"
    } else {
        "statement_xlsx=warn"
    };
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .without_time()
        .init();

    match run_convert(&args) {
        Ok(Some(output)) => {
            println!("{}", output.display());
            ExitCode::SUCCESS
        }
        Ok(None) => {
            eprintln!("error: no statement could be converted; no output written");
            ExitCode::from(2)
        }
        Err(error) => {
            eprintln!("error: {error:#}");
            ExitCode::from(1)
        }
    }
}

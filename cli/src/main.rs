//! skatesheet CLI - figure skating protocol extraction tool

use std::fs::File;
use std::io::{self, BufWriter};
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};

use skatesheet::parser::{classify, Classification};
use skatesheet::render::{write_json, JsonFormat};
use skatesheet::{
    parse_outcome, DocumentOutcome, Page, PageSelection, ParseContext, ParseOptions,
    PdfDocument, Source,
};

#[derive(Parser)]
#[command(name = "skatesheet")]
#[command(version)]
#[command(about = "Extract figure skating judging protocols to JSON", long_about = None)]
struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse protocols into performance records
    Parse {
        /// Input PDF files
        #[arg(value_name = "FILES", required = true)]
        inputs: Vec<PathBuf>,

        /// Competition context (JSON)
        #[arg(short, long, value_name = "FILE", env = "SKATESHEET_CONTEXT")]
        context: Option<PathBuf>,

        /// Output file (stdout if not specified)
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,

        /// Output compact JSON
        #[arg(long)]
        compact: bool,

        /// Parse pages one at a time
        #[arg(long)]
        sequential: bool,

        /// Fail a document on its first broken table
        #[arg(long)]
        strict: bool,

        /// Page range (e.g., "1-10", "1,3,5")
        #[arg(long)]
        pages: Option<String>,
    },

    /// Show how each page of a protocol is classified
    Inspect {
        /// Input PDF file
        #[arg(value_name = "FILE")]
        input: PathBuf,

        /// Page range (e.g., "1-10", "1,3,5")
        #[arg(long)]
        pages: Option<String>,
    },

    /// Show version information
    Version,
}

fn main() {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(filter)).init();

    let result = match cli.command {
        Commands::Parse {
            inputs,
            context,
            output,
            compact,
            sequential,
            strict,
            pages,
        } => {
            let mut options = ParseOptions::new().with_parallel(!sequential);
            if strict {
                options = options.strict();
            }
            page_selection(pages.as_deref()).and_then(|selection| {
                cmd_parse(
                    &inputs,
                    context.as_deref(),
                    output.as_deref(),
                    compact,
                    options.with_pages(selection),
                )
            })
        }
        Commands::Inspect { input, pages } => {
            page_selection(pages.as_deref()).and_then(|selection| cmd_inspect(&input, selection))
        }
        Commands::Version => {
            cmd_version();
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!("{}: {}", "Error".red().bold(), e);
        std::process::exit(1);
    }
}

fn page_selection(pages: Option<&str>) -> Result<PageSelection, Box<dyn std::error::Error>> {
    match pages {
        Some(p) => Ok(PageSelection::parse(p).map_err(|e| format!("Invalid page range: {}", e))?),
        None => Ok(PageSelection::All),
    }
}

fn cmd_parse(
    inputs: &[PathBuf],
    context: Option<&Path>,
    output: Option<&Path>,
    compact: bool,
    options: ParseOptions,
) -> Result<(), Box<dyn std::error::Error>> {
    let context = context.map(ParseContext::load).transpose()?;

    let pb = ProgressBar::new(inputs.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}")?
            .progress_chars("#>-"),
    );

    let mut outcomes = Vec::with_capacity(inputs.len());
    for input in inputs {
        pb.set_message(input.display().to_string());
        log::debug!("Parsing {}", input.display());
        outcomes.push(parse_outcome(input, context.as_ref(), &options));
        pb.inc(1);
    }
    pb.finish_and_clear();

    let format = if compact {
        JsonFormat::Compact
    } else {
        JsonFormat::Pretty
    };
    match output {
        Some(path) => {
            write_json(&outcomes, format, BufWriter::new(File::create(path)?))?;
            eprintln!("{} {}", "Saved to".green(), path.display());
        }
        None => write_json(&outcomes, format, io::stdout().lock())?,
    }

    print_summary(&outcomes);
    Ok(())
}

fn print_summary(outcomes: &[DocumentOutcome]) {
    eprintln!();
    eprintln!("{}", "Summary".cyan().bold());
    eprintln!("{}", "─".repeat(40).dimmed());

    for outcome in outcomes {
        match outcome {
            DocumentOutcome::Parsed(report) => {
                let status = if report.is_complete() {
                    "ok".green()
                } else {
                    "partial".yellow()
                };
                eprintln!(
                    "{} {}: {} records ({} placed), {} failures, {} skipped pages",
                    status,
                    report.document.bold(),
                    report.records.len(),
                    report.placed_count(),
                    report.failures.len(),
                    report.skipped.len()
                );
                for failure in &report.failures {
                    eprintln!(
                        "  {} page {}: {}",
                        "└─".dimmed(),
                        failure.page,
                        failure.message
                    );
                }
            }
            DocumentOutcome::Failed { document, reason } => {
                eprintln!("{} {}: {}", "failed".red(), document.bold(), reason);
            }
        }
    }
}

fn cmd_inspect(input: &Path, pages: PageSelection) -> Result<(), Box<dyn std::error::Error>> {
    let document = PdfDocument::open(input)?;
    let options = ParseOptions::new();

    println!("{}", "Document Information".cyan().bold());
    println!("{}", "─".repeat(40).dimmed());
    println!("{}: {}", "File".bold(), input.display());
    println!("{}: PDF {}", "Format".bold(), document.version());
    println!("{}: {}", "Pages".bold(), document.page_count());
    println!();

    for number in pages.resolve(document.page_count()) {
        let page = document.page(number)?;
        match classify(page.as_ref(), &options.marker) {
            Classification::ScoreSheet(_) => {
                let tables = page.find_tables()?;
                println!(
                    "{} {:>4}: {} ({} tables)",
                    "Page".bold(),
                    number,
                    "score sheet".green(),
                    tables.len()
                );
            }
            Classification::NotScoreSheet => {
                println!("{} {:>4}: {}", "Page".bold(), number, "no score sheet".dimmed());
            }
            Classification::Unreadable(reason) => {
                println!(
                    "{} {:>4}: {} ({})",
                    "Page".bold(),
                    number,
                    "unreadable".red(),
                    reason
                );
            }
        }
    }

    Ok(())
}

fn cmd_version() {
    println!("{} {}", "skatesheet".cyan().bold(), env!("CARGO_PKG_VERSION"));
    println!("Figure skating judging protocol extraction tool");
    println!();
    println!("License: MIT");
}

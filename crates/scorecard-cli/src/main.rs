//! Scorecard CLI - questionnaire compiler

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use scorecard::prelude::*;
use scorecard::{normalize_to_yaml, validate, write_atomic, RawDocument, DEFAULT_RESPONSE_ROWS};
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "scorecard")]
#[command(
    author,
    version,
    about = "Compile a questionnaire into a scoring workbook or form script"
)]
struct Cli {
    /// Log debug output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate a workbook or form script from a questionnaire
    Generate {
        /// Questionnaire YAML file
        input: PathBuf,

        /// Artifact to generate
        #[arg(short, long, value_enum, default_value_t = Format::Excel)]
        format: Format,

        /// Output file (default: data_product_complexity_tool.xlsx or .gs)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Response rows scored by the form script
        #[arg(long, default_value_t = DEFAULT_RESPONSE_ROWS)]
        response_rows: u32,

        /// Check the questionnaire without writing anything
        #[arg(long)]
        validate_only: bool,
    },

    /// Check a questionnaire and print every problem found
    Validate {
        /// Questionnaire YAML file
        input: PathBuf,
    },

    /// Give every option an explicit score and every question a weight
    Normalize {
        /// Questionnaire YAML file
        input: PathBuf,

        /// Output YAML file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// List the sheets and formula counts of a workbook
    Inspect {
        /// Workbook file (xlsx)
        input: PathBuf,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum Format {
    Excel,
    GoogleForm,
}

impl From<Format> for OutputFormat {
    fn from(format: Format) -> Self {
        match format {
            Format::Excel => OutputFormat::Excel,
            Format::GoogleForm => OutputFormat::GoogleForm,
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Generate {
            input,
            format,
            output,
            response_rows,
            validate_only,
        } => {
            let mut options = GenerateOptions::new(format.into()).with_response_rows(response_rows);
            if let Some(output) = output {
                options = options.with_output(output);
            }
            if validate_only {
                check(&input)
            } else {
                run_generate(&input, &options)
            }
        }
        Commands::Validate { input } => check(&input),
        Commands::Normalize { input, output } => run_normalize(&input, output.as_deref()),
        Commands::Inspect { input } => inspect(&input),
    }
}

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn load(input: &Path) -> Result<RawDocument> {
    scorecard::input::load_document(input)
        .with_context(|| format!("Failed to read '{}'", input.display()))
}

fn run_generate(input: &Path, options: &GenerateOptions) -> Result<()> {
    let assessment =
        load_file(input).with_context(|| format!("Failed to load '{}'", input.display()))?;
    let path = generate(&assessment, options)
        .with_context(|| format!("Failed to write '{}'", options.output.display()))?;
    println!("{}", path.display());
    Ok(())
}

fn check(input: &Path) -> Result<()> {
    let document = load(input)?;
    let problems = validate(&document);
    if problems.is_empty() {
        info!(path = %input.display(), "questionnaire is valid");
        return Ok(());
    }

    for problem in &problems {
        println!("{}", problem);
    }
    eprintln!(
        "{} problem(s) found in '{}'",
        problems.len(),
        input.display()
    );
    std::process::exit(1);
}

fn run_normalize(input: &Path, output: Option<&Path>) -> Result<()> {
    let document = load(input)?;
    let yaml = normalize_to_yaml(document).context("Failed to render normalized YAML")?;

    match output {
        Some(path) => {
            write_atomic(path, yaml.as_bytes())
                .with_context(|| format!("Failed to write '{}'", path.display()))?;
            info!(path = %path.display(), "normalized questionnaire written");
        }
        None => print!("{}", yaml),
    }
    Ok(())
}

fn inspect(input: &Path) -> Result<()> {
    let workbook = XlsxReader::read_file(input)
        .with_context(|| format!("Failed to open '{}'", input.display()))?;

    println!("File: {}", input.display());
    println!("Sheets: {}", workbook.sheet_count());

    for (i, sheet) in workbook.worksheets().enumerate() {
        let state = if sheet.is_visible() { "" } else { " (hidden)" };
        println!();
        println!("  Sheet {}: \"{}\"{}", i, sheet.name(), state);
        println!("    Rows: {}", sheet.max_row());
        println!("    Formulas: {}", sheet.formula_count());
        println!("    Drop-downs: {}", sheet.list_validations().len());
    }

    Ok(())
}

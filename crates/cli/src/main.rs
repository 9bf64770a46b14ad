//! OpenAPI Operations CLI
//!
//! Command-line interface for listing the REST operations of an OpenAPI document.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::*;
use openapi_operations_common::{ParserOptions, RestApiOperation};
use openapi_operations_parser::openapi::{OpenApiDocumentParser, ParseReport};
use std::path::{Path, PathBuf};
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "openapi-operations")]
#[command(version, long_about = None)]
#[command(about = "Compile OpenAPI documents into REST operation descriptors")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse a document and display the extracted operations
    #[command(after_help = "EXAMPLES:\n  \
        # Parse a compliant document\n  \
        openapi-operations parse --spec key-vault.json\n\n  \
        # Keep going past contract violations\n  \
        openapi-operations parse --spec legacy.yaml --lenient\n\n  \
        # Emit the operations as JSON, using an options file\n  \
        openapi-operations parse --spec key-vault.json --config options.yaml --json")]
    Parse {
        /// Path to the OpenAPI document (JSON or YAML)
        #[arg(short, long)]
        spec: PathBuf,

        /// Record contract violations instead of failing on the first one
        #[arg(short, long)]
        lenient: bool,

        /// Parser options file (YAML)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Print the parse report as JSON
        #[arg(long)]
        json: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    init_tracing(cli.verbose);

    match cli.command {
        Commands::Parse {
            spec,
            lenient,
            config,
            json,
        } => {
            parse_command(spec.as_path(), config.as_deref(), lenient, json, cli.verbose)?;
        },
    }

    Ok(())
}

/// Log to stderr; `RUST_LOG` takes precedence over `--verbose`
fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn load_options(config: Option<&Path>, lenient: bool) -> Result<ParserOptions> {
    let options = match config {
        Some(path) => ParserOptions::load(path)
            .with_context(|| format!("Failed to load parser options from {}", path.display()))?,
        None => ParserOptions::default(),
    };

    // --lenient can only relax the options file
    if lenient {
        Ok(options.with_ignore_non_compliant_errors(true))
    } else {
        Ok(options)
    }
}

fn parse_command(
    spec_path: &Path,
    config: Option<&Path>,
    lenient: bool,
    json: bool,
    verbose: bool,
) -> Result<()> {
    let options = load_options(config, lenient)?;
    debug!(?options, "parser options");

    if !json {
        println!("{} Parsing document: {}", "→".cyan(), spec_path.display());
        if options.ignore_non_compliant_errors {
            println!("{} Lenient mode: contract violations are recorded", "→".cyan());
        }
    }

    let report = OpenApiDocumentParser::new()
        .with_options(options)
        .parse_file(spec_path)
        .with_context(|| format!("Failed to parse OpenAPI document {}", spec_path.display()))?;

    if json {
        let output =
            serde_json::to_string_pretty(&report).context("Failed to serialize parse report")?;
        println!("{}", output);
        return Ok(());
    }

    print_report(&report, verbose);

    Ok(())
}

fn print_report(report: &ParseReport, verbose: bool) {
    println!("\n{}", "✓ Parse successful!".green().bold());
    println!("\n{}", "Operations:".bold());
    println!("  Count: {}", report.operations.len());

    if let Some(server_url) = report.operations.iter().find_map(|o| o.server_url()) {
        println!("  Server: {}", server_url.as_str().yellow());
    }

    for operation in &report.operations {
        println!(
            "  • {} {} ({})",
            operation.method().to_string().cyan(),
            operation.path(),
            operation.id().yellow()
        );

        if verbose {
            print_operation_details(operation);
        }
    }

    if !report.violations.is_empty() {
        println!(
            "\n{}",
            format!("⚠ Ignored {} contract violation(s):", report.violations.len())
                .yellow()
                .bold()
        );
        for violation in &report.violations {
            println!("  • {}", violation);
        }
    }
}

fn print_operation_details(operation: &RestApiOperation) {
    for parameter in operation.parameters() {
        let required = if parameter.is_required { "*" } else { "" };
        let item_type = parameter
            .array_item_type
            .as_deref()
            .map(|t| format!("<{}>", t))
            .unwrap_or_default();

        println!(
            "    {} {}{}: {}{}",
            parameter.location.to_string().dimmed(),
            parameter.name,
            required.red(),
            parameter.parameter_type,
            item_type
        );
    }

    if let Some(payload) = operation.payload() {
        println!(
            "    {} {} ({} properties)",
            "payload".dimmed(),
            payload.media_type,
            payload.properties.len()
        );
    }
}

//! # utf8-convert CLI - Encoding Detection and UTF-8 Conversion
//!
//! Command-line interface for detecting the encoding of text files and
//! converting them to UTF-8, to a new file, to stdout or in place.

#[cfg(feature = "cli")]
use std::fs;
#[cfg(feature = "cli")]
use std::io::{self, Read, Write};
#[cfg(feature = "cli")]
use std::path::{Path, PathBuf};

#[cfg(feature = "cli")]
use anyhow::{Context, Result};
#[cfg(feature = "cli")]
use clap::{Args, Parser, Subcommand, ValueEnum};
#[cfg(feature = "cli")]
use serde::Serialize;
#[cfg(feature = "cli")]
use tracing_subscriber::EnvFilter;

#[cfg(feature = "cli")]
use utf8_convert::detection::{DetectionResult, EncodingDetector};
#[cfg(feature = "cli")]
use utf8_convert::{Conversion, Encoding, ReplaceStrategy, utf8};

#[cfg(not(feature = "cli"))]
fn main() {
    eprintln!("CLI features disabled. Enable with --features cli");
    std::process::exit(1);
}

/// utf8-convert: detect text encodings and convert to UTF-8
#[cfg(feature = "cli")]
#[derive(Parser)]
#[command(name = "utf8-convert")]
#[command(version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Output format (text, json)
    #[arg(long, global = true, default_value = "text")]
    format: OutputFormat,
}

#[cfg(feature = "cli")]
#[derive(Subcommand)]
enum Commands {
    /// Detect the encoding of input files
    Detect(DetectArgs),

    /// Convert a file to UTF-8
    Convert(ConvertArgs),

    /// Check that a file is well-formed UTF-8
    Validate(ValidateArgs),

    /// List all supported encodings
    List,

    /// Display detailed information about an encoding
    Info(InfoArgs),
}

#[cfg(feature = "cli")]
#[derive(Args)]
struct DetectArgs {
    /// Input files (stdin if none given)
    files: Vec<PathBuf>,

    /// Show scores of the single-byte candidates
    #[arg(long)]
    candidates: bool,
}

#[cfg(feature = "cli")]
#[derive(Args)]
struct ConvertArgs {
    /// Input file (stdin if not specified)
    #[arg(short, long)]
    input: Option<PathBuf>,

    /// Output file (stdout if not specified)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Convert in-place (overwrite input file)
    #[arg(long, conflicts_with_all = ["output", "from"], requires = "input")]
    in_place: bool,

    /// Never delete the original when replacing it in place fails
    #[arg(long, requires = "in_place")]
    strict_rename: bool,

    /// Skip detection and decode as this encoding
    #[arg(short = 'f', long = "from")]
    from: Option<Encoding>,
}

#[cfg(feature = "cli")]
#[derive(Args)]
struct ValidateArgs {
    /// Input file (stdin if not specified)
    input: Option<PathBuf>,
}

#[cfg(feature = "cli")]
#[derive(Args)]
struct InfoArgs {
    /// Encoding to describe
    encoding: Encoding,

    /// Show character mapping samples
    #[arg(long)]
    samples: bool,
}

#[cfg(feature = "cli")]
#[derive(Clone, Debug, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

#[cfg(feature = "cli")]
#[derive(Serialize)]
struct DetectionReport {
    source: String,
    #[serde(flatten)]
    result: DetectionResult,
}

#[cfg(feature = "cli")]
#[derive(Serialize)]
struct ConversionReport {
    source_encoding: Encoding,
    bytes_read: Option<usize>,
    bytes_written: Option<usize>,
    in_place: bool,
}

#[cfg(feature = "cli")]
#[derive(Serialize)]
struct ValidationReport {
    valid: bool,
    invalid_offset: Option<usize>,
    bytes_checked: usize,
}

#[cfg(feature = "cli")]
fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Detect(ref args) => detect_command(args, &cli)?,
        Commands::Convert(ref args) => convert_command(args, &cli)?,
        Commands::Validate(ref args) => validate_command(args, &cli)?,
        Commands::List => list_command(&cli)?,
        Commands::Info(ref args) => info_command(args, &cli)?,
    }

    Ok(())
}

#[cfg(feature = "cli")]
fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

#[cfg(feature = "cli")]
fn read_input(input: Option<&PathBuf>) -> Result<Vec<u8>> {
    match input {
        Some(path) => fs::read(path)
            .with_context(|| format!("Failed to read input file: {}", path.display())),
        None => {
            let mut buffer = Vec::new();
            io::stdin()
                .read_to_end(&mut buffer)
                .context("Failed to read from stdin")?;
            Ok(buffer)
        }
    }
}

#[cfg(feature = "cli")]
fn detect_command(args: &DetectArgs, cli: &Cli) -> Result<()> {
    let detector = EncodingDetector::new();

    let inputs: Vec<Option<&PathBuf>> = if args.files.is_empty() {
        vec![None]
    } else {
        args.files.iter().map(Some).collect()
    };

    let mut reports = Vec::with_capacity(inputs.len());
    for input in inputs {
        let data = read_input(input)?;
        reports.push(DetectionReport {
            source: input.map_or_else(|| "<stdin>".to_string(), |p| p.display().to_string()),
            result: detector.detect(&data),
        });
    }

    match cli.format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&reports)?);
        }
        OutputFormat::Text => {
            for report in &reports {
                let result = &report.result;
                println!("{}: {}", report.source, result.encoding);

                if cli.verbose {
                    println!("  Method: {:?}", result.method);
                    println!(
                        "  BOM detected: {}",
                        if result.bom_detected { "Yes" } else { "No" }
                    );
                }

                if args.candidates {
                    for candidate in &result.candidates {
                        println!("  {:14} {:>8.4}", candidate.encoding.name(), candidate.score);
                    }
                }
            }
        }
    }

    Ok(())
}

#[cfg(feature = "cli")]
fn convert_command(args: &ConvertArgs, cli: &Cli) -> Result<()> {
    if args.in_place {
        let path = args
            .input
            .as_ref()
            .context("Cannot use --in-place without input file")?;
        let strategy = if args.strict_rename {
            ReplaceStrategy::RenameOnly
        } else {
            ReplaceStrategy::RemoveAndRetry
        };

        let bytes_read = file_len(path);
        let encoding = utf8_convert::convert_file_to_utf8_in_place_with(path, strategy)
            .with_context(|| format!("Failed to convert in place: {}", path.display()))?;
        let bytes_written = file_len(path);

        return report_conversion(
            cli,
            ConversionReport {
                source_encoding: encoding,
                bytes_read,
                bytes_written,
                in_place: true,
            },
        );
    }

    let input_data = read_input(args.input.as_ref())?;

    let conversion: Conversion = match args.from {
        Some(encoding) => {
            let body = encoding
                .bom()
                .and_then(|bom| input_data.strip_prefix(bom))
                .unwrap_or(&input_data);
            utf8_convert::convert_as(body, encoding)
        }
        None => utf8_convert::convert(&input_data),
    };

    if let Some(ref output_path) = args.output {
        fs::write(output_path, &conversion.bytes)
            .with_context(|| format!("Failed to write output file: {}", output_path.display()))?;
    } else {
        io::stdout()
            .write_all(&conversion.bytes)
            .context("Failed to write to stdout")?;
    }

    report_conversion(
        cli,
        ConversionReport {
            source_encoding: conversion.encoding,
            bytes_read: Some(input_data.len()),
            bytes_written: Some(conversion.bytes.len()),
            in_place: false,
        },
    )
}

#[cfg(feature = "cli")]
fn report_conversion(cli: &Cli, report: ConversionReport) -> Result<()> {
    match cli.format {
        // json goes to stderr so it never mixes with converted text on stdout
        OutputFormat::Json => eprintln!("{}", serde_json::to_string_pretty(&report)?),
        OutputFormat::Text => {
            eprintln!("Source encoding: {}", report.source_encoding);
            if cli.verbose {
                eprintln!(
                    "Processed {} -> {}",
                    describe_size(report.bytes_read),
                    describe_size(report.bytes_written)
                );
            }
        }
    }

    Ok(())
}

/// Size of the file at `path`, or `None` when its metadata cannot be read.
#[cfg(feature = "cli")]
fn file_len(path: &Path) -> Option<usize> {
    match fs::metadata(path) {
        Ok(meta) => Some(meta.len() as usize),
        Err(err) => {
            tracing::debug!(path = %path.display(), error = %err, "cannot read file size");
            None
        }
    }
}

#[cfg(feature = "cli")]
fn describe_size(size: Option<usize>) -> String {
    match size {
        Some(n) => format!("{n} bytes"),
        None => "unknown size".to_string(),
    }
}

#[cfg(feature = "cli")]
fn validate_command(args: &ValidateArgs, cli: &Cli) -> Result<()> {
    let input_data = read_input(args.input.as_ref())?;
    let result = utf8::validate(&input_data);

    match cli.format {
        OutputFormat::Json => {
            let report = ValidationReport {
                valid: result.is_ok(),
                invalid_offset: result.err(),
                bytes_checked: input_data.len(),
            };
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        OutputFormat::Text => match result {
            Ok(()) => println!("✓ Input is valid UTF-8"),
            Err(offset) => println!("✗ Input is not valid UTF-8 (first error at byte {offset})"),
        },
    }

    if result.is_err() {
        std::process::exit(1);
    }

    Ok(())
}

#[cfg(feature = "cli")]
fn list_command(cli: &Cli) -> Result<()> {
    match cli.format {
        OutputFormat::Json => {
            let encodings_info: Vec<_> = Encoding::ALL
                .iter()
                .map(|encoding| {
                    serde_json::json!({
                        "name": encoding.name(),
                        "category": category(*encoding),
                        "description": get_encoding_description(*encoding),
                        "ascii_compatible": encoding.is_ascii_compatible(),
                        "bom": encoding.bom().map(|b| format!("{:02X?}", b)),
                    })
                })
                .collect();
            println!("{}", serde_json::to_string_pretty(&encodings_info)?);
        }
        OutputFormat::Text => {
            println!("Supported Encodings ({} total):", Encoding::ALL.len());
            println!();

            for encoding in Encoding::ALL {
                println!(
                    "{:14} {:14} {}",
                    encoding.name(),
                    format!("[{}]", category(encoding)),
                    get_encoding_description(encoding)
                );
                if cli.verbose {
                    if let Some(bom) = encoding.bom() {
                        println!("               BOM: {:02X?}", bom);
                    }
                }
            }
        }
    }

    Ok(())
}

#[cfg(feature = "cli")]
fn info_command(args: &InfoArgs, cli: &Cli) -> Result<()> {
    let encoding = args.encoding;

    match cli.format {
        OutputFormat::Json => {
            let info = serde_json::json!({
                "name": encoding.name(),
                "category": category(encoding),
                "ascii_compatible": encoding.is_ascii_compatible(),
                "bom": encoding.bom().map(|b| format!("{:02X?}", b)),
                "description": get_encoding_description(encoding),
            });
            println!("{}", serde_json::to_string_pretty(&info)?);
        }
        OutputFormat::Text => {
            println!("Encoding Information: {}", encoding.name());
            println!("Description: {}", get_encoding_description(encoding));
            println!(
                "ASCII Compatible: {}",
                if encoding.is_ascii_compatible() {
                    "Yes"
                } else {
                    "No"
                }
            );

            if let Some(bom) = encoding.bom() {
                println!("BOM: {:02X?}", bom);
            } else {
                println!("BOM: None");
            }

            if args.samples {
                println!("\nCharacter Samples:");
                print_character_samples(encoding);
            }
        }
    }

    Ok(())
}

#[cfg(feature = "cli")]
fn category(encoding: Encoding) -> &'static str {
    if encoding.is_unicode() {
        "unicode"
    } else {
        "single-byte"
    }
}

#[cfg(feature = "cli")]
fn get_encoding_description(encoding: Encoding) -> &'static str {
    match encoding {
        Encoding::UTF8 => "Unicode Transformation Format 8-bit, variable-length encoding",
        Encoding::UTF16LE => "Unicode Transformation Format 16-bit, little-endian",
        Encoding::UTF16BE => "Unicode Transformation Format 16-bit, big-endian",
        Encoding::UTF32LE => "Unicode Transformation Format 32-bit, little-endian",
        Encoding::UTF32BE => "Unicode Transformation Format 32-bit, big-endian",
        Encoding::WINDOWS_1251 => "Windows code page for Cyrillic scripts",
        Encoding::KOI8_R => "KOI8 for Russian, Unix and early Internet mail",
        Encoding::ISO_8859_5 => "ISO/IEC 8859-5 Latin/Cyrillic alphabet",
        Encoding::MAC_CYRILLIC => "Classic Macintosh Cyrillic character encoding",
    }
}

#[cfg(feature = "cli")]
fn print_character_samples(encoding: Encoding) {
    let Some(page) = encoding.code_page() else {
        println!("  Covers all of Unicode; no fixed byte mapping");
        return;
    };

    for byte in [0x41, 0xA8, 0xB8, 0xC0, 0xCF, 0xE0, 0xF0, 0xFF] {
        println!("  0x{:02X} -> {}", byte, page.decode_byte(byte));
    }
}

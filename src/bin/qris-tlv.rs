//! qris-tlv CLI
//!
//! Inspect, checksum and modify QRIS payload strings.

use anyhow::{bail, Context, Result};
use clap::{ArgAction, Parser, Subcommand};
use qris_tlv::{
    crc16, legacy_patch, refresh_crc, split_trailer, Decoder, Directive, Mode, ProcessConfig, Processor, Record,
    RowStatus, Table, TariffTable,
};
use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};

#[derive(Parser, Debug)]
#[command(name = "qris-tlv")]
#[command(author = "nzinfo <li.monan@gmail.com>")]
#[command(version)]
#[command(about = "QRIS payload TLV tool")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// List the fields of a payload in tag order
    Fields {
        /// Payload file (default: stdin)
        #[arg(short = 'i', long)]
        input: Option<PathBuf>,

        /// Warn about duplicate tags
        #[arg(short, long, action = ArgAction::Count)]
        verbose: u8,
    },

    /// Print the CRC-16 of the input
    Crc {
        /// Input file (default: stdin)
        #[arg(short = 'i', long)]
        input: Option<PathBuf>,
    },

    /// Check the checksum trailer of a payload
    Verify {
        /// Payload file (default: stdin)
        #[arg(short = 'i', long)]
        input: Option<PathBuf>,
    },

    /// Replace the checksum trailer of a payload
    Refresh {
        /// Payload file (default: stdin)
        #[arg(short = 'i', long)]
        input: Option<PathBuf>,

        /// Output file (default: stdout)
        #[arg(short = 'o', long)]
        output: Option<PathBuf>,
    },

    /// Apply a directive file to a payload
    Modify {
        /// Directive file (action|tag|length|value lines)
        #[arg(short = 'c', long)]
        config: PathBuf,

        /// Record values for $name references, as name=value
        #[arg(short = 'r', long = "record")]
        record: Vec<String>,

        /// Payload file (default: stdin)
        #[arg(short = 'i', long)]
        input: Option<PathBuf>,

        /// Output file (default: stdout)
        #[arg(short = 'o', long)]
        output: Option<PathBuf>,

        /// Verbose output
        #[arg(short, long, action = ArgAction::Count)]
        verbose: u8,
    },

    /// Splice a tariff at the fixed legacy offset
    Legacy {
        /// Tariff to insert
        #[arg(short = 't', long)]
        tariff: String,

        /// Also rewrite the point of initiation to dynamic (12)
        #[arg(long)]
        rewrite_prefix: bool,

        /// Payload file (default: stdin)
        #[arg(short = 'i', long)]
        input: Option<PathBuf>,

        /// Output file (default: stdout)
        #[arg(short = 'o', long)]
        output: Option<PathBuf>,
    },

    /// Collect payload files from a directory into a table
    Scan {
        /// Directory to walk for *.txt payload files
        directory: PathBuf,

        /// Tariff table (MARKER=TARIFF lines)
        #[arg(short = 't', long)]
        tariffs: Option<PathBuf>,

        /// Output table (default: stdout)
        #[arg(short = 'o', long)]
        output: Option<PathBuf>,

        /// Verbose output
        #[arg(short, long, action = ArgAction::Count)]
        verbose: u8,
    },

    /// Modify every payload of a table
    Batch {
        /// Table file (tab-separated, header line first)
        table: PathBuf,

        /// Directive file for TLV mode
        #[arg(short = 'c', long, required_unless_present = "legacy", conflicts_with = "legacy")]
        config: Option<PathBuf>,

        /// Use the legacy fixed-offset patcher
        #[arg(long)]
        legacy: bool,

        /// Legacy mode: also rewrite the point of initiation to dynamic (12)
        #[arg(long, requires = "legacy")]
        rewrite_prefix: bool,

        /// Column holding the payloads
        #[arg(long, default_value = "qrstring")]
        payload_column: String,

        /// Column holding the tariffs (legacy mode)
        #[arg(long, default_value = "tarif")]
        tariff_column: String,

        /// Output table (default: stdout)
        #[arg(short = 'o', long)]
        output: Option<PathBuf>,

        /// Verbose output
        #[arg(short, long, action = ArgAction::Count)]
        verbose: u8,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Fields { input, verbose } => {
            list_fields(input, verbose)?;
        }
        Commands::Crc { input } => {
            let data = read_input(input.as_deref())?;
            println!("{}", crc16(data.as_bytes()));
        }
        Commands::Verify { input } => {
            verify_payload(input)?;
        }
        Commands::Refresh { input, output } => {
            let payload = read_input(input.as_deref())?;
            write_output(output.as_deref(), &refresh_crc(&payload))?;
        }
        Commands::Modify { config, record, input, output, verbose } => {
            modify_payload(config, record, input, output, verbose)?;
        }
        Commands::Legacy { tariff, rewrite_prefix, input, output } => {
            let payload = read_input(input.as_deref())?;
            write_output(output.as_deref(), &legacy_patch(&payload, &tariff, rewrite_prefix))?;
        }
        Commands::Scan { directory, tariffs, output, verbose } => {
            scan_directory(directory, tariffs, output, verbose)?;
        }
        Commands::Batch {
            table,
            config,
            legacy,
            rewrite_prefix,
            payload_column,
            tariff_column,
            output,
            verbose,
        } => {
            let mode = match config {
                Some(path) if !legacy => Mode::Tlv {
                    directives: read_directives(&path)?,
                },
                _ => Mode::Legacy { rewrite_prefix },
            };
            let config = ProcessConfig {
                payload_column,
                tariff_column,
                ..Default::default()
            };
            batch_table(table, mode, config, output, verbose)?;
        }
    }

    Ok(())
}

/// Read a file or stdin, dropping the trailing line break
fn read_input(input: Option<&Path>) -> Result<String> {
    let content = if let Some(input_path) = input {
        fs::read_to_string(input_path).with_context(|| format!("Failed to read: {}", input_path.display()))?
    } else {
        let mut buffer = String::new();
        io::stdin().read_to_string(&mut buffer)?;
        buffer
    };

    Ok(content.trim_end_matches(|c: char| c == '\r' || c == '\n').to_string())
}

fn write_output(output: Option<&Path>, content: &str) -> Result<()> {
    if let Some(output_path) = output {
        fs::write(output_path, format!("{}\n", content))
            .with_context(|| format!("Failed to write: {}", output_path.display()))?;
    } else {
        println!("{}", content);
    }
    Ok(())
}

fn read_directives(path: &Path) -> Result<Vec<Directive>> {
    let content = fs::read_to_string(path).with_context(|| format!("Failed to read: {}", path.display()))?;
    Directive::parse_content(&content).with_context(|| format!("Invalid directive file: {}", path.display()))
}

fn parse_record(pairs: &[String]) -> Result<Record> {
    let mut record = Record::new();
    for pair in pairs {
        let Some((name, value)) = pair.split_once('=') else {
            bail!("Invalid record value '{}'. Expected name=value", pair);
        };
        record.set(name.trim(), value);
    }
    Ok(record)
}

fn list_fields(input: Option<PathBuf>, verbose: u8) -> Result<()> {
    let payload = read_input(input.as_deref())?;

    let decoder = Decoder::new().with_verbose(verbose);
    let fields = decoder.decode(&payload)?;

    for field in fields.iter() {
        println!("{}  {:02}  {}", field.tag, field.length(), field.value);
    }

    Ok(())
}

fn verify_payload(input: Option<PathBuf>) -> Result<()> {
    let payload = read_input(input.as_deref())?;
    let (body, trailer) = split_trailer(&payload)?;
    let expected = crc16(body.as_bytes());

    if trailer.eq_ignore_ascii_case(&expected) {
        println!("OK {}", expected);
        Ok(())
    } else {
        bail!("Checksum mismatch: trailer is {}, expected {}", trailer, expected);
    }
}

fn modify_payload(
    config: PathBuf,
    record: Vec<String>,
    input: Option<PathBuf>,
    output: Option<PathBuf>,
    verbose: u8,
) -> Result<()> {
    let directives = read_directives(&config)?;
    let record = parse_record(&record)?;
    let payload = read_input(input.as_deref())?;

    if verbose > 0 {
        eprintln!("Directives: {}", directives.len());
    }

    let processor = Processor::new(Mode::Tlv { directives }).with_verbose(verbose);
    let outcome = processor.process(&payload, Some(&record))?;

    for diagnostic in &outcome.diagnostics {
        eprintln!("Warning: {}", diagnostic);
    }

    write_output(output.as_deref(), &outcome.payload)
}

fn scan_directory(directory: PathBuf, tariffs: Option<PathBuf>, output: Option<PathBuf>, verbose: u8) -> Result<()> {
    if !directory.is_dir() {
        bail!("Directory not found: {}", directory.display());
    }

    let tariffs = match tariffs {
        Some(path) => TariffTable::read_from_path(&path)?,
        None => TariffTable::new(),
    };

    let config = ProcessConfig::default();
    let mut table = Table::new([
        config.filename_column.as_str(),
        config.payload_column.as_str(),
        config.tariff_column.as_str(),
    ]);

    let entries = walkdir::WalkDir::new(&directory)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .filter(|e| e.path().extension().is_some_and(|ext| ext == "txt"));

    for entry in entries {
        let path = entry.path();
        let content = fs::read_to_string(path).with_context(|| format!("Failed to read: {}", path.display()))?;
        let payload = content.trim().to_string();

        let relative_path = path
            .strip_prefix(&directory)
            .map_err(|_| anyhow::anyhow!("Failed to get relative path"))?;
        let name = relative_path.to_string_lossy().replace('\\', "/");

        let tariff = tariffs.lookup(&payload).unwrap_or_default().to_string();
        if verbose > 0 {
            if tariff.is_empty() {
                eprintln!("Added: {} (no tariff match)", name);
            } else {
                eprintln!("Added: {} (tariff {})", name, tariff);
            }
        }

        table.push_row(vec![name, payload, tariff])?;
    }

    if verbose > 0 {
        eprintln!("Rows: {}", table.len());
    }

    write_table(output.as_deref(), &table)
}

fn batch_table(
    path: PathBuf,
    mode: Mode,
    config: ProcessConfig,
    output: Option<PathBuf>,
    verbose: u8,
) -> Result<()> {
    let mut table = Table::read_from_path(&path)?;

    let processor = Processor::new(mode).with_config(config).with_verbose(verbose);
    let reports = processor.process_table(&mut table)?;

    let mut failed = 0;
    for report in &reports {
        let name = report.label.clone().unwrap_or_else(|| format!("row {}", report.row + 1));
        match &report.status {
            RowStatus::Failed(err) => {
                failed += 1;
                eprintln!("Error: {}: {}", name, err);
            }
            // Already reported by the processor when verbose
            RowStatus::Modified { diagnostics } if verbose == 0 => {
                for diagnostic in diagnostics {
                    eprintln!("Warning: {}: {}", name, diagnostic);
                }
            }
            _ => {}
        }
    }

    write_table(output.as_deref(), &table)?;

    if verbose > 0 {
        eprintln!("Processed {} rows, {} failed", reports.len(), failed);
    }

    Ok(())
}

fn write_table(output: Option<&Path>, table: &Table) -> Result<()> {
    if let Some(output_path) = output {
        table.write_to_path(output_path)
    } else {
        print!("{}", table.to_tsv()?);
        Ok(())
    }
}

//! Payload modification
//!
//! [`apply`] runs directives over a parsed field set. [`Processor`] wraps the
//! whole parse, modify, serialize and checksum sequence for one payload or a
//! table of them, in either the tag-aware mode or the legacy fixed-offset mode.

use crate::decoder::Decoder;
use crate::directive::{Directive, ValueSource};
use crate::encoder::Encoder;
use crate::legacy::{legacy_patch, TARIFF_TAG};
use crate::payload::{Diagnostic, Field, FieldSet, PayloadError, Record};
use crate::table::Table;
use anyhow::{bail, Result};

/// Apply directives to a field set in order.
///
/// Deleting an absent tag does nothing. An insert whose `$name` is not in
/// `record` (or when there is no record) is skipped and reported; the
/// remaining directives still run. The checksum is not touched.
///
/// # Example
/// ```rust
/// use qris_tlv::{apply, parse, Directive, Record};
///
/// let fields = parse("000201010211")?;
/// let record = Record::new().with("tarif", "2000");
/// let directives = vec![
///     Directive::insert("01", "12"),
///     Directive::insert_from_record("54", "tarif"),
/// ];
///
/// let (fields, diagnostics) = apply(fields, &directives, Some(&record));
/// assert!(diagnostics.is_empty());
/// assert_eq!(fields.value("01"), Some("12"));
/// assert_eq!(fields.value("54"), Some("2000"));
/// # Ok::<(), qris_tlv::PayloadError>(())
/// ```
pub fn apply(mut fields: FieldSet, directives: &[Directive], record: Option<&Record>) -> (FieldSet, Vec<Diagnostic>) {
    let mut diagnostics = Vec::new();

    for (index, directive) in directives.iter().enumerate() {
        match directive {
            Directive::Delete { tag } => {
                fields.remove(tag);
            }
            Directive::Insert { tag, source } => {
                let value = match source {
                    ValueSource::Literal(value) => value.as_str(),
                    ValueSource::Record(name) => match record.and_then(|r| r.get(name)) {
                        Some(value) => value,
                        None => {
                            diagnostics.push(Diagnostic::MissingRecordField {
                                directive: Some(index),
                                tag: tag.clone(),
                                name: name.clone(),
                            });
                            continue;
                        }
                    },
                };
                fields.insert(Field::new(tag.as_str(), value));
            }
        }
    }

    (fields, diagnostics)
}

/// How payloads are modified
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mode {
    /// Parse, apply directives, serialize in tag order, refresh the checksum
    Tlv { directives: Vec<Directive> },
    /// Splice the tariff at the fixed offset of the older payload revision
    /// The tariff is read from the record field named by
    /// [`ProcessConfig::tariff_column`].
    Legacy {
        /// Also turn the static `010211` prefix into `010212`
        rewrite_prefix: bool,
    },
}

/// Column names used when processing a table
#[derive(Debug, Clone)]
pub struct ProcessConfig {
    /// Column holding the payload; results are written back into it
    pub payload_column: String,
    /// Column holding the tariff for legacy mode
    pub tariff_column: String,
    /// Column naming the source file, used in messages
    pub filename_column: String,
}

impl Default for ProcessConfig {
    fn default() -> Self {
        Self {
            payload_column: "qrstring".to_string(),
            tariff_column: "tarif".to_string(),
            filename_column: "filename".to_string(),
        }
    }
}

/// Result of modifying one payload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outcome {
    /// The modified payload, with a fresh checksum
    pub payload: String,
    /// Recoverable issues; the payload is still usable
    pub diagnostics: Vec<Diagnostic>,
}

/// What happened to one table row
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RowStatus {
    /// Payload rewritten, possibly with diagnostics
    Modified { diagnostics: Vec<Diagnostic> },
    /// Payload cell was empty
    Skipped,
    /// Payload left unchanged because it could not be processed
    Failed(PayloadError),
}

/// Per-row report from [`Processor::process_table`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowReport {
    /// 0-based row index
    pub row: usize,
    /// Value of the filename column, if present
    pub label: Option<String>,
    pub status: RowStatus,
}

/// Runs one [`Mode`] over payloads
pub struct Processor {
    mode: Mode,
    config: ProcessConfig,
    /// Verbosity level for per-row messages
    verbose: u8,
}

impl Processor {
    /// Create a processor with the default column configuration
    pub fn new(mode: Mode) -> Self {
        Self {
            mode,
            config: ProcessConfig::default(),
            verbose: 0,
        }
    }

    /// Use custom column names
    pub fn with_config(mut self, config: ProcessConfig) -> Self {
        self.config = config;
        self
    }

    /// Set verbosity level (0-3)
    pub fn with_verbose(mut self, level: u8) -> Self {
        self.verbose = level;
        self
    }

    pub fn mode(&self) -> &Mode {
        &self.mode
    }

    pub fn config(&self) -> &ProcessConfig {
        &self.config
    }

    /// Modify a single payload.
    ///
    /// # Errors
    /// - `PayloadError::MalformedPayload` - the payload does not parse (TLV mode)
    /// - `PayloadError::OversizedValue` - a value no longer fits (TLV mode)
    /// - `PayloadError::FieldAfterChecksum` - a tag sorts after `63` (TLV mode)
    pub fn process(&self, payload: &str, record: Option<&Record>) -> Result<Outcome, PayloadError> {
        match &self.mode {
            Mode::Tlv { directives } => {
                let fields = Decoder::new().with_verbose(self.verbose).decode(payload)?;
                let (fields, diagnostics) = apply(fields, directives, record);
                Ok(Outcome {
                    payload: Encoder::new().encode_with_crc(&fields)?,
                    diagnostics,
                })
            }
            Mode::Legacy { rewrite_prefix } => match record.and_then(|r| r.get(&self.config.tariff_column)) {
                Some(tariff) => Ok(Outcome {
                    payload: legacy_patch(payload, tariff, *rewrite_prefix),
                    diagnostics: Vec::new(),
                }),
                None => Ok(Outcome {
                    payload: payload.to_string(),
                    diagnostics: vec![Diagnostic::MissingRecordField {
                        directive: None,
                        tag: TARIFF_TAG.to_string(),
                        name: self.config.tariff_column.clone(),
                    }],
                }),
            },
        }
    }

    /// Modify the payload column of every row in place.
    ///
    /// Each row is also the record for its own payload. A row that fails
    /// keeps its original payload; other rows are unaffected.
    ///
    /// # Errors
    /// Fails only if the payload column does not exist.
    pub fn process_table(&self, table: &mut Table) -> Result<Vec<RowReport>> {
        let column = self.config.payload_column.as_str();
        if table.column_index(column).is_none() {
            bail!("Column '{}' not found in table", column);
        }

        let mut reports = Vec::with_capacity(table.len());
        for row in 0..table.len() {
            let record = table.record(row).unwrap_or_default();
            let label = record.get(&self.config.filename_column).map(str::to_string);
            let name = label.clone().unwrap_or_else(|| format!("row {}", row + 1));

            let status = match record.get(column) {
                None => {
                    if self.verbose > 0 {
                        eprintln!("Skipped {}: empty payload", name);
                    }
                    RowStatus::Skipped
                }
                Some(payload) => match self.process(payload, Some(&record)) {
                    Ok(outcome) => {
                        if self.verbose > 0 {
                            for diagnostic in &outcome.diagnostics {
                                eprintln!("Warning: {}: {}", name, diagnostic);
                            }
                            eprintln!("Processed: {}", name);
                        }
                        table.set(row, column, outcome.payload)?;
                        RowStatus::Modified {
                            diagnostics: outcome.diagnostics,
                        }
                    }
                    Err(err) => {
                        if self.verbose > 0 {
                            eprintln!("Error processing {}: {}", name, err);
                        }
                        RowStatus::Failed(err)
                    }
                },
            };

            reports.push(RowReport { row, label, status });
        }

        Ok(reports)
    }
}

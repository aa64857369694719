//! Stage trait and built-in stage catalog.
//!
//! A stage is a pure transformation `Record x Format -> Record` that may
//! fail with a classified [`StageError`]. Stages take `&self`: the engine
//! guarantees it never requires cross-record state, and a stage must not
//! smuggle any in through the engine.
//!
//! Built-in stages:
//! - `parse` - validate/normalize the record against the configured format
//! - `trim` - strip surrounding whitespace
//! - `upper` / `lower` - case folding
//! - `reject-empty` - parse failure on blank records
//!
//! Arbitrary transforms plug in through [`FnStage`], which gives closures
//! the same typed signature instead of trusting convention.

use crate::config::Format;
use crate::error::{PipelineError, StageError};
use crate::record::Record;

/// One transformation step in the pipeline.
pub trait Stage {
    /// Transform a record, or fail with a classified error.
    fn apply(&self, record: Record, format: Format) -> Result<Record, StageError>;

    /// The display name of this stage, used in failure reports.
    fn name(&self) -> &str;
}

/// Adapter turning a plain function or closure into a [`Stage`].
pub struct FnStage<F> {
    name: String,
    func: F,
}

impl<F> FnStage<F>
where
    F: Fn(Record, Format) -> Result<Record, StageError>,
{
    pub fn new(name: impl Into<String>, func: F) -> Self {
        Self {
            name: name.into(),
            func,
        }
    }
}

impl<F> Stage for FnStage<F>
where
    F: Fn(Record, Format) -> Result<Record, StageError>,
{
    fn apply(&self, record: Record, format: Format) -> Result<Record, StageError> {
        (self.func)(record, format)
    }

    fn name(&self) -> &str {
        &self.name
    }
}

// ---------------------------------------------------------------------------
// Built-in stages
// ---------------------------------------------------------------------------

/// `parse` - validates the record against the configured format and
/// re-emits it in normalized form.
///
/// JSON records are parsed and re-serialized compact; CSV records are
/// parsed and re-emitted with plain comma separation; text records pass
/// through unchanged. Malformed input fails with a parse error.
pub struct ParseStage;

impl Stage for ParseStage {
    fn apply(&self, record: Record, format: Format) -> Result<Record, StageError> {
        match format {
            Format::Json => {
                let value: serde_json::Value = serde_json::from_str(record.content())?;
                let compact = serde_json::to_string(&value)
                    .map_err(|e| StageError::internal(e.to_string()))?;
                Ok(record.with_content(compact))
            }
            Format::Csv => {
                let mut reader = csv::ReaderBuilder::new()
                    .has_headers(false)
                    .from_reader(record.content().as_bytes());
                let mut rows = reader.records();
                let row = match rows.next() {
                    Some(row) => row?,
                    None => return Err(StageError::parse("empty CSV record")),
                };
                if rows.next().is_some() {
                    return Err(StageError::parse("record contains more than one CSV row"));
                }
                let fields: Vec<&str> = row.iter().map(str::trim).collect();

                let mut writer = csv::Writer::from_writer(Vec::new());
                writer.write_record(&fields)?;
                let bytes = writer
                    .into_inner()
                    .map_err(|e| StageError::internal(e.to_string()))?;
                let normalized = String::from_utf8(bytes)
                    .map_err(|e| StageError::internal(e.to_string()))?
                    .trim_end_matches(['\r', '\n'])
                    .to_string();
                Ok(record.with_content(normalized))
            }
            Format::Text => Ok(record),
        }
    }

    fn name(&self) -> &str {
        "parse"
    }
}

/// `trim` - strips surrounding whitespace from the record.
pub struct TrimStage;

impl Stage for TrimStage {
    fn apply(&self, record: Record, _format: Format) -> Result<Record, StageError> {
        let trimmed = record.content().trim().to_string();
        Ok(record.with_content(trimmed))
    }

    fn name(&self) -> &str {
        "trim"
    }
}

/// `upper` - converts the record to uppercase.
pub struct UpperStage;

impl Stage for UpperStage {
    fn apply(&self, record: Record, _format: Format) -> Result<Record, StageError> {
        let upper = record.content().to_uppercase();
        Ok(record.with_content(upper))
    }

    fn name(&self) -> &str {
        "upper"
    }
}

/// `lower` - converts the record to lowercase.
pub struct LowerStage;

impl Stage for LowerStage {
    fn apply(&self, record: Record, _format: Format) -> Result<Record, StageError> {
        let lower = record.content().to_lowercase();
        Ok(record.with_content(lower))
    }

    fn name(&self) -> &str {
        "lower"
    }
}

/// `reject-empty` - fails blank records with a parse error.
pub struct RejectEmptyStage;

impl Stage for RejectEmptyStage {
    fn apply(&self, record: Record, _format: Format) -> Result<Record, StageError> {
        if record.content().trim().is_empty() {
            Err(StageError::parse("empty record"))
        } else {
            Ok(record)
        }
    }

    fn name(&self) -> &str {
        "reject-empty"
    }
}

// ---------------------------------------------------------------------------
// Factory
// ---------------------------------------------------------------------------

/// Look up a built-in stage by its catalog name.
pub fn stage_for_name(name: &str) -> Result<Box<dyn Stage>, PipelineError> {
    match name.trim().to_ascii_lowercase().as_str() {
        "parse" => Ok(Box::new(ParseStage)),
        "trim" => Ok(Box::new(TrimStage)),
        "upper" => Ok(Box::new(UpperStage)),
        "lower" => Ok(Box::new(LowerStage)),
        "reject-empty" => Ok(Box::new(RejectEmptyStage)),
        other => Err(PipelineError::UnknownStage {
            name: other.to_string(),
        }),
    }
}

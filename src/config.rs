//! Pipeline configuration.
//!
//! The only recognized option is the record format, supplied once at
//! construction and threaded read-only into every stage invocation.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::PipelineError;

/// Record format selecting format-specific stage behavior.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Format {
    Json,
    Csv,
    Text,
}

impl Format {
    /// The canonical lowercase name of the format.
    pub fn name(&self) -> &'static str {
        match self {
            Format::Json => "json",
            Format::Csv => "csv",
            Format::Text => "text",
        }
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Format {
    type Err = PipelineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "json" => Ok(Format::Json),
            "csv" => Ok(Format::Csv),
            "text" | "raw" => Ok(Format::Text),
            other => Err(PipelineError::UnknownFormat {
                name: other.to_string(),
            }),
        }
    }
}

/// Configuration supplied once at pipeline construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineConfig {
    pub format: Format,
}

impl PipelineConfig {
    pub fn new(format: Format) -> Self {
        Self { format }
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            format: Format::Text,
        }
    }
}

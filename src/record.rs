//! The record type flowing through the pipeline.
//!
//! A record is an opaque, immutable unit of input text tagged with its
//! position in the source sequence. The position is carried only so error
//! reports can point back at the offending input line; stages transform
//! content, never identity.

use std::fmt;

/// One unit of input data, identified by its position in the source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    seq: u64,
    content: String,
}

impl Record {
    /// Create a record at the given source position.
    pub fn new(seq: u64, content: impl Into<String>) -> Self {
        Self {
            seq,
            content: content.into(),
        }
    }

    /// Zero-based position of this record in the source sequence.
    pub fn seq(&self) -> u64 {
        self.seq
    }

    /// The record's text content.
    pub fn content(&self) -> &str {
        &self.content
    }

    /// Derive a transformed record with new content at the same position.
    pub fn with_content(&self, content: impl Into<String>) -> Self {
        Self {
            seq: self.seq,
            content: content.into(),
        }
    }

    /// Consume the record, yielding its content.
    pub fn into_content(self) -> String {
        self.content
    }
}

impl fmt::Display for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.content)
    }
}

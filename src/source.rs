//! Record source adapters.
//!
//! The driver takes any iterator of records; these helpers cover the two
//! common cases of in-memory strings and line-oriented readers. Both are
//! lazy and assign sequence numbers in pull order.

use std::io::BufRead;

use tracing::warn;

use crate::record::Record;

/// Turn an iterable of strings into a lazy record source.
pub fn from_strings<I, S>(items: I) -> impl Iterator<Item = Record>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    items
        .into_iter()
        .enumerate()
        .map(|(i, s)| Record::new(i as u64, s))
}

/// Turn a buffered reader into a lazy record source, one record per line.
///
/// A read error ends the stream after a warning; the records already
/// yielded are unaffected. Empty lines are records like any other - it is
/// a stage's job to reject them if the format calls for it.
pub fn from_reader<R: BufRead>(reader: R) -> impl Iterator<Item = Record> {
    reader
        .lines()
        .enumerate()
        .map_while(|(i, line)| match line {
            Ok(content) => Some(Record::new(i as u64, content)),
            Err(err) => {
                warn!(line = i, error = %err, "read error, ending stream");
                None
            }
        })
}

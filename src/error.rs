//! Typed failures of a reconciliation run.
//!
//! Everything is propagated as `anyhow::Error`; these variants exist so callers
//! (and tests) can tell a structural problem in the input or settings apart from
//! a plain I/O failure via `downcast_ref`.

use std::path::PathBuf;

use thiserror::Error;

pub const USAGE: &str = "Usage: dwc-helper <input-filename.csv> <output-filename.csv>";

#[derive(Debug, Error)]
pub enum ReconcileError {
    #[error("{}", USAGE)]
    Usage,
    #[error("Input has no header row")]
    MissingHeader,
    #[error("Header field {column} has no name")]
    EmptyHeader { column: usize },
    #[error("Header lists column '{0}' more than once")]
    DuplicateHeader(String),
    #[error("Row {row} has {found} value(s) but the header has {expected}")]
    MalformedInput {
        row: usize,
        expected: usize,
        found: usize,
    },
    #[error("Column '{term}' has {found} value(s), expected {expected}")]
    InconsistentColumnLength {
        term: String,
        expected: usize,
        found: usize,
    },
    #[error("Settings file {path:?} is corrupt at record {record}: {reason}")]
    CorruptSettings {
        path: PathBuf,
        record: usize,
        reason: String,
    },
    #[error("Operator input closed before the session finished")]
    InputClosed,
}

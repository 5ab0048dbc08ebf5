//! Fatal ingestion errors.
//!
//! Anything here aborts the run before output is written. Individual table
//! rows that fail to parse are not errors: parsers log and skip them. A table
//! where every row was skipped is.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum IngestError {
    #[error("PDF file not found: '{path}'")]
    FileNotFound { path: PathBuf },

    #[error("failed to read '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("file is not a PDF: '{path}' (first bytes: {magic:?})")]
    NotAPdf { path: PathBuf, magic: Vec<u8> },

    #[error("PDF '{path}' could not be parsed: {detail}")]
    CorruptPdf { path: PathBuf, detail: String },

    #[error("no extractable text in '{path}'; scanned statements need OCR first")]
    NoText { path: PathBuf },

    #[error("unsupported statement layout: expected an HDFC or ICICI statement")]
    UnsupportedLayout,

    #[error("{layout} statement is missing the {field}")]
    MissingField { layout: &'static str, field: &'static str },

    #[error("{layout} statement is missing the {section} section")]
    MissingSection { layout: &'static str, section: &'static str },

    #[error("{layout} transaction table found but none of its {skipped} rows could be read")]
    UnparsableTable { layout: &'static str, skipped: usize },
}

pub type Result<T> = std::result::Result<T, IngestError>;

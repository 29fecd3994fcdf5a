use std::path::PathBuf;

use miette::Diagnostic;
use thiserror::Error;

#[derive(Debug, Error, Diagnostic)]
pub enum CmftError {
    #[error("column accumulation is empty")]
    EmptyAccumulation,

    #[error("column {column} has {actual} values, expected {expected}")]
    MalformedAccumulation {
        column: usize,
        expected: usize,
        actual: usize,
    },

    #[error("row has {actual} fields, expected {expected}")]
    RaggedRow { expected: usize, actual: usize },

    #[error("extracted {urls} urls but {rows} rows; sequences are misaligned")]
    ExtractionMisaligned { urls: usize, rows: usize },

    #[error("failed to read metadata file at {0}")]
    MetadataRead(PathBuf),

    #[error("malformed metadata at line {line}: {message}")]
    MetadataParse { line: u64, message: String },

    #[error("metadata line {line} has no column {column}")]
    MissingColumn { line: u64, column: usize },

    #[error("invalid supplementary url: {0}")]
    InvalidSupplementaryUrl(String),

    #[error("listing request failed: {0}")]
    ListingHttp(String),

    #[error("listing returned status {status}: {message}")]
    ListingStatus { status: u16, message: String },

    #[error("failed to read config file at {0}")]
    ConfigRead(PathBuf),

    #[error("failed to parse JSON config: {0}")]
    ConfigParse(String),

    #[error("invalid config: {0}")]
    InvalidConfig(String),

    #[error("filesystem error: {0}")]
    Filesystem(String),

    #[error("failed to write table: {0}")]
    TableWrite(String),
}

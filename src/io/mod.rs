//! Tabular I/O for the three inputs and the summary output.

mod tables;

pub use tables::{
    read_user_ids, ActivityEventReader, AliasStreamReader, SummaryWriter, ALIAS_SCHEMA,
};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ReadError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("header mismatch: expected {expected:?}, got {actual:?}")]
    SchemaMismatch {
        expected: &'static [&'static str],
        actual: Vec<String>,
    },

    #[error("required column {column:?} missing from header {header:?}")]
    MissingColumn {
        column: &'static str,
        header: Vec<String>,
    },
}

#[derive(Debug, Error)]
pub enum WriteError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("summary file is already locked by another process")]
    AlreadyLocked,
}

//! Error types for dataset loading

use std::path::PathBuf;

use thiserror::Error;

/// Fatal errors raised while loading the dataset.
#[derive(Debug, Error)]
pub enum DatasetError {
    #[error("Dataset source {path} could not be read: {source}")]
    SourceNotFound {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed dataset: {0}")]
    MalformedInput(#[from] MalformedInput),
}

/// Reasons a readable source does not match the declared schema.
#[derive(Debug, Error)]
pub enum MalformedInput {
    #[error("missing required column \"{0}\"")]
    MissingColumn(String),

    #[error("row {row}: column \"{column}\" has unparseable value \"{value}\"")]
    InvalidValue {
        row: usize,
        column: String,
        value: String,
    },

    #[error("row {row}: age {age} is outside the bucketed range [0, 100)")]
    AgeOutOfRange { row: usize, age: i64 },

    #[error("invalid CSV: {0}")]
    Csv(#[from] csv::Error),
}

impl From<csv::Error> for DatasetError {
    fn from(err: csv::Error) -> Self {
        DatasetError::MalformedInput(MalformedInput::Csv(err))
    }
}

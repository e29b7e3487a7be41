use thiserror::Error;

/// The upload could not be read as a table of the expected types.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LoadError {
    #[error("{0}")]
    ParseFailure(String),
}

impl LoadError {
    pub fn parse(msg: impl Into<String>) -> Self {
        LoadError::ParseFailure(msg.into())
    }
}

/// The table parsed but does not satisfy the column contract.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Missing columns: {}", .0.join(", "))]
    MissingColumns(Vec<String>),
}

/// Anything that stops an upload from becoming a [`Dataset`](super::model::Dataset).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IngestError {
    #[error(transparent)]
    Load(#[from] LoadError),
    #[error(transparent)]
    Validation(#[from] ValidationError),
}

/// Serializing an export to delimited text failed.
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("writing CSV: {0}")]
    Csv(#[from] csv::Error),
    #[error("flushing CSV buffer: {0}")]
    Flush(String),
    #[error("export is not valid UTF-8: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),
}

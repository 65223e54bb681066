use thiserror::Error;

use crate::tokenizer::TokenizerError;

#[derive(Debug, Error)]
pub enum ChatsetError {
    #[error("row {row}: missing field '{field}'")]
    MissingField { row: usize, field: String },

    #[error("row {row}: invalid value {value:?} for field '{field}'")]
    InvalidField { row: usize, field: String, value: String },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("line {line}: unreadable: {source}")]
    Read { line: usize, source: std::io::Error },

    #[error("line {line}: invalid JSON: {source}")]
    Json { line: usize, source: serde_json::Error },

    #[error("Serialization error: {0}")]
    Ser(String),

    #[error("exchange {exchange}, message {message}: {source}")]
    Tokenization { exchange: usize, message: usize, source: TokenizerError },

    #[error("dataset is empty")]
    EmptyDataset,

    #[error("cannot summarize an empty series")]
    EmptySeries,

    #[error("invalid config: {0}")]
    InvalidConfig(String),
}

pub type Result<T> = std::result::Result<T, ChatsetError>;

//! Chat fine-tuning dataset preparation
//!
//! Formats labeled reviews into system/user/assistant exchanges, writes them
//! as newline-delimited JSON, and runs a pre-flight check (structure, token
//! statistics, training cost) over such files.

pub mod error;
pub mod schema;
pub mod format;
pub mod jsonl;
pub mod csv_source;
pub mod split;
pub mod validate;
pub mod tokenizer;
pub mod stats;
pub mod estimate;
pub mod report;

pub use error::{ChatsetError, Result};
pub use schema::*;
pub use format::{format_dataset, format_exchange, FormatConfig};
pub use jsonl::{dataset_hash, parse_dataset, read_dataset, serialize_dataset, write_dataset};
pub use csv_source::{load_records, read_records, ColumnMap};
pub use split::{split_records, SplitConfig};
pub use validate::{count_duplicates, validate, validate_strict, IssueKind, StructuralIssue};
pub use tokenizer::{BpeTokenizer, CharTokenizer, Tokenizer, TokenizerError};
pub use stats::{compute_stats, count_too_long, summarize, StatsConfig, Summary, TokenCountConfig, TokenStats};
pub use estimate::{billable_tokens, choose_epochs, estimate_training, EstimatorConfig, TrainingEstimate};
pub use report::{preflight, PreflightConfig, PreflightReport};

//! Tokenizer seam for token counting.
//!
//! `BpeTokenizer` wraps the vendor BPE tables from `tiktoken-rs`;
//! `CharTokenizer` is a fixed-width stand-in for tests and offline runs.

use thiserror::Error;
use tiktoken_rs::CoreBPE;

#[derive(Debug, Error)]
pub enum TokenizerError {
    #[error("unknown model or encoding '{name}': {reason}")]
    UnknownModel { name: String, reason: String },

    #[error("text rejected by tokenizer: {0}")]
    Rejected(String),
}

pub trait Tokenizer {
    fn tokenize(&self, text: &str) -> Result<Vec<u32>, TokenizerError>;

    fn count(&self, text: &str) -> Result<usize, TokenizerError> {
        Ok(self.tokenize(text)?.len())
    }
}

/// Special-token strings of each supported encoding. Text containing one is
/// rejected, matching the vendor tokenizer's default of disallowing them.
const R50K_SPECIAL: &[&str] = &["<|endoftext|>"];
const CL100K_SPECIAL: &[&str] = &[
    "<|endoftext|>",
    "<|fim_prefix|>",
    "<|fim_middle|>",
    "<|fim_suffix|>",
    "<|endofprompt|>",
];

pub struct BpeTokenizer {
    name: String,
    bpe: CoreBPE,
    special: &'static [&'static str],
}

impl BpeTokenizer {
    /// Resolve the encoding a chat model uses, e.g. `gpt-3.5-turbo` -> `cl100k_base`.
    pub fn for_model(model: &str) -> Result<Self, TokenizerError> {
        use tiktoken_rs::tokenizer::{get_tokenizer, Tokenizer as Encoding};

        let encoding = match get_tokenizer(model) {
            Some(Encoding::Cl100kBase) => "cl100k_base",
            Some(Encoding::P50kBase) => "p50k_base",
            Some(Encoding::R50kBase) => "r50k_base",
            _ => {
                return Err(TokenizerError::UnknownModel {
                    name: model.to_string(),
                    reason: "no supported encoding for model".to_string(),
                })
            }
        };
        let mut tok = Self::from_encoding(encoding)?;
        tok.name = model.to_string();
        Ok(tok)
    }

    pub fn from_encoding(encoding: &str) -> Result<Self, TokenizerError> {
        let (bpe, special) = match encoding {
            "cl100k_base" => (tiktoken_rs::cl100k_base(), CL100K_SPECIAL),
            "p50k_base" => (tiktoken_rs::p50k_base(), R50K_SPECIAL),
            "r50k_base" => (tiktoken_rs::r50k_base(), R50K_SPECIAL),
            other => {
                return Err(TokenizerError::UnknownModel {
                    name: other.to_string(),
                    reason: "no such encoding".to_string(),
                })
            }
        };
        let bpe = bpe.map_err(|e| TokenizerError::UnknownModel {
            name: encoding.to_string(),
            reason: e.to_string(),
        })?;
        Ok(Self { name: encoding.to_string(), bpe, special })
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl Tokenizer for BpeTokenizer {
    fn tokenize(&self, text: &str) -> Result<Vec<u32>, TokenizerError> {
        if let Some(tok) = self.special.iter().find(|s| text.contains(**s)) {
            return Err(TokenizerError::Rejected(format!("contains special token {tok}")));
        }
        Ok(self
            .bpe
            .encode_ordinary(text)
            .into_iter()
            .map(|t| t as u32)
            .collect())
    }
}

/// One token per `chars_per_token` characters, rounded up.
#[derive(Clone, Copy, Debug)]
pub struct CharTokenizer {
    chars_per_token: usize,
}

impl CharTokenizer {
    pub fn new(chars_per_token: usize) -> Self {
        Self { chars_per_token: chars_per_token.max(1) }
    }
}

impl Default for CharTokenizer {
    fn default() -> Self {
        Self::new(1)
    }
}

impl Tokenizer for CharTokenizer {
    fn tokenize(&self, text: &str) -> Result<Vec<u32>, TokenizerError> {
        let chars: Vec<char> = text.chars().collect();
        Ok(chars
            .chunks(self.chars_per_token)
            .map(|chunk| chunk[0] as u32)
            .collect())
    }

    fn count(&self, text: &str) -> Result<usize, TokenizerError> {
        Ok(text.chars().count().div_ceil(self.chars_per_token))
    }
}

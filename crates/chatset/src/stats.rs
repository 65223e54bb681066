//! Token statistics over a dataset.
//!
//! Per-exchange counts follow the chat-format accounting: a fixed overhead
//! per message, the tokens of every field, a bonus for `name`, and a fixed
//! reply-priming overhead per exchange.

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{ChatsetError, Result};
use crate::schema::{Exchange, Role};
use crate::tokenizer::Tokenizer;

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TokenCountConfig {
    pub tokens_per_message: usize,
    pub tokens_per_name: usize,
    pub reply_priming: usize,
}

impl Default for TokenCountConfig {
    fn default() -> Self {
        Self { tokens_per_message: 3, tokens_per_name: 1, reply_priming: 3 }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct StatsConfig {
    pub tokens: TokenCountConfig,
    /// Examples above this are truncated by the training service.
    pub max_tokens_per_example: usize,
}

impl Default for StatsConfig {
    fn default() -> Self {
        Self { tokens: TokenCountConfig::default(), max_tokens_per_example: 4096 }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Summary {
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub median: f64,
    pub p5: f64,
    pub p95: f64,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TokenStats {
    pub total_tokens: Vec<usize>,
    pub assistant_tokens: Vec<usize>,
    pub message_counts: Vec<usize>,
    pub total_summary: Summary,
    pub assistant_summary: Summary,
    pub messages_summary: Summary,
    pub max_tokens_per_example: usize,
    pub n_too_long: usize,
}

/// Total tokens the exchange costs as a chat prompt.
/// Errors carry exchange index 0; `compute_stats` rewrites it.
pub fn count_exchange_tokens<T: Tokenizer + ?Sized>(
    exchange: &Exchange,
    tok: &T,
    cfg: &TokenCountConfig,
) -> Result<usize> {
    let mut n = 0;
    for (j, m) in exchange.messages.iter().enumerate() {
        let count = |s: &str| {
            tok.count(s)
                .map_err(|source| ChatsetError::Tokenization { exchange: 0, message: j, source })
        };
        n += cfg.tokens_per_message;
        n += count(m.role.as_str())?;
        n += count(&m.content)?;
        if let Some(name) = &m.name {
            n += count(name)? + cfg.tokens_per_name;
        }
    }
    Ok(n + cfg.reply_priming)
}

/// Content tokens of assistant messages only, no overheads.
pub fn count_assistant_tokens<T: Tokenizer + ?Sized>(exchange: &Exchange, tok: &T) -> Result<usize> {
    let mut n = 0;
    for (j, m) in exchange.messages.iter().enumerate() {
        if m.role == Role::Assistant {
            n += tok
                .count(&m.content)
                .map_err(|source| ChatsetError::Tokenization { exchange: 0, message: j, source })?;
        }
    }
    Ok(n)
}

pub fn compute_stats<T: Tokenizer + ?Sized>(
    dataset: &[Exchange],
    tok: &T,
    cfg: &StatsConfig,
) -> Result<TokenStats> {
    if dataset.is_empty() {
        return Err(ChatsetError::EmptyDataset);
    }

    let mut total_tokens = Vec::with_capacity(dataset.len());
    let mut assistant_tokens = Vec::with_capacity(dataset.len());
    let mut message_counts = Vec::with_capacity(dataset.len());

    for (i, ex) in dataset.iter().enumerate() {
        total_tokens.push(count_exchange_tokens(ex, tok, &cfg.tokens).map_err(at_exchange(i))?);
        assistant_tokens.push(count_assistant_tokens(ex, tok).map_err(at_exchange(i))?);
        message_counts.push(ex.messages.len());
    }

    let n_too_long = count_too_long(&total_tokens, cfg.max_tokens_per_example);
    debug!(examples = dataset.len(), n_too_long, "token counts done");

    let stats = TokenStats {
        total_summary: summarize(&as_f64(&total_tokens))?,
        assistant_summary: summarize(&as_f64(&assistant_tokens))?,
        messages_summary: summarize(&as_f64(&message_counts))?,
        total_tokens,
        assistant_tokens,
        message_counts,
        max_tokens_per_example: cfg.max_tokens_per_example,
        n_too_long,
    };
    info!(
        examples = dataset.len(),
        mean_tokens = stats.total_summary.mean,
        max_tokens = stats.total_summary.max,
        "token stats"
    );
    Ok(stats)
}

/// Counts strictly above `threshold`.
pub fn count_too_long(counts: &[usize], threshold: usize) -> usize {
    counts.iter().filter(|&&c| c > threshold).count()
}

/// Percentiles use linear interpolation between closest ranks: position
/// `p * (n - 1)` in the sorted series. The median is the 50th percentile.
pub fn summarize(values: &[f64]) -> Result<Summary> {
    if values.is_empty() {
        return Err(ChatsetError::EmptySeries);
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));

    let n = sorted.len();
    Ok(Summary {
        min: sorted[0],
        max: sorted[n - 1],
        mean: sorted.iter().sum::<f64>() / n as f64,
        median: percentile(&sorted, 0.5),
        p5: percentile(&sorted, 0.05),
        p95: percentile(&sorted, 0.95),
    })
}

fn percentile(sorted: &[f64], p: f64) -> f64 {
    let pos = p * (sorted.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    sorted[lo] + (sorted[hi] - sorted[lo]) * (pos - lo as f64)
}

fn as_f64(v: &[usize]) -> Vec<f64> {
    v.iter().map(|&x| x as f64).collect()
}

fn at_exchange(i: usize) -> impl Fn(ChatsetError) -> ChatsetError {
    move |e| match e {
        ChatsetError::Tokenization { message, source, .. } => {
            ChatsetError::Tokenization { exchange: i, message, source }
        }
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::Message;
    use crate::tokenizer::{CharTokenizer, TokenizerError};

    struct RejectMarker;

    impl Tokenizer for RejectMarker {
        fn tokenize(&self, text: &str) -> std::result::Result<Vec<u32>, TokenizerError> {
            if text.contains("<bad>") {
                return Err(TokenizerError::Rejected(text.to_string()));
            }
            Ok(text.chars().map(|c| c as u32).collect())
        }
    }

    fn ex(parts: &[(Role, &str)]) -> Exchange {
        Exchange { messages: parts.iter().map(|(r, c)| Message::new(*r, *c)).collect() }
    }

    #[test]
    fn test_exchange_token_accounting() {
        // 1 char per token: roles "system"=6, "user"=4, "assistant"=9
        let e = ex(&[(Role::System, "ab"), (Role::User, "cde"), (Role::Assistant, "f")]);
        let tok = CharTokenizer::default();
        let cfg = TokenCountConfig::default();
        let expected = 3 * 3 + (6 + 2) + (4 + 3) + (9 + 1) + 3;
        assert_eq!(count_exchange_tokens(&e, &tok, &cfg).unwrap(), expected);
        assert_eq!(count_assistant_tokens(&e, &tok).unwrap(), 1);
    }

    #[test]
    fn test_name_adds_tokens() {
        let mut e = ex(&[(Role::User, "hi")]);
        let tok = CharTokenizer::default();
        let cfg = TokenCountConfig::default();
        let base = count_exchange_tokens(&e, &tok, &cfg).unwrap();
        e.messages[0].name = Some("bob".into());
        assert_eq!(count_exchange_tokens(&e, &tok, &cfg).unwrap(), base + 3 + 1);
    }

    #[test]
    fn test_empty_dataset_is_error() {
        let r = compute_stats(&[], &CharTokenizer::default(), &StatsConfig::default());
        assert!(matches!(r, Err(ChatsetError::EmptyDataset)));
    }

    #[test]
    fn test_tokenizer_failure_names_position() {
        let data = vec![
            ex(&[(Role::User, "fine")]),
            ex(&[(Role::System, "s"), (Role::User, "x <bad> y")]),
        ];
        match compute_stats(&data, &RejectMarker, &StatsConfig::default()) {
            Err(ChatsetError::Tokenization { exchange, message, .. }) => {
                assert_eq!((exchange, message), (1, 1));
            }
            other => panic!("expected Tokenization error, got {other:?}"),
        }
    }

    #[test]
    fn test_bpe_special_token_fails_whole_run() {
        let tok = crate::tokenizer::BpeTokenizer::from_encoding("cl100k_base").unwrap();
        let data = vec![
            ex(&[(Role::System, "s"), (Role::User, "fine")]),
            ex(&[(Role::System, "s"), (Role::User, "u"), (Role::Assistant, "done <|endoftext|>")]),
        ];
        match compute_stats(&data, &tok, &StatsConfig::default()) {
            Err(ChatsetError::Tokenization { exchange, message, source: TokenizerError::Rejected(_) }) => {
                assert_eq!((exchange, message), (1, 2));
            }
            other => panic!("expected Tokenization error, got {other:?}"),
        }
    }

    #[test]
    fn test_identical_values_summary() {
        let s = summarize(&[42.0; 7]).unwrap();
        for v in [s.min, s.max, s.mean, s.median, s.p5, s.p95] {
            assert_eq!(v, 42.0);
        }
    }

    #[test]
    fn test_interpolated_percentiles() {
        let values: Vec<f64> = (1..=11).map(|x| x as f64).collect();
        let s = summarize(&values).unwrap();
        assert_eq!(s.median, 6.0);
        assert!((s.p5 - 1.5).abs() < 1e-9);
        assert!((s.p95 - 10.5).abs() < 1e-9);
        assert_eq!(s.mean, 6.0);

        let s = summarize(&[4.0, 1.0]).unwrap();
        assert_eq!((s.min, s.max, s.median), (1.0, 4.0, 2.5));
    }

    #[test]
    fn test_empty_series() {
        assert!(matches!(summarize(&[]), Err(ChatsetError::EmptySeries)));
    }

    #[test]
    fn test_count_too_long() {
        assert_eq!(count_too_long(&[50, 5000, 4096, 4097], 4096), 2);
    }

    #[test]
    fn test_compute_stats_series() {
        let data = vec![
            ex(&[(Role::System, "s"), (Role::User, "u"), (Role::Assistant, "abc")]),
            ex(&[(Role::User, "uu"), (Role::Assistant, "a")]),
        ];
        let cfg = StatsConfig { max_tokens_per_example: 30, ..StatsConfig::default() };
        let stats = compute_stats(&data, &CharTokenizer::default(), &cfg).unwrap();
        assert_eq!(stats.message_counts, vec![3, 2]);
        assert_eq!(stats.assistant_tokens, vec![3, 1]);
        // 9 + 7 + 5 + 12 + 3 = 36 ; 6 + 6 + 10 + 3 = 25
        assert_eq!(stats.total_tokens, vec![36, 25]);
        assert_eq!(stats.n_too_long, 1);
        assert_eq!(stats.messages_summary.mean, 2.5);
    }
}

use serde::{Deserialize, Serialize};

use crate::error::{ChatsetError, Result};

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct EstimatorConfig {
    pub target_epochs: u64,
    pub min_target_examples: u64,
    pub max_target_examples: u64,
    pub min_default_epochs: u64,
    pub max_default_epochs: u64,
}

impl Default for EstimatorConfig {
    fn default() -> Self {
        Self {
            target_epochs: 3,
            min_target_examples: 100,
            max_target_examples: 25_000,
            min_default_epochs: 1,
            max_default_epochs: 25,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrainingEstimate {
    pub epochs: u64,
    pub billable_tokens: u64,
    pub total_billable_tokens: u64,
}

/// Epoch count the training service would pick for `n` examples.
pub fn choose_epochs(n: u64, cfg: &EstimatorConfig) -> Result<u64> {
    if n == 0 {
        return Err(ChatsetError::EmptyDataset);
    }
    let seen = n * cfg.target_epochs;
    let epochs = if seen < cfg.min_target_examples {
        cfg.max_default_epochs.min(cfg.min_target_examples / n)
    } else if seen > cfg.max_target_examples {
        cfg.min_default_epochs.max(cfg.max_target_examples / n)
    } else {
        cfg.target_epochs
    };
    Ok(epochs)
}

/// Tokens charged per epoch: each example is capped at `threshold`.
pub fn billable_tokens(counts: &[usize], threshold: usize) -> u64 {
    counts.iter().map(|&c| c.min(threshold) as u64).sum()
}

pub fn estimate_training(
    dataset_size: usize,
    counts: &[usize],
    threshold: usize,
    cfg: &EstimatorConfig,
) -> Result<TrainingEstimate> {
    let epochs = choose_epochs(dataset_size as u64, cfg)?;
    let billable = billable_tokens(counts, threshold);
    Ok(TrainingEstimate {
        epochs,
        billable_tokens: billable,
        total_billable_tokens: epochs * billable,
    })
}

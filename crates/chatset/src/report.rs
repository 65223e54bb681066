use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::Result;
use crate::estimate::{estimate_training, EstimatorConfig, TrainingEstimate};
use crate::jsonl::{dataset_hash, serialize_dataset};
use crate::schema::Exchange;
use crate::stats::{compute_stats, StatsConfig, TokenStats};
use crate::tokenizer::Tokenizer;
use crate::validate::{count_duplicates, validate_strict, IssueKind, StructuralIssue};

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct PreflightConfig {
    pub stats: StatsConfig,
    pub estimator: EstimatorConfig,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PreflightReport {
    pub examples: usize,
    /// BLAKE3 of the canonical JSONL serialization.
    pub fingerprint: String,
    pub issues: Vec<StructuralIssue>,
    pub n_missing_system: usize,
    pub n_missing_user: usize,
    pub n_duplicates: usize,
    pub stats: TokenStats,
    pub estimate: TrainingEstimate,
    pub generated_at: DateTime<Utc>,
}

impl PreflightReport {
    pub fn is_clean(&self) -> bool {
        self.issues.is_empty()
    }
}

/// Structure, token statistics and cost estimate in one pass.
/// Advisories (issues, duplicates, over-long examples) are logged, not returned as errors.
pub fn preflight<T: Tokenizer + ?Sized>(
    dataset: &[Exchange],
    tok: &T,
    cfg: &PreflightConfig,
) -> Result<PreflightReport> {
    let issues = validate_strict(dataset);
    let n_missing_system = issues.iter().filter(|i| i.kind == IssueKind::MissingSystem).count();
    let n_missing_user = issues.iter().filter(|i| i.kind == IssueKind::MissingUser).count();
    let n_duplicates = count_duplicates(dataset);

    let stats = compute_stats(dataset, tok, &cfg.stats)?;
    let estimate = estimate_training(
        dataset.len(),
        &stats.total_tokens,
        cfg.stats.max_tokens_per_example,
        &cfg.estimator,
    )?;
    let fingerprint = dataset_hash(&serialize_dataset(dataset)?);

    if issues.is_empty() {
        info!("No errors found");
    } else {
        for issue in &issues {
            warn!("{issue}");
        }
    }
    if n_duplicates > 0 {
        warn!(n_duplicates, "duplicate examples");
    }
    if stats.n_too_long > 0 {
        warn!(
            n_too_long = stats.n_too_long,
            limit = cfg.stats.max_tokens_per_example,
            "examples over the token limit will be truncated during fine-tuning"
        );
    }
    info!(
        epochs = estimate.epochs,
        billable_tokens = estimate.billable_tokens,
        total_billable_tokens = estimate.total_billable_tokens,
        "training estimate"
    );

    Ok(PreflightReport {
        examples: dataset.len(),
        fingerprint,
        issues,
        n_missing_system,
        n_missing_user,
        n_duplicates,
        stats,
        estimate,
        generated_at: Utc::now(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{Message, Role};
    use crate::tokenizer::CharTokenizer;

    #[test]
    fn test_preflight_counts() {
        let good = Exchange {
            messages: vec![
                Message::new(Role::System, "s"),
                Message::new(Role::User, "u"),
                Message::new(Role::Assistant, "{\"rating\": 1, \"Sentiment\": \"negative\"}\n"),
            ],
        };
        let bad = Exchange { messages: vec![Message::new(Role::Assistant, "x")] };
        let data = vec![good.clone(), good, bad];

        let report = preflight(&data, &CharTokenizer::default(), &PreflightConfig::default()).unwrap();
        assert_eq!(report.examples, 3);
        assert_eq!(report.n_missing_system, 1);
        assert_eq!(report.n_missing_user, 1);
        assert_eq!(report.n_duplicates, 1);
        assert!(!report.is_clean());
        // 3 examples * 3 epochs < 100 -> 100 / 3 = 33, capped at 25
        assert_eq!(report.estimate.epochs, 25);
        assert_eq!(
            report.estimate.total_billable_tokens,
            25 * report.stats.total_tokens.iter().sum::<usize>() as u64
        );
    }

    #[test]
    fn test_preflight_empty_dataset_fails() {
        assert!(preflight(&[], &CharTokenizer::default(), &PreflightConfig::default()).is_err());
    }
}

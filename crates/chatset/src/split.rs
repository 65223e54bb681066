use rand::{rngs::StdRng, seq::SliceRandom, SeedableRng};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{ChatsetError, Result};

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SplitConfig {
    /// Share of items held out for validation, in `[0, 1)`.
    pub validation_fraction: f64,
    /// Shuffle before splitting. `None` keeps input order.
    pub seed: Option<u64>,
}

impl Default for SplitConfig {
    fn default() -> Self {
        Self { validation_fraction: 0.2, seed: None }
    }
}

/// Split into `(train, validation)`. The validation side is the tail.
pub fn split_records<T>(mut items: Vec<T>, cfg: &SplitConfig) -> Result<(Vec<T>, Vec<T>)> {
    let frac = cfg.validation_fraction;
    if !(0.0..1.0).contains(&frac) {
        return Err(ChatsetError::InvalidConfig(format!(
            "validation_fraction must be in [0, 1), got {frac}"
        )));
    }

    if let Some(seed) = cfg.seed {
        items.shuffle(&mut StdRng::seed_from_u64(seed));
    }

    let n = items.len();
    let mut n_val = (n as f64 * frac).round() as usize;
    if frac > 0.0 && n >= 2 {
        // keep both sides non-empty
        n_val = n_val.clamp(1, n - 1);
    }
    n_val = n_val.min(n);

    let validation = items.split_off(n - n_val);
    debug!(train = items.len(), validation = validation.len(), "split");
    Ok((items, validation))
}

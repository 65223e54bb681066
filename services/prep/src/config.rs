use std::str::FromStr;

use anyhow::{bail, Context, Result};

#[derive(Clone, Debug)]
pub struct PrepConfig {
    pub system_prompt: Option<String>,
    pub model: String,
    pub max_tokens: usize,
    pub validation_fraction: f64,
    pub seed: Option<u64>,
}

impl PrepConfig {
    pub fn from_env() -> Result<Self> {
        let system_prompt = std::env::var("PREP_SYSTEM_PROMPT").ok();
        let model = std::env::var("PREP_MODEL").unwrap_or_else(|_| "gpt-3.5-turbo".to_string());
        let max_tokens = parse_or("PREP_MAX_TOKENS", 4096)?;
        let validation_fraction = parse_or("PREP_VALIDATION_FRACTION", 0.2)?;
        let seed = parse_opt("PREP_SEED")?;

        // Tiny sanity checks (fail fast, fail loud)
        if max_tokens == 0 {
            bail!("PREP_MAX_TOKENS must be > 0");
        }
        if !(0.0..1.0).contains(&validation_fraction) {
            bail!("PREP_VALIDATION_FRACTION must be in [0, 1)");
        }

        Ok(Self { system_prompt, model, max_tokens, validation_fraction, seed })
    }
}

fn parse_opt<T>(key: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match std::env::var(key) {
        Ok(v) => Ok(Some(v.trim().parse().with_context(|| format!("Invalid value for env var {key}: {v:?}"))?)),
        Err(_) => Ok(None),
    }
}

fn parse_or<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    Ok(parse_opt(key)?.unwrap_or(default))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_helpers() {
        std::env::set_var("PREP_TEST_PARSE_OK", " 17 ");
        std::env::set_var("PREP_TEST_PARSE_BAD", "seventeen");
        assert_eq!(parse_opt::<u64>("PREP_TEST_PARSE_OK").unwrap(), Some(17));
        assert!(parse_opt::<u64>("PREP_TEST_PARSE_BAD").is_err());
        assert_eq!(parse_or::<usize>("PREP_TEST_PARSE_UNSET", 4096).unwrap(), 4096);
    }
}

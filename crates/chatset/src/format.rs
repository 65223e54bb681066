use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::jsonl::to_spaced_string;
use crate::schema::{AssistantPayload, Dataset, Exchange, Message, Record, Role};

pub const DEFAULT_SYSTEM_PROMPT: &str =
    "Given a customer review, return its rating and sentiment as JSON.";
pub const DEFAULT_USER_PREFIX: &str = "Review: ";

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct FormatConfig {
    pub system_prompt: String,
    pub user_prefix: String,
}

impl Default for FormatConfig {
    fn default() -> Self {
        Self {
            system_prompt: DEFAULT_SYSTEM_PROMPT.to_string(),
            user_prefix: DEFAULT_USER_PREFIX.to_string(),
        }
    }
}

/// Build the system/user/assistant triple for one record.
///
/// The assistant content is `{"rating": <n>, "Sentiment": "<label>"}` plus a
/// trailing `\n` that is part of the content string itself.
pub fn format_exchange(record: &Record, cfg: &FormatConfig) -> Result<Exchange> {
    let payload = AssistantPayload {
        rating: record.label_a,
        sentiment: record.label_b.clone(),
    };
    let mut answer = to_spaced_string(&payload)?;
    answer.push('\n');

    Ok(Exchange {
        messages: vec![
            Message::new(Role::System, cfg.system_prompt.clone()),
            Message::new(Role::User, format!("{}{}", cfg.user_prefix, record.text)),
            Message::new(Role::Assistant, answer),
        ],
    })
}

pub fn format_dataset(records: &[Record], cfg: &FormatConfig) -> Result<Dataset> {
    records.iter().map(|r| format_exchange(r, cfg)).collect()
}

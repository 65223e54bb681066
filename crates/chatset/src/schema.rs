use serde::{Deserialize, Serialize};

/// One input row. `label_a` is the integer rating, `label_b` the sentiment label.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    pub text: String,
    pub label_a: i64,
    pub label_b: String,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::System => "system",
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl Message {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self { role, content: content.into(), name: None }
    }
}

/// One training example: one JSON object per JSONL line.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Exchange {
    pub messages: Vec<Message>,
}

impl Exchange {
    pub fn has_role(&self, role: Role) -> bool {
        self.messages.iter().any(|m| m.role == role)
    }
}

pub type Dataset = Vec<Exchange>;

/// Structured value carried in the assistant message content.
/// Field names are part of the output contract.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssistantPayload {
    pub rating: i64,
    #[serde(rename = "Sentiment")]
    pub sentiment: String,
}

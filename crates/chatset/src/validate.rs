use std::collections::HashSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::schema::{AssistantPayload, Exchange, Role};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum IssueKind {
    MissingSystem,
    MissingUser,
    MissingAssistant,
    MalformedAssistantPayload { message: usize },
    EmptyContent { message: usize },
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StructuralIssue {
    pub exchange: usize,
    #[serde(flatten)]
    pub kind: IssueKind,
}

impl fmt::Display for StructuralIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            IssueKind::MissingSystem => write!(f, "exchange {}: no system message", self.exchange),
            IssueKind::MissingUser => write!(f, "exchange {}: no user message", self.exchange),
            IssueKind::MissingAssistant => write!(f, "exchange {}: no assistant message", self.exchange),
            IssueKind::MalformedAssistantPayload { message } => write!(
                f,
                "exchange {}, message {message}: assistant content is not a rating/Sentiment object",
                self.exchange
            ),
            IssueKind::EmptyContent { message } => {
                write!(f, "exchange {}, message {message}: empty content", self.exchange)
            }
        }
    }
}

/// Report exchanges without a system or a user message. Empty = valid.
pub fn validate(dataset: &[Exchange]) -> Vec<StructuralIssue> {
    let mut issues = Vec::new();
    for (i, ex) in dataset.iter().enumerate() {
        check_required_roles(i, ex, &mut issues);
    }
    issues
}

/// `validate` plus assistant presence, assistant payload shape and empty content.
pub fn validate_strict(dataset: &[Exchange]) -> Vec<StructuralIssue> {
    let mut issues = Vec::new();
    for (i, ex) in dataset.iter().enumerate() {
        check_required_roles(i, ex, &mut issues);

        if !ex.has_role(Role::Assistant) {
            issues.push(StructuralIssue { exchange: i, kind: IssueKind::MissingAssistant });
        }

        for (j, m) in ex.messages.iter().enumerate() {
            if m.content.trim().is_empty() {
                issues.push(StructuralIssue { exchange: i, kind: IssueKind::EmptyContent { message: j } });
                continue;
            }
            if m.role == Role::Assistant {
                let body = m.content.strip_suffix('\n').unwrap_or(&m.content);
                if serde_json::from_str::<AssistantPayload>(body).is_err() {
                    issues.push(StructuralIssue {
                        exchange: i,
                        kind: IssueKind::MalformedAssistantPayload { message: j },
                    });
                }
            }
        }
    }
    issues
}

fn check_required_roles(i: usize, ex: &Exchange, issues: &mut Vec<StructuralIssue>) {
    if !ex.has_role(Role::System) {
        issues.push(StructuralIssue { exchange: i, kind: IssueKind::MissingSystem });
    }
    if !ex.has_role(Role::User) {
        issues.push(StructuralIssue { exchange: i, kind: IssueKind::MissingUser });
    }
}

/// Number of exchanges identical to an earlier one.
pub fn count_duplicates(dataset: &[Exchange]) -> usize {
    let mut seen = HashSet::<[u8; 32]>::new();
    let mut dupes = 0;
    for ex in dataset {
        let Ok(bytes) = serde_json::to_vec(ex) else { continue };
        let fp: [u8; 32] = blake3::hash(&bytes).into();
        if !seen.insert(fp) {
            dupes += 1;
        }
    }
    dupes
}

//! Intervention evaluation
//!
//! The engine's intervention descriptor has no structured rule id, so the
//! id is recovered from the log text with a fixed `[id "<digits>"]`
//! pattern. Everything that depends on that text format lives here.

use super::engine::Intervention;
use super::policy::IgnorePolicy;
use regex::Regex;
use std::sync::LazyLock;
use thiserror::Error;

/// Recorded in place of a rule id that could not be recovered
pub const UNKNOWN_RULE_ID: &str = "unknown";

static RULE_ID: LazyLock<Regex> = LazyLock::new(|| Regex::new(r#"\[id "(\d*)"\]"#).unwrap());

/// The log text did not identify a rule.
///
/// Never surfaced to callers: the intervention is still honoured and the
/// rule is recorded as [`UNKNOWN_RULE_ID`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InterventionLogError {
    /// The engine supplied no log text
    #[error("intervention carries no log text")]
    MissingLog,

    /// The log text has no `[id "..."]` token
    #[error("no rule id in intervention log: {0}")]
    MalformedInterventionLog(String),
}

/// Recover the rule id from an intervention log.
///
/// The first `[id "..."]` token wins.
pub fn extract_rule_id(log: &str) -> Result<&str, InterventionLogError> {
    if log.is_empty() {
        return Err(InterventionLogError::MissingLog);
    }

    RULE_ID
        .captures(log)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
        .ok_or_else(|| InterventionLogError::MalformedInterventionLog(truncate(log, 120)))
}

/// What a transaction should do about the engine's pending intervention
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InterventionOutcome {
    /// Nothing pending
    None,

    /// An intervention was pending but the transaction is bypassed
    Suppressed {
        /// Rule that fired
        rule_id: String,
    },

    /// The caller should block
    Block {
        /// Rule that fired, or [`UNKNOWN_RULE_ID`]
        rule_id: String,
        /// The engine's requested action
        intervention: Intervention,
    },
}

impl InterventionOutcome {
    /// Decide on a pending intervention.
    ///
    /// An ignored rule suppresses the intervention; so does any intervention
    /// once the transaction is already bypassed. An intervention whose rule
    /// cannot be identified can never be ignored.
    pub fn assess(pending: Option<Intervention>, policy: &IgnorePolicy, bypassed: bool) -> Self {
        let Some(intervention) = pending else {
            return Self::None;
        };

        let rule_id = match extract_rule_id(intervention.log_text()) {
            Ok(id) => Some(id.to_string()),
            Err(e) => {
                tracing::debug!("Unidentified intervention: {}", e);
                None
            },
        };

        match rule_id {
            Some(rule_id) if bypassed || policy.is_ignored(&rule_id) => {
                Self::Suppressed { rule_id }
            },
            None if bypassed => Self::Suppressed {
                rule_id: UNKNOWN_RULE_ID.to_string(),
            },
            rule_id => Self::Block {
                rule_id: rule_id.unwrap_or_else(|| UNKNOWN_RULE_ID.to_string()),
                intervention,
            },
        }
    }

    /// Whether the caller should block
    pub fn is_blocking(&self) -> bool {
        matches!(self, Self::Block { .. })
    }

    /// Rule that fired, if an intervention was pending
    pub fn rule_id(&self) -> Option<&str> {
        match self {
            Self::None => None,
            Self::Suppressed { rule_id } | Self::Block { rule_id, .. } => Some(rule_id),
        }
    }

    /// The engine's requested action, if blocking
    pub fn intervention(&self) -> Option<&Intervention> {
        match self {
            Self::Block { intervention, .. } => Some(intervention),
            _ => None,
        }
    }
}

fn truncate(s: &str, max_len: usize) -> String {
    if s.len() <= max_len {
        return s.to_string();
    }
    let mut end = max_len;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}...", &s[..end])
}

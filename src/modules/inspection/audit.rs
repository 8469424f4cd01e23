//! Audit log of finished transactions

use super::config::AuditConfig;
use super::engine::InspectionEngine;
use super::phase::Phase;
use super::transaction::Transaction;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::sync::RwLock;
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::warn;

/// Summary of one finished transaction
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditEntry {
    /// Timestamp (Unix epoch millis)
    pub timestamp: u64,

    /// Transaction id
    pub transaction_id: u64,

    /// Client endpoint
    pub remote_addr: String,

    /// Request line, if the URI phase ran
    pub request_line: Option<String>,

    /// Rules that blocked the transaction
    pub blocked_by: Vec<String>,

    /// Whether an ignored rule bypassed the transaction
    pub bypassed: bool,

    /// Whether the engine's logging phase ran
    pub logged: bool,

    /// Last phase the engine accepted
    pub last_phase: Option<Phase>,
}

impl AuditEntry {
    /// Snapshot a transaction
    pub fn from_transaction<E: InspectionEngine>(txn: &Transaction<E>) -> Self {
        let timestamp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| u64::try_from(d.as_millis()).unwrap_or(u64::MAX))
            .unwrap_or(0);

        Self {
            timestamp,
            transaction_id: txn.id(),
            remote_addr: txn.remote_addr().to_string(),
            request_line: txn.request_line().map(str::to_string),
            blocked_by: txn.blocked_by().to_vec(),
            bypassed: txn.is_bypassed(),
            logged: txn.was_logged(),
            last_phase: txn.last_phase(),
        }
    }

    /// Whether any rule blocked the transaction
    pub fn is_blocked(&self) -> bool {
        !self.blocked_by.is_empty()
    }
}

/// Bounded in-memory audit log
#[derive(Debug)]
pub struct AuditLog {
    config: AuditConfig,
    entries: RwLock<VecDeque<AuditEntry>>,
}

impl AuditLog {
    /// Create a new audit log
    pub fn new(config: AuditConfig) -> Self {
        Self {
            config,
            entries: RwLock::new(VecDeque::new()),
        }
    }

    /// Apply a new configuration, dropping the oldest entries if the log shrank
    pub fn reconfigure(&mut self, config: AuditConfig) {
        let entries = self.entries.get_mut().unwrap_or_else(|e| e.into_inner());
        while entries.len() > config.max_entries {
            entries.pop_front();
        }
        self.config = config;
    }

    /// Record an entry. Returns whether it was kept.
    ///
    /// Clean transactions are only kept when `include_clean` is set. A log
    /// with zero capacity keeps nothing.
    pub fn record(&self, entry: AuditEntry) -> bool {
        if !self.config.enabled || self.config.max_entries == 0 {
            return false;
        }
        if !self.config.include_clean && !entry.is_blocked() && !entry.bypassed {
            return false;
        }

        let Ok(mut entries) = self.entries.write() else {
            warn!("Audit log lock poisoned, dropping entry");
            return false;
        };

        while entries.len() >= self.config.max_entries {
            entries.pop_front();
        }
        entries.push_back(entry);
        true
    }

    /// Most recent entries, newest first
    pub fn recent(&self, count: usize) -> Vec<AuditEntry> {
        self.entries
            .read()
            .map(|entries| entries.iter().rev().take(count).cloned().collect())
            .unwrap_or_default()
    }

    /// Entries blocked by the given rule
    pub fn blocked_by_rule(&self, rule_id: &str) -> Vec<AuditEntry> {
        self.entries
            .read()
            .map(|entries| {
                entries
                    .iter()
                    .filter(|e| e.blocked_by.iter().any(|r| r == rule_id))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Render all entries as JSON lines, oldest first
    pub fn to_json_lines(&self) -> String {
        self.entries
            .read()
            .map(|entries| {
                entries
                    .iter()
                    .filter_map(|e| serde_json::to_string(e).ok())
                    .map(|line| line + "\n")
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Clear all entries
    pub fn clear(&self) {
        if let Ok(mut entries) = self.entries.write() {
            entries.clear();
        }
    }

    /// Entry count
    pub fn count(&self) -> usize {
        self.entries.read().map(|e| e.len()).unwrap_or(0)
    }
}

//! Ignore lists for rule interventions

use std::collections::HashSet;

/// Set of rule ids whose interventions bypass the transaction.
///
/// Parsed once from a space-delimited list. Tokens are split on single
/// spaces and compared exactly; there are no wildcards or ranges.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IgnorePolicy {
    source: String,
    rules: HashSet<String>,
}

impl IgnorePolicy {
    /// Parse a space-delimited list of rule ids
    pub fn parse(list: &str) -> Self {
        let rules = if list.is_empty() {
            HashSet::new()
        } else {
            list.split(' ').map(str::to_string).collect()
        };

        Self {
            source: list.to_string(),
            rules,
        }
    }

    /// Whether interventions from `rule_id` should be ignored
    pub fn is_ignored(&self, rule_id: &str) -> bool {
        self.rules.contains(rule_id)
    }

    /// Whether the policy ignores nothing
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Number of distinct tokens
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// The list as it was configured
    pub fn as_str(&self) -> &str {
        &self.source
    }
}

impl std::fmt::Display for IgnorePolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.source)
    }
}

/// One-off membership test against an unparsed ignore list.
///
/// An empty list never matches.
pub fn is_ignored(rule_id: &str, ignore_list: &str) -> bool {
    !ignore_list.is_empty() && ignore_list.split(' ').any(|rule| rule == rule_id)
}

//! Approved exceptions ("baseline") for known, accepted findings.
//!
//! Entries are keyed by rule id and a path glob. An optional fingerprint
//! narrows an entry to matches whose line contains that text, so an entry
//! survives unrelated edits that shift line numbers but stops applying when
//! the offending code changes.

use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::filter::Exception;
use crate::matcher::MatchResult;
use crate::rule::RuleDefinitionError;
use crate::target::ScanTarget;

/// One approved exception as written in configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BaselineEntry {
    /// Rule id the entry applies to.
    pub rule: String,
    /// Glob over root-relative paths.
    pub path: String,
    /// Text the offending line must contain.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fingerprint: Option<String>,
    /// Why the finding is accepted.
    #[serde(default)]
    pub justification: String,
}

#[derive(Debug, Clone)]
struct CompiledEntry {
    rule: String,
    path: glob::Pattern,
    fingerprint: Option<String>,
}

impl CompiledEntry {
    fn matches(&self, target: &ScanTarget, m: &MatchResult) -> bool {
        if !self.path.matches(&target.metadata().relative_str()) {
            return false;
        }
        match &self.fingerprint {
            None => true,
            Some(fp) => target.line(m.line).is_some_and(|line| line.contains(fp.as_str())),
        }
    }
}

/// Validated baseline.
#[derive(Debug, Clone, Default)]
pub struct Baseline {
    entries: Vec<CompiledEntry>,
}

impl Baseline {
    /// Validates and compiles entries.
    ///
    /// # Errors
    ///
    /// Returns [`RuleDefinitionError::MissingJustification`] for entries
    /// without a justification and [`RuleDefinitionError::InvalidGlob`] for
    /// malformed path globs.
    pub fn new(entries: &[BaselineEntry]) -> Result<Self, RuleDefinitionError> {
        let entries = entries
            .iter()
            .map(|entry| {
                if entry.justification.trim().is_empty() {
                    return Err(RuleDefinitionError::MissingJustification {
                        rule: entry.rule.clone(),
                        path: entry.path.clone(),
                    });
                }
                let path = glob::Pattern::new(&entry.path).map_err(|e| {
                    RuleDefinitionError::InvalidGlob {
                        pattern: entry.path.clone(),
                        message: e.to_string(),
                    }
                })?;
                Ok(CompiledEntry {
                    rule: entry.rule.clone(),
                    path,
                    fingerprint: entry.fingerprint.clone().filter(|fp| !fp.is_empty()),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { entries })
    }

    /// Number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the baseline is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Rule ids referenced by entries but rejected by `is_known`, in entry
    /// order without repeats.
    #[must_use]
    pub fn unknown_rules(&self, is_known: impl Fn(&str) -> bool) -> Vec<&str> {
        let mut unknown: Vec<&str> = Vec::new();
        for entry in &self.entries {
            if !is_known(&entry.rule) && !unknown.contains(&entry.rule.as_str()) {
                unknown.push(&entry.rule);
            }
        }
        unknown
    }

    /// Exception predicate holding the entries for one rule.
    ///
    /// Returns `None` if no entry refers to the rule.
    #[must_use]
    pub fn exception_for(&self, rule_id: &str) -> Option<BaselineException> {
        let entries: Vec<CompiledEntry> = self
            .entries
            .iter()
            .filter(|e| e.rule == rule_id)
            .cloned()
            .collect();
        (!entries.is_empty()).then_some(BaselineException { entries })
    }
}

/// Exception predicate built from baseline entries of a single rule.
#[derive(Debug, Clone)]
pub struct BaselineException {
    entries: Vec<CompiledEntry>,
}

impl Exception for BaselineException {
    fn suppresses(&self, target: &ScanTarget, rule_id: &str, m: &MatchResult) -> bool {
        let hit = self.entries.iter().any(|e| e.matches(target, m));
        if hit {
            trace!(rule_id, line = m.line, "suppressed by baseline");
        }
        hit
    }
}

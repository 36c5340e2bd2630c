//! Aggregation of findings into a report.

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::Serialize;

use crate::types::{Category, Finding, Severity};

/// Per-severity counts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SeverityCounts {
    /// Info findings.
    pub info: usize,
    /// Warning findings.
    pub warning: usize,
    /// Error findings.
    pub error: usize,
}

impl SeverityCounts {
    fn add(&mut self, severity: Severity) {
        match severity {
            Severity::Info => self.info += 1,
            Severity::Warning => self.warning += 1,
            Severity::Error => self.error += 1,
        }
    }

    /// Count for one severity.
    #[must_use]
    pub fn get(&self, severity: Severity) -> usize {
        match severity {
            Severity::Info => self.info,
            Severity::Warning => self.warning,
            Severity::Error => self.error,
        }
    }

    /// Sum over all severities.
    #[must_use]
    pub fn total(&self) -> usize {
        self.info + self.warning + self.error
    }

    /// Pass / warn / fail status derived from the counts.
    #[must_use]
    pub fn status(&self) -> Status {
        if self.error > 0 {
            Status::Fail
        } else if self.warning > 0 {
            Status::Warn
        } else {
            Status::Pass
        }
    }
}

/// Coarse health of a group of findings.
///
/// Informational only: the pass/fail decision for a run belongs to
/// [`decide`](crate::decide) and its policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    /// No warnings or errors.
    Pass,
    /// Warnings but no errors.
    Warn,
    /// At least one error.
    Fail,
}

impl std::fmt::Display for Status {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Pass => "pass",
            Self::Warn => "warn",
            Self::Fail => "fail",
        })
    }
}

/// Counts and status for one category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CategorySummary {
    /// Counts per severity.
    pub counts: SeverityCounts,
    /// Derived status.
    pub status: Status,
}

/// Counts for one rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RuleSummary {
    /// Category of the rule's findings.
    pub category: Category,
    /// Counts per severity.
    pub counts: SeverityCounts,
}

/// Findings plus derived counts for one run.
///
/// Built once by [`aggregate`] and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AggregateReport {
    findings: Vec<Finding>,
    files_scanned: usize,
    clean_files: usize,
    totals: SeverityCounts,
    by_category: BTreeMap<Category, CategorySummary>,
    by_file: BTreeMap<PathBuf, SeverityCounts>,
    by_rule: BTreeMap<String, RuleSummary>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    by_component: BTreeMap<String, SeverityCounts>,
    status: Status,
}

impl AggregateReport {
    /// All findings, in evaluation order.
    #[must_use]
    pub fn findings(&self) -> &[Finding] {
        &self.findings
    }

    /// Number of files evaluated.
    #[must_use]
    pub fn files_scanned(&self) -> usize {
        self.files_scanned
    }

    /// Number of evaluated files without findings.
    #[must_use]
    pub fn clean_files(&self) -> usize {
        self.clean_files
    }

    /// Totals per severity.
    #[must_use]
    pub fn totals(&self) -> SeverityCounts {
        self.totals
    }

    /// Summary per category. Every category is present, even when clean.
    #[must_use]
    pub fn by_category(&self) -> &BTreeMap<Category, CategorySummary> {
        &self.by_category
    }

    /// Counts per file, only for files with at least one finding.
    #[must_use]
    pub fn by_file(&self) -> &BTreeMap<PathBuf, SeverityCounts> {
        &self.by_file
    }

    /// Counts per rule id.
    #[must_use]
    pub fn by_rule(&self) -> &BTreeMap<String, RuleSummary> {
        &self.by_rule
    }

    /// Counts per component, for findings in component directories.
    #[must_use]
    pub fn by_component(&self) -> &BTreeMap<String, SeverityCounts> {
        &self.by_component
    }

    /// Overall status.
    #[must_use]
    pub fn status(&self) -> Status {
        self.status
    }

    /// Share of scanned files without findings, in percent.
    ///
    /// An empty scan counts as fully clean.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn pass_rate(&self) -> f64 {
        if self.files_scanned == 0 {
            return 100.0;
        }
        self.clean_files as f64 * 100.0 / self.files_scanned as f64
    }
}

/// Groups findings into a report.
///
/// Pure: the same inputs always produce an equal report.
#[must_use]
pub fn aggregate(findings: Vec<Finding>, files_scanned: usize) -> AggregateReport {
    let mut totals = SeverityCounts::default();
    let mut by_category: BTreeMap<Category, SeverityCounts> =
        Category::ALL.iter().map(|&c| (c, SeverityCounts::default())).collect();
    let mut by_file: BTreeMap<PathBuf, SeverityCounts> = BTreeMap::new();
    let mut by_rule: BTreeMap<String, RuleSummary> = BTreeMap::new();
    let mut by_component: BTreeMap<String, SeverityCounts> = BTreeMap::new();

    for finding in &findings {
        let severity = finding.severity();
        totals.add(severity);
        by_category
            .entry(finding.category())
            .or_default()
            .add(severity);
        by_file
            .entry(finding.location().file.clone())
            .or_default()
            .add(severity);
        by_rule
            .entry(finding.rule_id().to_string())
            .or_insert_with(|| RuleSummary {
                category: finding.category(),
                counts: SeverityCounts::default(),
            })
            .counts
            .add(severity);
        if let Some(component) = finding.component() {
            by_component
                .entry(component.to_string())
                .or_default()
                .add(severity);
        }
    }

    let clean_files = files_scanned.saturating_sub(by_file.len());
    let by_category = by_category
        .into_iter()
        .map(|(category, counts)| {
            (
                category,
                CategorySummary {
                    counts,
                    status: counts.status(),
                },
            )
        })
        .collect();

    AggregateReport {
        findings,
        files_scanned,
        clean_files,
        status: totals.status(),
        totals,
        by_category,
        by_file,
        by_rule,
        by_component,
    }
}

//! Outcome decider: maps a report and a policy to pass/fail and an exit code.

use serde::{Deserialize, Serialize};

use crate::aggregate::AggregateReport;
use crate::types::Severity;

/// Exit code for a passing run.
pub const EXIT_SUCCESS: i32 = 0;

/// Exit code for a run that violates the policy.
pub const EXIT_POLICY_FAILURE: i32 = 1;

/// Which severities fail a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Policy {
    /// Severities that fail the run when their count is nonzero.
    pub fail_on: Vec<Severity>,
    /// Additionally fail on warnings.
    pub strict: bool,
}

impl Default for Policy {
    fn default() -> Self {
        Self {
            fail_on: vec![Severity::Error],
            strict: false,
        }
    }
}

impl Policy {
    /// Policy failing on errors and warnings.
    #[must_use]
    pub fn strict() -> Self {
        Self {
            strict: true,
            ..Self::default()
        }
    }

    /// Policy failing on exactly the given severities.
    #[must_use]
    pub fn fail_on(severities: impl IntoIterator<Item = Severity>) -> Self {
        Self {
            fail_on: severities.into_iter().collect(),
            strict: false,
        }
    }

    /// Effective failing severities, highest first and deduplicated.
    #[must_use]
    pub fn failing_severities(&self) -> Vec<Severity> {
        let mut severities = self.fail_on.clone();
        if self.strict {
            severities.push(Severity::Warning);
        }
        severities.sort_unstable_by(|a, b| b.cmp(a));
        severities.dedup();
        severities
    }
}

/// Result of applying a policy to a report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Decision {
    /// Whether the run passed.
    pub passed: bool,
    /// Process exit code the caller should use.
    pub exit_code: i32,
    /// Severities that caused the failure, highest first.
    pub failing: Vec<Severity>,
}

/// Decides pass/fail for a report.
///
/// Pure: never exits the process. A failing decision is the expected
/// outcome of a policy violation, not an error.
#[must_use]
pub fn decide(report: &AggregateReport, policy: &Policy) -> Decision {
    let totals = report.totals();
    let failing: Vec<Severity> = policy
        .failing_severities()
        .into_iter()
        .filter(|&s| totals.get(s) > 0)
        .collect();
    let passed = failing.is_empty();

    Decision {
        passed,
        exit_code: if passed { EXIT_SUCCESS } else { EXIT_POLICY_FAILURE },
        failing,
    }
}

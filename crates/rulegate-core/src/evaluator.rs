//! Evaluator: runs every applicable rule over every scan target.

use std::any::Any;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use rayon::prelude::*;
use tracing::{debug, error, trace, warn};

use crate::matcher::{MatchContext, RuleExecutionError};
use crate::registry::RuleRegistry;
use crate::rule::Rule;
use crate::target::ScanTarget;
use crate::types::{Category, Finding, FindingOrigin, Location, Severity};

/// Rule id of findings emitted when a file exceeds its evaluation budget.
pub const TIMEOUT_RULE_ID: &str = "file-timeout";

/// Applies a registry to scan targets and collects findings.
///
/// Matcher failures and panics are contained per rule and per file: they
/// become error findings tagged with the failing rule's id, and evaluation
/// of other rules and files continues.
#[derive(Debug, Clone)]
pub struct Evaluator {
    parallel: bool,
    file_timeout: Option<Duration>,
}

impl Default for Evaluator {
    fn default() -> Self {
        Self::new()
    }
}

impl Evaluator {
    /// Creates an evaluator that runs files in parallel without a timeout.
    #[must_use]
    pub fn new() -> Self {
        Self {
            parallel: true,
            file_timeout: None,
        }
    }

    /// Enables or disables parallel evaluation across files.
    #[must_use]
    pub fn parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Sets a wall-clock budget per file.
    ///
    /// A file that exceeds it yields a single `file-timeout` finding instead
    /// of its rule findings. The worker is abandoned, not interrupted.
    #[must_use]
    pub fn with_file_timeout(mut self, timeout: Duration) -> Self {
        self.file_timeout = Some(timeout);
        self
    }

    /// Evaluates all targets.
    ///
    /// Findings are ordered by file path, then rule registration order, then
    /// line and column, independent of scheduling.
    #[must_use]
    pub fn evaluate(&self, targets: &[ScanTarget], registry: &Arc<RuleRegistry>) -> Vec<Finding> {
        debug!(
            files = targets.len(),
            rules = registry.len(),
            parallel = self.parallel,
            "evaluating"
        );

        let per_file: Vec<Vec<Finding>> = if self.parallel {
            targets
                .par_iter()
                .map(|target| self.evaluate_target(target, registry))
                .collect()
        } else {
            targets
                .iter()
                .map(|target| self.evaluate_target(target, registry))
                .collect()
        };

        let mut findings: Vec<Finding> = per_file.into_iter().flatten().collect();
        sort_findings(&mut findings, registry);
        findings
    }

    fn evaluate_target(&self, target: &ScanTarget, registry: &Arc<RuleRegistry>) -> Vec<Finding> {
        let Some(timeout) = self.file_timeout else {
            return evaluate_file(target, registry);
        };

        let (tx, rx) = mpsc::channel();
        let owned = target.clone();
        let shared = Arc::clone(registry);
        let spawned = thread::Builder::new()
            .name("rulegate-file".to_string())
            .spawn(move || {
                // The receiver is gone once the budget is exceeded.
                let _ = tx.send(evaluate_file(&owned, &shared));
            });

        if let Err(e) = spawned {
            warn!(file = %target.relative_path().display(), "cannot spawn worker, evaluating inline: {e}");
            return evaluate_file(target, registry);
        }

        match rx.recv_timeout(timeout) {
            Ok(findings) => findings,
            Err(RecvTimeoutError::Timeout) => {
                warn!(
                    file = %target.relative_path().display(),
                    timeout_ms = timeout.as_millis(),
                    "file evaluation timed out"
                );
                vec![timeout_finding(target, timeout)]
            }
            Err(RecvTimeoutError::Disconnected) => {
                error!(file = %target.relative_path().display(), "file worker exited without results");
                vec![Finding::new(
                    TIMEOUT_RULE_ID,
                    Category::Performance,
                    Severity::Error,
                    Location::new(target.relative_path(), 0),
                    "evaluation worker exited without producing results",
                )
                .with_origin(FindingOrigin::RuleFailure)]
            }
        }
    }
}

/// Runs every applicable rule on one target.
fn evaluate_file(target: &ScanTarget, registry: &RuleRegistry) -> Vec<Finding> {
    let cx = MatchContext::new(target);
    let mut findings = Vec::new();

    for rule in registry.iter() {
        match catch_unwind(AssertUnwindSafe(|| run_rule(rule, &cx))) {
            Ok(Ok(mut kept)) => findings.append(&mut kept),
            Ok(Err(e)) => findings.push(rule_failure(rule, target, &e)),
            Err(payload) => {
                let e = RuleExecutionError::Panicked(extract_panic_message(&*payload));
                findings.push(rule_failure(rule, target, &e));
            }
        }
    }

    findings
}

fn run_rule(rule: &Rule, cx: &MatchContext<'_>) -> Result<Vec<Finding>, RuleExecutionError> {
    let target = cx.target();
    if !rule.applies_to(target) {
        trace!(rule_id = rule.id(), file = %target.relative_path().display(), "not applicable");
        return Ok(Vec::new());
    }

    let matches = rule.find(cx)?;
    let mut kept = Vec::with_capacity(matches.len());
    for m in matches {
        if rule.is_suppressed(target, &m) {
            trace!(rule_id = rule.id(), line = m.line, "suppressed by exception");
            continue;
        }
        kept.push(rule.to_finding(target, &m));
    }
    Ok(kept)
}

fn rule_failure(rule: &Rule, target: &ScanTarget, e: &RuleExecutionError) -> Finding {
    warn!(
        rule_id = rule.id(),
        file = %target.relative_path().display(),
        "rule failed: {e}"
    );
    Finding::new(
        rule.id(),
        rule.category(),
        Severity::Error,
        Location::new(target.relative_path(), 0),
        format!("rule `{}` failed: {e}", rule.id()),
    )
    .with_component(target.metadata().component.clone())
    .with_origin(FindingOrigin::RuleFailure)
}

fn timeout_finding(target: &ScanTarget, timeout: Duration) -> Finding {
    Finding::new(
        TIMEOUT_RULE_ID,
        Category::Performance,
        Severity::Error,
        Location::new(target.relative_path(), 0),
        format!("evaluation exceeded {}ms", timeout.as_millis()),
    )
    .with_help("raise scanner.file_timeout_ms or exclude the file")
    .with_component(target.metadata().component.clone())
    .with_origin(FindingOrigin::Timeout)
}

/// Extracts a readable message from a panic payload.
fn extract_panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

/// Sorts by file, rule registration order, line, column. Stable, so
/// findings of one rule on one line keep matcher order.
fn sort_findings(findings: &mut [Finding], registry: &RuleRegistry) {
    findings.sort_by_cached_key(|f| {
        let location = f.location();
        (
            location.file.clone(),
            registry.position(f.rule_id()).unwrap_or(usize::MAX),
            location.line,
            location.column.unwrap_or(0),
        )
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::LineContains;
    use crate::matcher::{MatchResult, TextPattern};
    use std::path::Path;

    fn target(path: &str, content: &str) -> ScanTarget {
        ScanTarget::new(path, content, Path::new(""))
    }

    fn console_rule() -> Rule {
        Rule::builder("no-console-log")
            .category(Category::Behavior)
            .matcher(TextPattern::literal("console.log("))
            .exception(LineContains::new("// allowed"))
            .build()
            .unwrap()
    }

    fn registry(rules: Vec<Rule>) -> Arc<RuleRegistry> {
        Arc::new(RuleRegistry::from_rules(rules).unwrap())
    }

    #[test]
    fn findings_are_sorted_by_file_rule_then_line() {
        let debugger = Rule::builder("no-debugger")
            .matcher(TextPattern::literal("debugger"))
            .build()
            .unwrap();
        let reg = registry(vec![console_rule(), debugger]);
        let targets = vec![
            target("b.ts", "debugger;\nconsole.log(1);"),
            target("a.ts", "console.log(1);\n\ndebugger;\nconsole.log(2);"),
        ];

        let findings = Evaluator::new().evaluate(&targets, &reg);
        let keys: Vec<(String, &str, usize)> = findings
            .iter()
            .map(|f| {
                (
                    f.location().file.display().to_string(),
                    f.rule_id(),
                    f.location().line,
                )
            })
            .collect();

        assert_eq!(
            keys,
            [
                ("a.ts".to_string(), "no-console-log", 1),
                ("a.ts".to_string(), "no-console-log", 4),
                ("a.ts".to_string(), "no-debugger", 3),
                ("b.ts".to_string(), "no-console-log", 2),
                ("b.ts".to_string(), "no-debugger", 1),
            ]
        );
    }

    #[test]
    fn exceptions_drop_matches() {
        let reg = registry(vec![console_rule()]);
        let targets = vec![target("a.ts", "console.log(1); // allowed\nconsole.log(2);")];
        let findings = Evaluator::new().evaluate(&targets, &reg);
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].location().line, 2);
    }

    #[test]
    fn failing_matcher_is_isolated() {
        let broken = Rule::builder("broken")
            .matcher(|_cx: &MatchContext<'_>| -> Result<Vec<MatchResult>, RuleExecutionError> {
                Err(RuleExecutionError::failed("boom"))
            })
            .build()
            .unwrap();
        let reg = registry(vec![broken, console_rule()]);
        let targets = vec![target("a.ts", "console.log(1);"), target("b.ts", "console.log(2);")];

        let findings = Evaluator::new().evaluate(&targets, &reg);
        let failures: Vec<_> = findings
            .iter()
            .filter(|f| f.origin() == FindingOrigin::RuleFailure)
            .collect();
        assert_eq!(failures.len(), 2);
        assert!(failures.iter().all(|f| f.rule_id() == "broken"));
        assert!(failures.iter().all(|f| f.severity() == Severity::Error));
        assert_eq!(
            findings
                .iter()
                .filter(|f| f.rule_id() == "no-console-log")
                .count(),
            2
        );
    }

    #[test]
    fn panicking_matcher_is_isolated() {
        let panicking = Rule::builder("panics")
            .matcher(|cx: &MatchContext<'_>| -> Result<Vec<MatchResult>, RuleExecutionError> {
                if cx.path() == Path::new("bad.ts") {
                    panic!("matcher exploded");
                }
                Ok(Vec::new())
            })
            .build()
            .unwrap();
        let reg = registry(vec![panicking, console_rule()]);
        let targets = vec![target("bad.ts", "console.log(1);"), target("good.ts", "console.log(2);")];

        let findings = Evaluator::new().parallel(false).evaluate(&targets, &reg);
        assert_eq!(findings.len(), 3);
        assert_eq!(findings[0].rule_id(), "panics");
        assert!(findings[0].message().contains("matcher exploded"));
        assert_eq!(findings[1].rule_id(), "no-console-log");
        assert_eq!(findings[2].location().file, Path::new("good.ts"));
    }

    #[test]
    fn evaluation_is_deterministic() {
        let reg = registry(vec![console_rule()]);
        let targets: Vec<ScanTarget> = (0..32)
            .map(|i| target(&format!("f{i:02}.ts"), "console.log(1);\nconsole.log(2);"))
            .collect();
        let first = Evaluator::new().evaluate(&targets, &reg);
        let second = Evaluator::new().evaluate(&targets, &reg);
        let sequential = Evaluator::new().parallel(false).evaluate(&targets, &reg);
        assert_eq!(first, second);
        assert_eq!(first, sequential);
        assert_eq!(first.len(), 64);
    }

    #[test]
    fn slow_file_yields_timeout_finding() {
        let slow = Rule::builder("slow")
            .matcher(|cx: &MatchContext<'_>| -> Result<Vec<MatchResult>, RuleExecutionError> {
                if cx.path() == Path::new("slow.ts") {
                    thread::sleep(Duration::from_millis(1500));
                }
                Ok(vec![MatchResult::new(1)])
            })
            .build()
            .unwrap();
        let reg = registry(vec![slow]);
        let targets = vec![target("fast.ts", "x"), target("slow.ts", "x")];

        let findings = Evaluator::new()
            .with_file_timeout(Duration::from_millis(200))
            .evaluate(&targets, &reg);

        assert_eq!(findings.len(), 2);
        assert_eq!(findings[0].rule_id(), "slow");
        assert_eq!(findings[1].rule_id(), TIMEOUT_RULE_ID);
        assert_eq!(findings[1].origin(), FindingOrigin::Timeout);
        assert_eq!(findings[1].severity(), Severity::Error);
    }

    #[test]
    fn panic_payloads_are_readable() {
        let owned: Box<dyn Any + Send> = Box::new(String::from("owned"));
        let borrowed: Box<dyn Any + Send> = Box::new("static");
        let other: Box<dyn Any + Send> = Box::new(7_u8);
        assert_eq!(extract_panic_message(&*owned), "owned");
        assert_eq!(extract_panic_message(&*borrowed), "static");
        assert_eq!(extract_panic_message(&*other), "unknown panic");
    }
}

//! Integration test: scanner → evaluator → aggregate → decide on disk.

use std::fs;
use std::path::Path;
use std::sync::Arc;

use rulegate_core::{
    aggregate, decide, Category, Evaluator, FindingOrigin, LineContains, MatchContext, MatchResult,
    Policy, Rule, RuleDefinitionError, RuleExecutionError, RuleRegistry, ScanInput, Scanner,
    Severity, SkipReason, TextPattern,
};
use tempfile::TempDir;

const COMPONENT: &str = "\
import { LitElement } from 'lit';

console.log('connected');

export class UsaBanner extends LitElement {
  connectedCallback() {
    super.connectedCallback();
  }
}
console.log('rendered'); // allowed
";

fn console_rule(with_exception: bool) -> Rule {
    let builder = Rule::builder("no-console-log")
        .category(Category::Behavior)
        .severity(Severity::Error)
        .message("`console.log` left in {file}")
        .matcher(TextPattern::literal("console.log("));
    let builder = if with_exception {
        builder.exception(LineContains::new("// allowed"))
    } else {
        builder
    };
    builder.build().unwrap()
}

fn workspace() -> TempDir {
    let tmp = TempDir::new().unwrap();
    let dir = tmp.path().join("src/components/usa-banner");
    fs::create_dir_all(&dir).unwrap();
    fs::write(dir.join("usa-banner.ts"), COMPONENT).unwrap();
    fs::write(dir.join("index.ts"), "export * from './usa-banner.js';\n").unwrap();
    tmp
}

fn run(tmp: &TempDir, rules: Vec<Rule>, input: &ScanInput) -> Vec<rulegate_core::Finding> {
    let scan = Scanner::new(tmp.path()).scan(input).unwrap();
    let registry = Arc::new(RuleRegistry::from_rules(rules).unwrap());
    Evaluator::new().evaluate(&scan.targets, &registry)
}

#[test]
fn two_occurrences_yield_two_findings_ordered_by_line() {
    let tmp = workspace();
    let findings = run(
        &tmp,
        vec![console_rule(false)],
        &ScanInput::patterns(["src/**/*.ts"]),
    );

    assert_eq!(findings.len(), 2);
    assert_eq!(findings[0].location().line, 3);
    assert_eq!(findings[1].location().line, 10);
    assert!(findings.iter().all(|f| f.rule_id() == "no-console-log"));
    assert_eq!(
        findings[0].message(),
        "`console.log` left in src/components/usa-banner/usa-banner.ts"
    );
}

#[test]
fn line_exception_suppresses_only_that_line() {
    let tmp = workspace();
    let findings = run(
        &tmp,
        vec![console_rule(true)],
        &ScanInput::patterns(["src/**/*.ts"]),
    );

    assert_eq!(findings.len(), 1);
    assert_eq!(findings[0].location().line, 3);
}

#[test]
fn missing_explicit_file_is_dropped() {
    let tmp = workspace();
    let scan = Scanner::new(tmp.path())
        .scan(&ScanInput::paths([
            "src/components/usa-banner/usa-banner.ts",
            "src/components/usa-banner/removed.ts",
            "src/components/usa-banner/index.ts",
        ]))
        .unwrap();

    assert_eq!(scan.targets.len(), 2);
    assert_eq!(scan.skipped.len(), 1);
    assert_eq!(scan.skipped[0].reason, SkipReason::Missing);
}

#[test]
fn duplicate_registration_fails_before_scan() {
    let mut registry = RuleRegistry::new();
    registry.register(console_rule(false)).unwrap();
    let err = registry.register(console_rule(true)).unwrap_err();
    assert_eq!(
        err,
        RuleDefinitionError::DuplicateRuleId {
            id: "no-console-log".to_string()
        }
    );
    assert!(err.to_string().contains("no-console-log"));
}

#[test]
fn empty_resolution_passes() {
    let tmp = workspace();
    let findings = run(
        &tmp,
        vec![console_rule(false)],
        &ScanInput::patterns(["**/*.scss"]),
    );
    let report = aggregate(findings, 0);
    assert!(decide(&report, &Policy::default()).passed);
}

#[test]
fn failing_rule_does_not_hide_other_findings() {
    let tmp = workspace();
    let broken = Rule::builder("broken-ast")
        .matcher(
            |cx: &MatchContext<'_>| -> Result<Vec<MatchResult>, RuleExecutionError> {
                cx.syntax()?;
                Ok(Vec::new())
            },
        )
        .build()
        .unwrap();
    let findings = run(
        &tmp,
        vec![broken, console_rule(false)],
        &ScanInput::patterns(["src/**/*.ts"]),
    );

    let failures: Vec<_> = findings
        .iter()
        .filter(|f| f.origin() == FindingOrigin::RuleFailure)
        .collect();
    assert_eq!(failures.len(), 2, "TypeScript sources do not parse as Rust");
    assert!(failures.iter().all(|f| f.rule_id() == "broken-ast"));
    assert!(failures.iter().all(|f| f.location().line == 0));
    assert_eq!(
        findings
            .iter()
            .filter(|f| f.rule_id() == "no-console-log")
            .count(),
        2
    );
}

#[test]
fn repeated_runs_are_identical() {
    let tmp = workspace();
    let input = ScanInput::paths(["src"]);
    let first = run(&tmp, vec![console_rule(true)], &input);
    let second = run(&tmp, vec![console_rule(true)], &input);
    assert_eq!(first, second);

    let a = aggregate(first.clone(), 2);
    let b = aggregate(first, 2);
    assert_eq!(a, b);
}

#[test]
fn policies_decide_on_counts() {
    let tmp = workspace();
    let warn_rule = Rule::builder("prefer-exports")
        .severity(Severity::Warning)
        .matcher(TextPattern::literal("export *"))
        .build()
        .unwrap();
    let findings = run(&tmp, vec![warn_rule], &ScanInput::paths(["src"]));
    let report = aggregate(findings, 2);

    assert_eq!(report.totals().warning, 1);
    assert!(decide(&report, &Policy::default()).passed);
    assert!(!decide(&report, &Policy::fail_on([Severity::Error, Severity::Warning])).passed);
    assert!(!decide(&report, &Policy::strict()).passed);
}

#[test]
fn report_serializes_to_json() {
    let tmp = workspace();
    let findings = run(
        &tmp,
        vec![console_rule(true)],
        &ScanInput::patterns(["src/**/*.ts"]),
    );
    let report = aggregate(findings, 2);
    let json = serde_json::to_value(&report).unwrap();

    assert_eq!(json["totals"]["error"], 1);
    assert_eq!(json["status"], "fail");
    assert_eq!(json["findings"][0]["rule_id"], "no-console-log");
    assert_eq!(json["by_category"]["behavior"]["counts"]["error"], 1);
    assert!(Path::new(json["findings"][0]["location"]["file"].as_str().unwrap())
        .ends_with("usa-banner.ts"));
}

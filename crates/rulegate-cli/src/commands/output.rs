//! Rendering of run outcomes.

use std::fmt::Write as _;
use std::io::IsTerminal;

use anyhow::Result;
use rulegate_core::{Finding, RunOutcome, ScanSkip, Severity, SkipReason, Status};

use crate::OutputFormat;

/// Prints a run outcome to stdout in the specified format.
pub fn print(outcome: &RunOutcome, format: OutputFormat) -> Result<()> {
    let rendered = match format {
        OutputFormat::Text => render_text(outcome, Palette::detect()),
        OutputFormat::Json => serde_json::to_string_pretty(outcome)? + "\n",
        OutputFormat::Compact => render_compact(outcome),
    };
    print!("{rendered}");
    Ok(())
}

/// ANSI colors, or none when stdout is not a terminal.
#[derive(Debug, Clone, Copy)]
struct Palette {
    enabled: bool,
}

impl Palette {
    const PLAIN: Self = Self { enabled: false };

    fn detect() -> Self {
        Self {
            enabled: std::io::stdout().is_terminal() && std::env::var_os("NO_COLOR").is_none(),
        }
    }

    fn paint(self, code: &str, text: &str) -> String {
        if self.enabled {
            format!("\x1b[{code}m{text}\x1b[0m")
        } else {
            text.to_string()
        }
    }

    fn severity(self, severity: Severity) -> String {
        let code = match severity {
            Severity::Error => "31",
            Severity::Warning => "33",
            Severity::Info => "34",
        };
        self.paint(code, severity.as_str())
    }

    fn status(self, status: Status, text: &str) -> String {
        let code = match status {
            Status::Fail => "31",
            Status::Warn => "33",
            Status::Pass => "32",
        };
        self.paint(code, text)
    }
}

fn location(finding: &Finding) -> String {
    let loc = finding.location();
    if loc.line == 0 {
        loc.file.display().to_string()
    } else {
        loc.to_string()
    }
}

fn render_text(outcome: &RunOutcome, palette: Palette) -> String {
    let report = &outcome.report;
    let mut out = String::new();

    for finding in report.findings() {
        let _ = writeln!(out, "{} at {}", finding.rule_id(), location(finding));
        let _ = writeln!(
            out,
            "  {}: {}",
            palette.severity(finding.severity()),
            finding.message()
        );
        if let Some(help) = finding.help() {
            let _ = writeln!(out, "  = help: {help}");
        }
        out.push('\n');
    }

    // Non-text files (assets) stay in the JSON report only.
    let skipped: Vec<&ScanSkip> = outcome
        .skipped
        .iter()
        .filter(|skip| skip.reason != SkipReason::NotText)
        .collect();
    if !skipped.is_empty() {
        let _ = writeln!(out, "Skipped {} path(s):", skipped.len());
        for skip in skipped {
            let _ = writeln!(out, "  {}", skip.path.display());
        }
        out.push('\n');
    }

    let flagged: Vec<String> = report
        .by_category()
        .iter()
        .filter(|(_, summary)| summary.counts.total() > 0)
        .map(|(category, summary)| format!("{category}: {}", summary.status))
        .collect();
    if !flagged.is_empty() {
        let _ = writeln!(out, "Categories: {}", flagged.join(", "));
    }

    let totals = report.totals();
    let _ = writeln!(
        out,
        "{}",
        palette.status(
            report.status(),
            &format!(
                "Found {} error(s), {} warning(s), {} info(s) in {} file(s) ({:.1}% clean)",
                totals.error,
                totals.warning,
                totals.info,
                report.files_scanned(),
                report.pass_rate()
            )
        )
    );

    let decision = &outcome.decision;
    let verdict = if decision.passed {
        palette.status(Status::Pass, "PASSED")
    } else {
        let failing: Vec<&str> = decision.failing.iter().map(|s| s.as_str()).collect();
        palette.status(
            Status::Fail,
            &format!("FAILED (fail on: {})", failing.join(", ")),
        )
    };
    let _ = writeln!(out, "{verdict}");
    out
}

fn render_compact(outcome: &RunOutcome) -> String {
    let mut out = String::new();
    for finding in outcome.report.findings() {
        let _ = writeln!(out, "{finding}");
    }
    out
}

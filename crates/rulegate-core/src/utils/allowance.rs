//! Comment-based allowance directives.
//!
//! Supports directives like:
//! ```text
//! // rulegate: allow(no-console-log) reason="debug helper for storybook"
//! /* rulegate: allow(img-requires-alt, no-custom-styles) */
//! # rulegate: allow(all)
//! ```
//!
//! A directive applies to its own line and to the line directly below it.

use std::collections::HashSet;

use crate::filter::Exception;
use crate::matcher::MatchResult;
use crate::target::ScanTarget;

/// Result of checking for an allow directive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AllowCheck {
    /// Rule is not allowed.
    Denied,
    /// Rule is allowed with optional reason.
    Allowed {
        /// The reason provided (if any).
        reason: Option<String>,
    },
}

impl AllowCheck {
    /// Returns true if allowed.
    #[must_use]
    pub fn is_allowed(&self) -> bool {
        matches!(self, Self::Allowed { .. })
    }

    /// Returns the reason if allowed.
    #[must_use]
    pub fn reason(&self) -> Option<&str> {
        match self {
            Self::Allowed { reason } => reason.as_deref(),
            Self::Denied => None,
        }
    }
}

/// Parsed allowance directive.
#[derive(Debug, Clone)]
pub struct AllowDirective {
    /// Rule ids that are allowed (`all` allows every rule).
    pub rules: HashSet<String>,
    /// Optional reason for the allowance.
    pub reason: Option<String>,
}

/// Checks a target for an allow directive covering `line` and `rule_id`.
///
/// Looks at the line itself and the line before.
#[must_use]
pub fn check_allow_with_reason(target: &ScanTarget, line: usize, rule_id: &str) -> AllowCheck {
    for check_line in [line.saturating_sub(1), line] {
        let Some(text) = target.line(check_line) else {
            continue;
        };

        if let Some(directive) = parse_allow_directive(text) {
            if directive.rules.contains(rule_id) || directive.rules.contains("all") {
                return AllowCheck::Allowed {
                    reason: directive.reason,
                };
            }
        }
    }

    AllowCheck::Denied
}

/// Parses an allowance directive from a comment anywhere on a line.
pub fn parse_allow_directive(line: &str) -> Option<AllowDirective> {
    let start = line.find("rulegate:")?;
    let before = line[..start].trim_end();
    let opens_comment = ["//", "/*", "#", "<!--", "{/*"]
        .iter()
        .any(|marker| before.ends_with(marker));
    if !opens_comment {
        return None;
    }

    let directive = line[start + "rulegate:".len()..].trim();
    let allow_content = directive.strip_prefix("allow(")?.trim();

    let paren_end = allow_content.find(')')?;
    let rules: HashSet<String> = allow_content[..paren_end]
        .split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect();

    if rules.is_empty() {
        return None;
    }

    let rest = allow_content[paren_end + 1..].trim();
    let reason = rest.strip_prefix("reason=").and_then(|reason_part| {
        let quoted = reason_part.trim().strip_prefix('"')?;
        let end = quoted.find('"')?;
        Some(quoted[..end].to_string())
    });

    Some(AllowDirective { rules, reason })
}

/// Exception honoring inline `rulegate: allow(...)` directives.
///
/// With `require_reason`, a directive without `reason="..."` does not
/// suppress the match.
#[derive(Debug, Clone, Copy, Default)]
pub struct InlineAllow {
    require_reason: bool,
}

impl InlineAllow {
    /// Creates an exception that accepts directives with or without a reason.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Requires a reason for the directive to take effect.
    #[must_use]
    pub fn require_reason(mut self, require: bool) -> Self {
        self.require_reason = require;
        self
    }
}

impl Exception for InlineAllow {
    fn suppresses(&self, target: &ScanTarget, rule_id: &str, m: &MatchResult) -> bool {
        let check = check_allow_with_reason(target, m.line, rule_id);
        if !check.is_allowed() {
            return false;
        }
        if self.require_reason && check.reason().is_none() {
            tracing::debug!(
                rule_id,
                file = %target.relative_path().display(),
                line = m.line,
                "allow directive ignored: missing reason"
            );
            return false;
        }
        true
    }
}

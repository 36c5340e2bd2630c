//! Rule definitions.
//!
//! A [`Rule`] bundles a matcher with its identity, category, severity,
//! message template, applicability filters and exception predicates. Rules
//! are built once through [`RuleBuilder`] and are read-only afterwards.
//!
//! # Example
//!
//! ```
//! use rulegate_core::{Category, LineContains, Rule, Severity, TextPattern};
//!
//! let rule = Rule::builder("no-console-log")
//!     .category(Category::Behavior)
//!     .severity(Severity::Error)
//!     .message("`{match}` left in component code")
//!     .matcher(TextPattern::literal("console.log("))
//!     .exception(LineContains::new("// allowed"))
//!     .build()?;
//! assert_eq!(rule.id(), "no-console-log");
//! # Ok::<(), rulegate_core::RuleDefinitionError>(())
//! ```

use crate::filter::{Applicability, Exception};
use crate::matcher::{MatchContext, MatchResult, Matcher, RuleExecutionError};
use crate::target::ScanTarget;
use crate::types::{Category, Finding, Location, Severity};
use crate::utils::allowance::InlineAllow;

/// Structural problem with a rule definition, raised before scanning.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error, miette::Diagnostic)]
pub enum RuleDefinitionError {
    /// Two rules share the same id.
    #[error("duplicate rule id `{id}`")]
    #[diagnostic(
        code(rulegate::duplicate_rule_id),
        help("rule ids must be unique; rename or remove one of the definitions")
    )]
    DuplicateRuleId {
        /// The conflicting id.
        id: String,
    },

    /// A rule was defined without an id.
    #[error("rule id must not be empty")]
    #[diagnostic(code(rulegate::empty_rule_id))]
    EmptyId,

    /// A rule was defined without a matcher.
    #[error("rule `{id}` has no matcher")]
    #[diagnostic(
        code(rulegate::missing_matcher),
        help("every rule needs a text pattern, an AST check or a custom matcher")
    )]
    MissingMatcher {
        /// Id of the incomplete rule.
        id: String,
    },

    /// A rule's pattern failed to compile or is ambiguous.
    #[error("rule `{id}` has an invalid pattern: {message}")]
    #[diagnostic(code(rulegate::invalid_pattern))]
    InvalidPattern {
        /// Id of the rule.
        id: String,
        /// Compile error.
        message: String,
    },

    /// A glob used by a filter or exception is malformed.
    #[error("invalid glob pattern `{pattern}`: {message}")]
    #[diagnostic(code(rulegate::invalid_glob))]
    InvalidGlob {
        /// The offending pattern.
        pattern: String,
        /// Compile error.
        message: String,
    },

    /// A baseline entry has no justification.
    #[error("baseline entry for rule `{rule}` at `{path}` has no justification")]
    #[diagnostic(
        code(rulegate::baseline_justification),
        help("approved exceptions must say why they are approved")
    )]
    MissingJustification {
        /// Rule the entry refers to.
        rule: String,
        /// Path glob of the entry.
        path: String,
    },
}

/// A named, deterministic check applied to file content.
pub struct Rule {
    id: String,
    category: Category,
    severity: Severity,
    description: String,
    message: String,
    help: Option<String>,
    matcher: Box<dyn Matcher>,
    applicability: Vec<Box<dyn Applicability>>,
    exceptions: Vec<Box<dyn Exception>>,
    inline_allow: bool,
}

impl Rule {
    /// Starts building a rule with the given id.
    #[must_use]
    pub fn builder(id: impl Into<String>) -> RuleBuilder {
        RuleBuilder::new(id)
    }

    /// Stable identifier, unique within a registry.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Category of the rule.
    #[must_use]
    pub fn category(&self) -> Category {
        self.category
    }

    /// Default severity of findings from this rule.
    #[must_use]
    pub fn severity(&self) -> Severity {
        self.severity
    }

    /// Short description of what the rule checks.
    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Message template.
    #[must_use]
    pub fn message_template(&self) -> &str {
        &self.message
    }

    /// Help text attached to findings.
    #[must_use]
    pub fn help(&self) -> Option<&str> {
        self.help.as_deref()
    }

    /// Label describing the matcher kind (`text`, `ast`, `custom`).
    #[must_use]
    pub fn matcher_kind(&self) -> &'static str {
        self.matcher.kind()
    }

    /// Returns the rule with a different default severity.
    ///
    /// Used to apply configuration overrides before registration.
    #[must_use]
    pub fn with_severity(mut self, severity: Severity) -> Self {
        self.severity = severity;
        self
    }

    /// Returns the rule with an additional exception.
    #[must_use]
    pub fn with_exception(mut self, exception: impl Exception + 'static) -> Self {
        self.exceptions.push(Box::new(exception));
        self
    }

    /// Whether the rule runs on `target`.
    #[must_use]
    pub fn applies_to(&self, target: &ScanTarget) -> bool {
        self.applicability.iter().all(|a| a.applies(target))
    }

    /// Runs the matcher.
    ///
    /// # Errors
    ///
    /// Propagates the matcher's failure.
    pub fn find(&self, cx: &MatchContext<'_>) -> Result<Vec<MatchResult>, RuleExecutionError> {
        self.matcher.find(cx)
    }

    /// Whether an inline directive or any exception suppresses `m` on `target`.
    ///
    /// Directives on error-severity matches need a reason. The severity is
    /// the one the finding would carry, after overrides.
    #[must_use]
    pub fn is_suppressed(&self, target: &ScanTarget, m: &MatchResult) -> bool {
        if self.inline_allow {
            let severity = m.severity.unwrap_or(self.severity);
            let allow = InlineAllow::new().require_reason(severity == Severity::Error);
            if allow.suppresses(target, &self.id, m) {
                return true;
            }
        }
        self.exceptions
            .iter()
            .any(|e| e.suppresses(target, &self.id, m))
    }

    /// Renders the message for a match.
    ///
    /// `{key}` placeholders are filled from the match data and the built-ins
    /// `rule`, `file` and `line`; unknown placeholders are kept verbatim.
    #[must_use]
    pub fn render_message(&self, target: &ScanTarget, m: &MatchResult) -> String {
        if let Some(message) = &m.message {
            return message.clone();
        }
        render_template(&self.message, |key| match key {
            "rule" => Some(self.id.clone()),
            "file" => Some(target.relative_path().display().to_string()),
            "line" => Some(m.line.to_string()),
            other => m.get(other).map(String::from),
        })
    }

    /// Converts a kept match into a finding.
    #[must_use]
    pub fn to_finding(&self, target: &ScanTarget, m: &MatchResult) -> Finding {
        let mut location = Location::new(target.relative_path(), m.line);
        if let Some(column) = m.column {
            location = location.with_column(column);
        }

        let finding = Finding::new(
            self.id.clone(),
            self.category,
            m.severity.unwrap_or(self.severity),
            location,
            self.render_message(target, m),
        )
        .with_component(target.metadata().component.clone());

        match &self.help {
            Some(help) => finding.with_help(help.clone()),
            None => finding,
        }
    }
}

impl std::fmt::Debug for Rule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Rule")
            .field("id", &self.id)
            .field("category", &self.category)
            .field("severity", &self.severity)
            .field("matcher", &self.matcher.kind())
            .field("applicability", &self.applicability.len())
            .field("exceptions", &self.exceptions.len())
            .field("inline_allow", &self.inline_allow)
            .finish_non_exhaustive()
    }
}

/// Builder for [`Rule`].
pub struct RuleBuilder {
    id: String,
    category: Category,
    severity: Severity,
    description: String,
    message: Option<String>,
    help: Option<String>,
    matcher: Option<Box<dyn Matcher>>,
    applicability: Vec<Box<dyn Applicability>>,
    exceptions: Vec<Box<dyn Exception>>,
    inline_allow: bool,
}

impl RuleBuilder {
    fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            category: Category::Structure,
            severity: Severity::Error,
            description: String::new(),
            message: None,
            help: None,
            matcher: None,
            applicability: Vec::new(),
            exceptions: Vec::new(),
            inline_allow: true,
        }
    }

    /// Sets the category (default: structure).
    #[must_use]
    pub fn category(mut self, category: Category) -> Self {
        self.category = category;
        self
    }

    /// Sets the default severity (default: error).
    #[must_use]
    pub fn severity(mut self, severity: Severity) -> Self {
        self.severity = severity;
        self
    }

    /// Sets the description.
    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Sets the message template (default: the description).
    #[must_use]
    pub fn message(mut self, template: impl Into<String>) -> Self {
        self.message = Some(template.into());
        self
    }

    /// Sets help text attached to every finding.
    #[must_use]
    pub fn help(mut self, help: impl Into<String>) -> Self {
        self.help = Some(help.into());
        self
    }

    /// Sets the matcher.
    #[must_use]
    pub fn matcher(mut self, matcher: impl Matcher + 'static) -> Self {
        self.matcher = Some(Box::new(matcher));
        self
    }

    /// Adds an applicability filter; all filters must accept a target.
    #[must_use]
    pub fn applies_to(mut self, filter: impl Applicability + 'static) -> Self {
        self.applicability.push(Box::new(filter));
        self
    }

    /// Adds an exception predicate.
    #[must_use]
    pub fn exception(mut self, exception: impl Exception + 'static) -> Self {
        self.exceptions.push(Box::new(exception));
        self
    }

    /// Whether inline `rulegate: allow(...)` directives are honored (default: true).
    ///
    /// Error-severity matches only honor directives that carry a reason.
    #[must_use]
    pub fn inline_allow(mut self, enabled: bool) -> Self {
        self.inline_allow = enabled;
        self
    }

    /// Builds the rule.
    ///
    /// # Errors
    ///
    /// Returns [`RuleDefinitionError::EmptyId`] or
    /// [`RuleDefinitionError::MissingMatcher`].
    pub fn build(self) -> Result<Rule, RuleDefinitionError> {
        let id = self.id.trim().to_string();
        if id.is_empty() {
            return Err(RuleDefinitionError::EmptyId);
        }
        let matcher = self
            .matcher
            .ok_or_else(|| RuleDefinitionError::MissingMatcher { id: id.clone() })?;

        let message = self
            .message
            .or_else(|| (!self.description.is_empty()).then(|| self.description.clone()))
            .unwrap_or_else(|| format!("{id} violation"));

        Ok(Rule {
            id,
            category: self.category,
            severity: self.severity,
            description: self.description,
            message,
            help: self.help,
            matcher,
            applicability: self.applicability,
            exceptions: self.exceptions,
            inline_allow: self.inline_allow,
        })
    }
}

/// Fills `{key}` placeholders using `lookup`.
fn render_template(template: &str, lookup: impl Fn(&str) -> Option<String>) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let after = &rest[open + 1..];
        let key_len = after
            .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_' || c == '-'))
            .unwrap_or(after.len());

        let replaced = (key_len > 0 && after[key_len..].starts_with('}'))
            .then(|| lookup(&after[..key_len]))
            .flatten();

        match replaced {
            Some(value) => {
                out.push_str(&value);
                rest = &after[key_len + 1..];
            }
            None => {
                out.push('{');
                rest = after;
            }
        }
    }
    out.push_str(rest);
    out
}

//! Rules declared in TOML (`[[pattern-rule]]` tables).
//!
//! The DTO exists for deserialization only; [`PatternRuleDto::into_rule`]
//! validates it and produces a regular [`Rule`].

use serde::{Deserialize, Serialize};

use crate::filter::{FileFilter, LineContains};
use crate::matcher::TextPattern;
use crate::rule::{Rule, RuleDefinitionError};
use crate::types::{Category, Severity};

/// Raw TOML representation of a text-pattern rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct PatternRuleDto {
    /// Rule id.
    pub id: String,
    /// Category (default: structure).
    #[serde(default = "default_category")]
    pub category: Category,
    /// Severity (default: error).
    #[serde(default = "default_severity")]
    pub severity: Severity,
    /// Description shown by `list-rules`.
    #[serde(default)]
    pub description: String,
    /// Regular expression (mutually exclusive with `literal`).
    #[serde(default)]
    pub pattern: Option<String>,
    /// Literal substring (mutually exclusive with `pattern`).
    #[serde(default)]
    pub literal: Option<String>,
    /// Message template.
    #[serde(default)]
    pub message: Option<String>,
    /// Help text.
    #[serde(default)]
    pub help: Option<String>,
    /// Only files matching one of these globs.
    #[serde(default)]
    pub include: Vec<String>,
    /// Skip files matching these globs.
    #[serde(default)]
    pub exclude: Vec<String>,
    /// Only files with these extensions.
    #[serde(default)]
    pub extensions: Vec<String>,
    /// Skip test files.
    #[serde(default)]
    pub skip_tests: bool,
    /// Suppress matches on lines containing any of these markers.
    #[serde(default)]
    pub allow_line_contains: Vec<String>,
}

fn default_category() -> Category {
    Category::Structure
}

fn default_severity() -> Severity {
    Severity::Error
}

impl PatternRuleDto {
    /// Validates the DTO and builds the rule.
    ///
    /// # Errors
    ///
    /// Returns [`RuleDefinitionError::InvalidPattern`] when neither or both of
    /// `pattern` and `literal` are set or the regex does not compile, and
    /// [`RuleDefinitionError::InvalidGlob`] for malformed globs.
    pub fn into_rule(self) -> Result<Rule, RuleDefinitionError> {
        let matcher = match (&self.pattern, &self.literal) {
            (Some(pattern), None) => {
                TextPattern::regex(pattern).map_err(|e| RuleDefinitionError::InvalidPattern {
                    id: self.id.clone(),
                    message: e.to_string(),
                })?
            }
            (None, Some(literal)) if !literal.is_empty() => TextPattern::literal(literal.clone()),
            _ => {
                return Err(RuleDefinitionError::InvalidPattern {
                    id: self.id.clone(),
                    message: "exactly one non-empty `pattern` or `literal` must be set"
                        .to_string(),
                })
            }
        };

        let mut filter = FileFilter::new().extensions(self.extensions);
        for glob in &self.include {
            filter = filter.include(glob)?;
        }
        for glob in &self.exclude {
            filter = filter.exclude(glob)?;
        }
        if self.skip_tests {
            filter = filter.skip_tests();
        }

        let mut builder = Rule::builder(self.id)
            .category(self.category)
            .severity(self.severity)
            .description(self.description)
            .matcher(matcher)
            .applies_to(filter);
        if let Some(message) = self.message {
            builder = builder.message(message);
        }
        if let Some(help) = self.help {
            builder = builder.help(help);
        }
        for marker in self.allow_line_contains {
            builder = builder.exception(LineContains::new(marker));
        }
        builder.build()
    }
}

/// Builds rules from a list of DTOs, stopping at the first invalid one.
///
/// # Errors
///
/// Returns the first [`RuleDefinitionError`].
pub fn load_pattern_rules(dtos: Vec<PatternRuleDto>) -> Result<Vec<Rule>, RuleDefinitionError> {
    dtos.into_iter().map(PatternRuleDto::into_rule).collect()
}

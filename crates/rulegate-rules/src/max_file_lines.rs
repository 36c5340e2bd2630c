//! Rule enforcing a file length budget.
//!
//! Produces one file-level finding. Files past `warn_lines` get a warning;
//! files past `max_lines` get an error.
//!
//! # Configuration
//!
//! - `warn_lines`: Line count that triggers a warning (default: 500)
//! - `max_lines`: Line count that triggers an error (default: 1000)

use rulegate_core::{
    Category, MatchContext, MatchResult, Rule, RuleConfig, RuleDefinitionError,
    RuleExecutionError, Severity,
};

/// Rule id for max-file-lines.
pub const ID: &str = "max-file-lines";

/// Flags files whose line count exceeds the configured budget.
#[derive(Debug, Clone)]
pub struct MaxFileLines {
    /// Warning threshold.
    pub warn_lines: usize,
    /// Error threshold.
    pub max_lines: usize,
}

impl Default for MaxFileLines {
    fn default() -> Self {
        Self::new()
    }
}

impl MaxFileLines {
    /// Creates a new rule with default thresholds.
    #[must_use]
    pub fn new() -> Self {
        Self {
            warn_lines: 500,
            max_lines: 1000,
        }
    }

    /// Sets the warning threshold.
    #[must_use]
    pub fn warn_lines(mut self, lines: usize) -> Self {
        self.warn_lines = lines;
        self
    }

    /// Sets the error threshold.
    #[must_use]
    pub fn max_lines(mut self, lines: usize) -> Self {
        self.max_lines = lines;
        self
    }

    /// Applies `[rules.max-file-lines]` options. Negative values are ignored.
    #[must_use]
    pub fn configure(mut self, config: &RuleConfig) -> Self {
        let read = |key: &str, current: usize| {
            usize::try_from(config.get_int(key, -1)).unwrap_or(current)
        };
        self.warn_lines = read("warn_lines", self.warn_lines);
        self.max_lines = read("max_lines", self.max_lines);
        self
    }

    /// Builds the rule.
    ///
    /// # Errors
    ///
    /// Returns [`RuleDefinitionError::InvalidPattern`] if `warn_lines`
    /// exceeds `max_lines`.
    pub fn into_rule(self) -> Result<Rule, RuleDefinitionError> {
        let Self {
            warn_lines,
            max_lines,
        } = self;
        if warn_lines > max_lines {
            return Err(RuleDefinitionError::InvalidPattern {
                id: ID.to_string(),
                message: format!("warn_lines ({warn_lines}) exceeds max_lines ({max_lines})"),
            });
        }

        Rule::builder(ID)
            .category(Category::Structure)
            .severity(Severity::Warning)
            .description("Limits file length")
            .message("file has {lines} lines (limit {limit})")
            .help("split the file into smaller modules")
            .matcher(
                move |cx: &MatchContext<'_>| -> Result<Vec<MatchResult>, RuleExecutionError> {
                    let lines = cx.target().line_count();
                    let (severity, limit) = if lines > max_lines {
                        (Severity::Error, max_lines)
                    } else if lines > warn_lines {
                        (Severity::Warning, warn_lines)
                    } else {
                        return Ok(Vec::new());
                    };
                    Ok(vec![MatchResult::new(0)
                        .with_severity(severity)
                        .with("lines", lines.to_string())
                        .with("limit", limit.to_string())])
                },
            )
            .build()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::check;
    use rulegate_core::Config;

    fn lines(n: usize) -> String {
        "x\n".repeat(n)
    }

    #[test]
    fn test_thresholds() {
        let rule = MaxFileLines::new().warn_lines(3).max_lines(5).into_rule().unwrap();

        assert!(check(&rule, "src/a.ts", &lines(3)).is_empty());

        let warn = check(&rule, "src/a.ts", &lines(4));
        assert_eq!(warn.len(), 1);
        assert_eq!(warn[0].severity(), Severity::Warning);
        assert_eq!(warn[0].location().line, 0);
        assert_eq!(warn[0].message(), "file has 4 lines (limit 3)");

        let error = check(&rule, "src/a.ts", &lines(6));
        assert_eq!(error[0].severity(), Severity::Error);
        assert_eq!(error[0].message(), "file has 6 lines (limit 5)");
    }

    #[test]
    fn test_configure() {
        let config = Config::parse("[rules.max-file-lines]\nwarn_lines = 10\nmax_lines = 20").unwrap();
        let rule = MaxFileLines::new().configure(config.rule(ID).unwrap());
        assert_eq!((rule.warn_lines, rule.max_lines), (10, 20));

        let config = Config::parse("[rules.max-file-lines]\nwarn_lines = -1").unwrap();
        assert_eq!(MaxFileLines::new().configure(config.rule(ID).unwrap()).warn_lines, 500);
    }

    #[test]
    fn test_rejects_inverted_thresholds() {
        let err = MaxFileLines::new().warn_lines(10).max_lines(5).into_rule().unwrap_err();
        assert!(matches!(err, RuleDefinitionError::InvalidPattern { .. }));
    }
}

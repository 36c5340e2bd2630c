//! Rule to forbid `console.log` and friends in component code.
//!
//! # Rationale
//!
//! Debug output left in shipped components pollutes the consumer's console
//! and occasionally leaks internal state.
//!
//! # Configuration
//!
//! - `allow_in_tests`: Allow in test and story files (default: true)
//! - `allow_marker`: Line marker that suppresses a match (default: `// allowed`)
//!
//! # Suppression
//!
//! - A line containing the allow marker
//! - `// rulegate: allow(no-console-log) reason="..."` comment

use rulegate_core::{
    Category, FileFilter, LineContains, Rule, RuleConfig, RuleDefinitionError, ScanTarget,
    Severity,
};

/// Rule id for no-console-log.
pub const ID: &str = "no-console-log";

const PATTERN: &str = r"\bconsole\.(?P<method>log|debug|trace|dir)\s*\(";

/// Forbids `console.log`, `console.debug`, `console.trace` and `console.dir`.
#[derive(Debug, Clone)]
pub struct NoConsoleLog {
    /// Allow in test and story files.
    pub allow_in_tests: bool,
    /// Marker that suppresses a match on its line.
    pub allow_marker: String,
    /// Custom severity.
    pub severity: Severity,
}

impl Default for NoConsoleLog {
    fn default() -> Self {
        Self::new()
    }
}

impl NoConsoleLog {
    /// Creates a new rule with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self {
            allow_in_tests: true,
            allow_marker: "// allowed".to_string(),
            severity: Severity::Error,
        }
    }

    /// Sets whether to allow in test and story files.
    #[must_use]
    pub fn allow_in_tests(mut self, allow: bool) -> Self {
        self.allow_in_tests = allow;
        self
    }

    /// Sets the line marker.
    #[must_use]
    pub fn allow_marker(mut self, marker: impl Into<String>) -> Self {
        self.allow_marker = marker.into();
        self
    }

    /// Sets the severity level.
    #[must_use]
    pub fn severity(mut self, severity: Severity) -> Self {
        self.severity = severity;
        self
    }

    /// Applies `[rules.no-console-log]` options.
    #[must_use]
    pub fn configure(mut self, config: &RuleConfig) -> Self {
        self.allow_in_tests = config.get_bool("allow_in_tests", self.allow_in_tests);
        self.allow_marker = config
            .get_str("allow_marker", &self.allow_marker)
            .to_string();
        self
    }

    /// Builds the rule.
    ///
    /// # Errors
    ///
    /// Returns [`RuleDefinitionError`] if the rule cannot be built.
    pub fn into_rule(self) -> Result<Rule, RuleDefinitionError> {
        let mut filter = FileFilter::new().extensions(crate::SCRIPT_EXTENSIONS);
        let allow_in_tests = self.allow_in_tests;
        if allow_in_tests {
            filter = filter.skip_tests();
        }

        let mut builder = Rule::builder(ID)
            .category(Category::Behavior)
            .severity(self.severity)
            .description("Forbids console debug output in component code")
            .message("`console.{method}` call left in component code")
            .help("remove the call or route it through the component's logger")
            .matcher(crate::regex_pattern(ID, PATTERN)?)
            .applies_to(filter)
            .applies_to(move |t: &ScanTarget| !(allow_in_tests && t.metadata().is_story));
        if !self.allow_marker.is_empty() {
            builder = builder.exception(LineContains::new(self.allow_marker));
        }
        builder.build()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::check;

    fn rule() -> Rule {
        NoConsoleLog::new().into_rule().unwrap()
    }

    #[test]
    fn test_detects_console_calls() {
        let findings = check(
            &rule(),
            "src/components/usa-banner/usa-banner.ts",
            "console.log('a');\nconst x = 1;\nconsole.debug ('b');\n",
        );
        assert_eq!(findings.len(), 2);
        assert_eq!(findings[0].location().line, 1);
        assert_eq!(findings[1].location().line, 3);
        assert_eq!(
            findings[1].message(),
            "`console.debug` call left in component code"
        );
    }

    #[test]
    fn test_ignores_console_warn_and_error() {
        let findings = check(
            &rule(),
            "src/a.ts",
            "console.warn('deprecated');\nconsole.error(err);\n",
        );
        assert!(findings.is_empty());
    }

    #[test]
    fn test_allow_marker() {
        let findings = check(
            &rule(),
            "src/a.ts",
            "console.log('kept'); // allowed\nconsole.log('reported');\n",
        );
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].location().line, 2);
    }

    #[test]
    fn test_allows_in_tests_and_stories() {
        assert!(check(&rule(), "src/a.test.ts", "console.log(1);").is_empty());
        assert!(check(&rule(), "src/a.stories.ts", "console.log(1);").is_empty());

        let strict = NoConsoleLog::new().allow_in_tests(false).into_rule().unwrap();
        assert_eq!(check(&strict, "src/a.test.ts", "console.log(1);").len(), 1);
    }

    #[test]
    fn test_skips_non_script_files() {
        assert!(check(&rule(), "docs/usage.md", "console.log(1)").is_empty());
    }
}

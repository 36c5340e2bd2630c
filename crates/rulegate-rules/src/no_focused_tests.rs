//! Rules for focused and skipped test blocks.
//!
//! `it.only` / `fdescribe` silently narrow a suite to a single case, so the
//! rest of the suite stops running in CI. `it.skip` / `xit` are less
//! dangerous but tend to rot.

use rulegate_core::{Category, FileFilter, Rule, RuleDefinitionError, Severity};

/// Rule id for no-focused-tests.
pub const FOCUSED_ID: &str = "no-focused-tests";

/// Rule id for no-skipped-tests.
pub const SKIPPED_ID: &str = "no-skipped-tests";

const FOCUSED_PATTERN: &str =
    r"\b(?:(?P<block>it|describe|test|context)\.only|f(?P<jasmine>it|describe))\s*\(";
const SKIPPED_PATTERN: &str =
    r"\b(?:(?P<block>it|describe|test|context)\.skip|x(?P<jasmine>it|describe))\s*\(";

/// Forbids `.only` and Jasmine `f`-prefixed blocks in test files.
#[derive(Debug, Clone)]
pub struct NoFocusedTests {
    /// Custom severity.
    pub severity: Severity,
}

impl Default for NoFocusedTests {
    fn default() -> Self {
        Self::new()
    }
}

impl NoFocusedTests {
    /// Creates a new rule with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self {
            severity: Severity::Error,
        }
    }

    /// Sets the severity level.
    #[must_use]
    pub fn severity(mut self, severity: Severity) -> Self {
        self.severity = severity;
        self
    }

    /// Builds the rule.
    ///
    /// # Errors
    ///
    /// Returns [`RuleDefinitionError`] if the rule cannot be built.
    pub fn into_rule(self) -> Result<Rule, RuleDefinitionError> {
        Rule::builder(FOCUSED_ID)
            .category(Category::Behavior)
            .severity(self.severity)
            .description("Forbids focused test blocks")
            .message("focused test `{match}` disables the rest of the suite")
            .help("remove `.only` before committing")
            .matcher(crate::regex_pattern(FOCUSED_ID, FOCUSED_PATTERN)?)
            .applies_to(
                FileFilter::new()
                    .extensions(crate::SCRIPT_EXTENSIONS)
                    .only_tests(),
            )
            .build()
    }
}

/// Flags `.skip` and Jasmine `x`-prefixed blocks in test files.
#[derive(Debug, Clone)]
pub struct NoSkippedTests {
    /// Custom severity.
    pub severity: Severity,
}

impl Default for NoSkippedTests {
    fn default() -> Self {
        Self::new()
    }
}

impl NoSkippedTests {
    /// Creates a new rule with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self {
            severity: Severity::Warning,
        }
    }

    /// Sets the severity level.
    #[must_use]
    pub fn severity(mut self, severity: Severity) -> Self {
        self.severity = severity;
        self
    }

    /// Builds the rule.
    ///
    /// # Errors
    ///
    /// Returns [`RuleDefinitionError`] if the rule cannot be built.
    pub fn into_rule(self) -> Result<Rule, RuleDefinitionError> {
        Rule::builder(SKIPPED_ID)
            .category(Category::Behavior)
            .severity(self.severity)
            .description("Flags skipped test blocks")
            .message("skipped test `{match}`")
            .help("fix or delete the test; add a reason=\"...\" allow directive if it must stay skipped")
            .matcher(crate::regex_pattern(SKIPPED_ID, SKIPPED_PATTERN)?)
            .applies_to(
                FileFilter::new()
                    .extensions(crate::SCRIPT_EXTENSIONS)
                    .only_tests(),
            )
            .build()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::check;

    const SUITE: &str = "\
describe('usa-accordion', () => {
  it.only('expands', () => {});
  fit('collapses', () => {});
  it.skip('animates', () => {});
  xdescribe('keyboard', () => {});
  it('renders', () => {});
});
";

    #[test]
    fn test_focused_blocks() {
        let rule = NoFocusedTests::new().into_rule().unwrap();
        let findings = check(&rule, "src/components/usa-accordion/usa-accordion.test.ts", SUITE);
        let lines: Vec<usize> = findings.iter().map(|f| f.location().line).collect();
        assert_eq!(lines, [2, 3]);
        assert_eq!(
            findings[0].message(),
            "focused test `it.only(` disables the rest of the suite"
        );
    }

    #[test]
    fn test_skipped_blocks() {
        let rule = NoSkippedTests::new().into_rule().unwrap();
        let findings = check(&rule, "src/components/usa-accordion/usa-accordion.spec.ts", SUITE);
        let lines: Vec<usize> = findings.iter().map(|f| f.location().line).collect();
        assert_eq!(lines, [4, 5]);
        assert!(findings.iter().all(|f| f.severity() == Severity::Warning));
    }

    #[test]
    fn test_only_applies_to_test_files() {
        let rule = NoFocusedTests::new().into_rule().unwrap();
        assert!(check(&rule, "src/router.ts", "it.only(").is_empty());
        assert!(check(&rule, "src/a.ts", SUITE).is_empty());
    }

    #[test]
    fn test_ignores_lookalikes() {
        let rule = NoFocusedTests::new().into_rule().unwrap();
        let findings = check(
            &rule,
            "src/a.test.ts",
            "const fitted = fitAll();\nsplit('x');\nexit(0);\n",
        );
        assert!(findings.is_empty());
    }
}

//! Rule to forbid `debugger` statements.

use rulegate_core::{Category, FileFilter, Rule, RuleDefinitionError, Severity};

/// Rule id for no-debugger.
pub const ID: &str = "no-debugger";

const PATTERN: &str = r"\bdebugger\s*([;}]|$)";

/// Forbids `debugger` statements in scripts, tests included.
#[derive(Debug, Clone)]
pub struct NoDebugger {
    /// Custom severity.
    pub severity: Severity,
}

impl Default for NoDebugger {
    fn default() -> Self {
        Self::new()
    }
}

impl NoDebugger {
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
        Rule::builder(ID)
            .category(Category::Behavior)
            .severity(self.severity)
            .description("Forbids debugger statements")
            .message("`debugger` statement halts execution when devtools are open")
            .matcher(crate::regex_pattern(ID, PATTERN)?)
            .applies_to(FileFilter::new().extensions(crate::SCRIPT_EXTENSIONS))
            .build()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::check;

    #[test]
    fn test_detects_statement_forms() {
        let rule = NoDebugger::new().into_rule().unwrap();
        let findings = check(
            &rule,
            "src/a.test.ts",
            "debugger;\nif (x) { debugger }\n  debugger\n",
        );
        assert_eq!(findings.len(), 3);
    }

    #[test]
    fn test_ignores_identifiers_and_strings_mentioning_it() {
        let rule = NoDebugger::new().into_rule().unwrap();
        let findings = check(
            &rule,
            "src/a.ts",
            "const debuggerEnabled = false;\nlog('attach a debugger first');\n",
        );
        assert!(findings.is_empty());
    }
}

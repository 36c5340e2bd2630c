//! Applicability filters and exception predicates.
//!
//! Applicability decides whether a rule runs on a target at all. Exceptions
//! are evaluated per match, against the same target and line, and drop the
//! match before it becomes a finding.

use glob::Pattern;

use crate::matcher::MatchResult;
use crate::rule::RuleDefinitionError;
use crate::target::ScanTarget;

/// Decides whether a rule applies to a target.
pub trait Applicability: Send + Sync {
    /// Returns true if the rule should run on `target`.
    fn applies(&self, target: &ScanTarget) -> bool;
}

impl<F> Applicability for F
where
    F: Fn(&ScanTarget) -> bool + Send + Sync,
{
    fn applies(&self, target: &ScanTarget) -> bool {
        self(target)
    }
}

fn compile_glob(pattern: &str) -> Result<Pattern, RuleDefinitionError> {
    Pattern::new(pattern).map_err(|e| RuleDefinitionError::InvalidGlob {
        pattern: pattern.to_string(),
        message: e.to_string(),
    })
}

/// Path-based applicability filter.
///
/// All configured conditions must hold. Globs match the path relative to the
/// scan root with `/` separators.
#[derive(Debug, Clone, Default)]
pub struct FileFilter {
    include: Vec<Pattern>,
    exclude: Vec<Pattern>,
    extensions: Vec<String>,
    skip_tests: bool,
    only_tests: bool,
    skip_behavior: bool,
}

impl FileFilter {
    /// Creates a filter that accepts every file.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Only accept files matching this glob (any of the includes).
    ///
    /// # Errors
    ///
    /// Returns [`RuleDefinitionError::InvalidGlob`] for a malformed pattern.
    pub fn include(mut self, pattern: &str) -> Result<Self, RuleDefinitionError> {
        self.include.push(compile_glob(pattern)?);
        Ok(self)
    }

    /// Reject files matching this glob.
    ///
    /// # Errors
    ///
    /// Returns [`RuleDefinitionError::InvalidGlob`] for a malformed pattern.
    pub fn exclude(mut self, pattern: &str) -> Result<Self, RuleDefinitionError> {
        self.exclude.push(compile_glob(pattern)?);
        Ok(self)
    }

    /// Only accept files with one of these extensions.
    #[must_use]
    pub fn extensions<I, S>(mut self, extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.extensions.extend(
            extensions
                .into_iter()
                .map(|e| e.into().trim_start_matches('.').to_ascii_lowercase()),
        );
        self
    }

    /// Reject test files.
    #[must_use]
    pub fn skip_tests(mut self) -> Self {
        self.skip_tests = true;
        self
    }

    /// Accept only test files.
    #[must_use]
    pub fn only_tests(mut self) -> Self {
        self.only_tests = true;
        self
    }

    /// Reject behavior files.
    #[must_use]
    pub fn skip_behavior(mut self) -> Self {
        self.skip_behavior = true;
        self
    }
}

impl Applicability for FileFilter {
    fn applies(&self, target: &ScanTarget) -> bool {
        let meta = target.metadata();

        if self.skip_tests && meta.is_test {
            return false;
        }
        if self.only_tests && !meta.is_test {
            return false;
        }
        if self.skip_behavior && meta.is_behavior {
            return false;
        }
        if !self.extensions.is_empty()
            && !meta
                .extension
                .as_ref()
                .is_some_and(|ext| self.extensions.contains(ext))
        {
            return false;
        }

        let path = meta.relative_str();
        if !self.include.is_empty() && !self.include.iter().any(|p| p.matches(&path)) {
            return false;
        }
        !self.exclude.iter().any(|p| p.matches(&path))
    }
}

/// Suppresses a match when it holds for the same target and line.
pub trait Exception: Send + Sync {
    /// Returns true if the match must be dropped.
    fn suppresses(&self, target: &ScanTarget, rule_id: &str, m: &MatchResult) -> bool;
}

impl<F> Exception for F
where
    F: Fn(&ScanTarget, &MatchResult) -> bool + Send + Sync,
{
    fn suppresses(&self, target: &ScanTarget, _rule_id: &str, m: &MatchResult) -> bool {
        self(target, m)
    }
}

/// Suppresses matches whose line contains a marker, e.g. `// allowed`.
#[derive(Debug, Clone)]
pub struct LineContains(String);

impl LineContains {
    /// Creates the exception for `marker`.
    #[must_use]
    pub fn new(marker: impl Into<String>) -> Self {
        Self(marker.into())
    }
}

impl Exception for LineContains {
    fn suppresses(&self, target: &ScanTarget, _rule_id: &str, m: &MatchResult) -> bool {
        target.line(m.line).is_some_and(|line| line.contains(&self.0))
    }
}

/// Suppresses every match in files matching a glob.
#[derive(Debug, Clone)]
pub struct PathGlob(Pattern);

impl PathGlob {
    /// Creates the exception for `pattern`.
    ///
    /// # Errors
    ///
    /// Returns [`RuleDefinitionError::InvalidGlob`] for a malformed pattern.
    pub fn new(pattern: &str) -> Result<Self, RuleDefinitionError> {
        compile_glob(pattern).map(Self)
    }
}

impl Exception for PathGlob {
    fn suppresses(&self, target: &ScanTarget, _rule_id: &str, _m: &MatchResult) -> bool {
        self.0.matches(&target.metadata().relative_str())
    }
}

//! Core types for findings and their classification.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::str::FromStr;

/// Severity level for findings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Informational message, does not fail by default.
    Info,
    /// Warning that should be addressed.
    Warning,
    /// Error that must be fixed.
    Error,
}

impl Severity {
    /// All severities, lowest first.
    pub const ALL: [Self; 3] = [Self::Info, Self::Warning, Self::Error];

    /// Returns the lowercase name used in config files and reports.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Info => "info",
            Self::Warning => "warning",
            Self::Error => "error",
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Severity {
    type Err = ParseKindError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "info" => Ok(Self::Info),
            "warning" | "warn" => Ok(Self::Warning),
            "error" => Ok(Self::Error),
            other => Err(ParseKindError::Severity(other.to_string())),
        }
    }
}

/// Fixed set of rule categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    /// File and component layout.
    Structure,
    /// Runtime behavior of components.
    Behavior,
    /// Accessibility patterns.
    Accessibility,
    /// Security-sensitive constructs.
    Security,
    /// Performance and size budgets.
    Performance,
    /// Documentation coverage and sync.
    Documentation,
    /// Architectural boundaries and design-system conventions.
    Architecture,
}

impl Category {
    /// All categories in declaration order.
    pub const ALL: [Self; 7] = [
        Self::Structure,
        Self::Behavior,
        Self::Accessibility,
        Self::Security,
        Self::Performance,
        Self::Documentation,
        Self::Architecture,
    ];

    /// Returns the lowercase name used in config files and reports.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Structure => "structure",
            Self::Behavior => "behavior",
            Self::Accessibility => "accessibility",
            Self::Security => "security",
            Self::Performance => "performance",
            Self::Documentation => "documentation",
            Self::Architecture => "architecture",
        }
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = ParseKindError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|c| c.as_str() == wanted)
            .ok_or(ParseKindError::Category(wanted))
    }
}

/// Error parsing a [`Severity`] or [`Category`] from text.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseKindError {
    /// Unknown severity name.
    #[error("unknown severity `{0}` (expected one of: info, warning, error)")]
    Severity(String),
    /// Unknown category name.
    #[error(
        "unknown category `{0}` (expected one of: structure, behavior, accessibility, \
         security, performance, documentation, architecture)"
    )]
    Category(String),
}

/// Source code location.
///
/// Line `0` marks a file-level finding that has no specific line.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Location {
    /// File path relative to the scan root.
    pub file: PathBuf,
    /// Line number (1-indexed).
    pub line: usize,
    /// Column number (1-indexed), when known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub column: Option<usize>,
}

impl Location {
    /// Creates a new location without a column.
    #[must_use]
    pub fn new(file: impl Into<PathBuf>, line: usize) -> Self {
        Self {
            file: file.into(),
            line,
            column: None,
        }
    }

    /// Sets the column for this location.
    #[must_use]
    pub fn with_column(mut self, column: usize) -> Self {
        self.column = Some(column);
        self
    }
}

impl std::fmt::Display for Location {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.file.display(), self.line)?;
        if let Some(column) = self.column {
            write!(f, ":{column}")?;
        }
        Ok(())
    }
}

/// What produced a finding.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FindingOrigin {
    /// A rule matched the file content.
    #[default]
    Match,
    /// The rule's matcher failed; the finding makes the broken rule visible.
    RuleFailure,
    /// Evaluating the file exceeded the per-file time budget.
    Timeout,
}

impl FindingOrigin {
    fn is_match(&self) -> bool {
        *self == Self::Match
    }
}

/// One concrete violation located in a specific file.
///
/// Findings are immutable once created; all fields are read through accessors.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Finding {
    rule_id: String,
    category: Category,
    severity: Severity,
    location: Location,
    message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    help: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    component: Option<String>,
    #[serde(default, skip_serializing_if = "FindingOrigin::is_match")]
    origin: FindingOrigin,
}

impl Finding {
    /// Creates a new finding produced by a rule match.
    #[must_use]
    pub fn new(
        rule_id: impl Into<String>,
        category: Category,
        severity: Severity,
        location: Location,
        message: impl Into<String>,
    ) -> Self {
        Self {
            rule_id: rule_id.into(),
            category,
            severity,
            location,
            message: message.into(),
            help: None,
            component: None,
            origin: FindingOrigin::Match,
        }
    }

    /// Attaches help text.
    #[must_use]
    pub fn with_help(mut self, help: impl Into<String>) -> Self {
        self.help = Some(help.into());
        self
    }

    /// Attaches the component the file belongs to.
    #[must_use]
    pub fn with_component(mut self, component: Option<String>) -> Self {
        self.component = component;
        self
    }

    /// Marks where this finding came from.
    #[must_use]
    pub fn with_origin(mut self, origin: FindingOrigin) -> Self {
        self.origin = origin;
        self
    }

    /// Id of the rule that produced this finding.
    #[must_use]
    pub fn rule_id(&self) -> &str {
        &self.rule_id
    }

    /// Category of the producing rule.
    #[must_use]
    pub fn category(&self) -> Category {
        self.category
    }

    /// Effective severity.
    #[must_use]
    pub fn severity(&self) -> Severity {
        self.severity
    }

    /// Where the finding is located.
    #[must_use]
    pub fn location(&self) -> &Location {
        &self.location
    }

    /// Rendered message.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Optional help text.
    #[must_use]
    pub fn help(&self) -> Option<&str> {
        self.help.as_deref()
    }

    /// Component the file belongs to, if any.
    #[must_use]
    pub fn component(&self) -> Option<&str> {
        self.component.as_deref()
    }

    /// What produced this finding.
    #[must_use]
    pub fn origin(&self) -> FindingOrigin {
        self.origin
    }

    /// Formats the finding for terminal output.
    #[must_use]
    pub fn format(&self) -> String {
        use std::fmt::Write;
        let mut output = format!("{} at {}\n", self.rule_id, self.location);
        let _ = writeln!(output, "  {}: {}", self.severity, self.message);
        if let Some(help) = &self.help {
            let _ = writeln!(output, "  = help: {help}");
        }
        output
    }
}

impl std::fmt::Display for Finding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}: {} [{}] {}",
            self.location, self.severity, self.rule_id, self.message
        )
    }
}

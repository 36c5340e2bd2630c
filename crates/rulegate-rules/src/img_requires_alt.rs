//! Rule requiring an `alt` attribute on every `<img>` element.
//!
//! Tags may span several lines; the finding points at the opening `<img`.
//! Decorative images should carry `alt=""` rather than omit the attribute.

use regex::Regex;
use rulegate_core::{
    Category, FileFilter, MatchContext, MatchResult, Matcher, Rule, RuleDefinitionError,
    RuleExecutionError, Severity,
};

/// Rule id for img-requires-alt.
pub const ID: &str = "img-requires-alt";

const MARKUP_EXTENSIONS: [&str; 5] = ["html", "ts", "tsx", "js", "jsx"];

/// Requires `alt` on `<img>` elements in markup and templates.
#[derive(Debug, Clone)]
pub struct ImgRequiresAlt {
    /// Custom severity.
    pub severity: Severity,
}

impl Default for ImgRequiresAlt {
    fn default() -> Self {
        Self::new()
    }
}

impl ImgRequiresAlt {
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
        let alt = Regex::new(r"(?i)(^|[\s/])(alt|\.alt|:alt|\[alt\])\s*=")
            .map_err(crate::invalid_pattern(ID))?;

        Rule::builder(ID)
            .category(Category::Accessibility)
            .severity(self.severity)
            .description("Requires alt text on images")
            .message("`<img>` element is missing an `alt` attribute")
            .help("describe the image with alt=\"...\", or use alt=\"\" if it is decorative")
            .matcher(ImgAltMatcher { alt })
            .applies_to(
                FileFilter::new()
                    .extensions(MARKUP_EXTENSIONS)
                    .skip_tests(),
            )
            .build()
    }
}

struct ImgAltMatcher {
    alt: Regex,
}

impl Matcher for ImgAltMatcher {
    fn find(&self, cx: &MatchContext<'_>) -> Result<Vec<MatchResult>, RuleExecutionError> {
        let content = cx.content();
        let target = cx.target();
        let mut matches = Vec::new();

        for (offset, _) in content.match_indices("<img") {
            let attrs_start = offset + "<img".len();
            let rest = &content[attrs_start..];
            if rest
                .chars()
                .next()
                .is_some_and(|c| c.is_alphanumeric() || c == '-')
            {
                continue;
            }
            // An unterminated tag is checked up to end of file.
            let attrs = rest.find('>').map_or(rest, |end| &rest[..end]);
            if !self.alt.is_match(attrs) {
                let (line, column) = target.position_of(offset);
                matches.push(MatchResult::new(line).with_column(column));
            }
        }

        Ok(matches)
    }

    fn kind(&self) -> &'static str {
        "text"
    }
}

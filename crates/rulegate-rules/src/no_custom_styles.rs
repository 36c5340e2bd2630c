//! Rule to keep component styling on the design system's stylesheet.
//!
//! Components are expected to render design-system classes and leave
//! styling to the shared CSS. Flags `static styles = css\`...\``
//! declarations, `<style>` blocks in templates and inline `style=`
//! attributes inside component sources.
//!
//! # Configuration
//!
//! - `allow_host`: Allow `static styles` that only style `:host`
//!   (default: true)

use rulegate_core::{
    Category, FileFilter, MatchContext, MatchResult, Matcher, Rule, RuleConfig,
    RuleDefinitionError, RuleExecutionError, ScanTarget, Severity,
};

/// Rule id for no-custom-styles.
pub const ID: &str = "no-custom-styles";

/// Forbids custom styling in component sources.
#[derive(Debug, Clone)]
pub struct NoCustomStyles {
    /// Allow `static styles` blocks that only target `:host`.
    pub allow_host: bool,
    /// Custom severity.
    pub severity: Severity,
}

impl Default for NoCustomStyles {
    fn default() -> Self {
        Self::new()
    }
}

impl NoCustomStyles {
    /// Creates a new rule with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self {
            allow_host: true,
            severity: Severity::Error,
        }
    }

    /// Sets whether `:host`-only style blocks are allowed.
    #[must_use]
    pub fn allow_host(mut self, allow: bool) -> Self {
        self.allow_host = allow;
        self
    }

    /// Sets the severity level.
    #[must_use]
    pub fn severity(mut self, severity: Severity) -> Self {
        self.severity = severity;
        self
    }

    /// Applies `[rules.no-custom-styles]` options.
    #[must_use]
    pub fn configure(mut self, config: &RuleConfig) -> Self {
        self.allow_host = config.get_bool("allow_host", self.allow_host);
        self
    }

    /// Builds the rule.
    ///
    /// # Errors
    ///
    /// Returns [`RuleDefinitionError`] if the rule cannot be built.
    pub fn into_rule(self) -> Result<Rule, RuleDefinitionError> {
        let filter = FileFilter::new()
            .extensions(crate::SCRIPT_EXTENSIONS)
            .include("**/components/**")?
            .skip_tests();

        Rule::builder(ID)
            .category(Category::Architecture)
            .severity(self.severity)
            .description("Forbids custom styles in component sources")
            .message("{construct} bypasses the design-system stylesheet")
            .help("use design-system utility classes or extend the shared stylesheet")
            .matcher(StyleMatcher {
                allow_host: self.allow_host,
            })
            .applies_to(filter)
            .applies_to(|t: &ScanTarget| !t.metadata().is_story)
            .build()
    }
}

struct StyleMatcher {
    allow_host: bool,
}

impl StyleMatcher {
    /// Body of the first `css` tagged template after `start`.
    fn css_block(content: &str, start: usize) -> Option<&str> {
        let open = start + content[start..].find("css`")? + 4;
        let close = open + content[open..].find('`')?;
        Some(&content[open..close])
    }

    fn is_host_only(block: &str) -> bool {
        block
            .split('}')
            .map(str::trim)
            .filter(|rule| !rule.is_empty())
            .all(|rule| rule.starts_with(":host"))
    }
}

impl Matcher for StyleMatcher {
    fn find(&self, cx: &MatchContext<'_>) -> Result<Vec<MatchResult>, RuleExecutionError> {
        let content = cx.content();
        let target = cx.target();
        let mut matches = Vec::new();

        for (offset, _) in content.match_indices("static styles") {
            if self.allow_host
                && Self::css_block(content, offset).is_some_and(Self::is_host_only)
            {
                continue;
            }
            let (line, column) = target.position_of(offset);
            matches.push(
                MatchResult::new(line)
                    .with_column(column)
                    .with("construct", "`static styles`"),
            );
        }

        for (offset, _) in content.match_indices("<style") {
            let next = content[offset + "<style".len()..].chars().next();
            if next.is_some_and(|c| c == '>' || c.is_whitespace()) {
                let (line, column) = target.position_of(offset);
                matches.push(
                    MatchResult::new(line)
                        .with_column(column)
                        .with("construct", "`<style>` block"),
                );
            }
        }

        for (offset, _) in content.match_indices(" style=") {
            let (line, column) = target.position_of(offset + 1);
            matches.push(
                MatchResult::new(line)
                    .with_column(column)
                    .with("construct", "inline `style` attribute"),
            );
        }

        matches.sort_by_key(|m| (m.line, m.column));
        Ok(matches)
    }

    fn kind(&self) -> &'static str {
        "text"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::check;

    const PATH: &str = "src/components/usa-tag/usa-tag.ts";

    fn rule() -> Rule {
        NoCustomStyles::new().into_rule().unwrap()
    }

    #[test]
    fn test_flags_static_styles() {
        let code = "\
export class UsaTag extends LitElement {
  static styles = css`
    .usa-tag { color: red; }
  `;
}
";
        let findings = check(&rule(), PATH, code);
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].location().line, 2);
        assert_eq!(
            findings[0].message(),
            "`static styles` bypasses the design-system stylesheet"
        );
    }

    #[test]
    fn test_host_only_styles_are_allowed_by_default() {
        let code = "static styles = css`:host { display: block; }`;\n";
        assert!(check(&rule(), PATH, code).is_empty());

        let strict = NoCustomStyles::new().allow_host(false).into_rule().unwrap();
        assert_eq!(check(&strict, PATH, code).len(), 1);
    }

    #[test]
    fn test_flags_style_blocks_and_attributes() {
        let code = "\
render() {
  return html`<style>.x{}</style>
    <span class=\"usa-tag\" style=\"margin: 0\"></span>`;
}
";
        let findings = check(&rule(), PATH, code);
        let lines: Vec<(usize, Option<usize>)> = findings
            .iter()
            .map(|f| (f.location().line, f.location().column))
            .collect();
        assert_eq!(lines, [(2, Some(15)), (3, Some(27))]);
    }

    #[test]
    fn test_ignores_files_outside_components() {
        assert!(check(&rule(), "src/utils/theme.ts", "static styles = css`a{}`").is_empty());
        assert!(check(&rule(), "src/components/usa-tag/usa-tag.stories.ts", "<style>").is_empty());
    }
}

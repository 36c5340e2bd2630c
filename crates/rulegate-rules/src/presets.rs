//! Rule presets for common configurations.
//!
//! A preset picks rules and their defaults; options from `[rules.<id>]`
//! tables are applied on top.

use std::str::FromStr;

use rulegate_core::{Config, Rule, RuleConfig, RuleDefinitionError, Severity};

use crate::{
    ImgRequiresAlt, MaxFileLines, NoConsoleLog, NoCustomStyles, NoDebugger, NoFocusedTests,
    NoSkippedTests, NoUnwrapExpect,
};

/// Preset configurations for rulegate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Preset {
    /// Recommended rules with sensible defaults.
    #[default]
    Recommended,
    /// Strict rules for maximum safety.
    Strict,
    /// Minimal rules for gradual adoption.
    Minimal,
}

impl Preset {
    /// All presets.
    pub const ALL: [Self; 3] = [Self::Recommended, Self::Strict, Self::Minimal];

    /// Name used in config files and on the command line.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Recommended => "recommended",
            Self::Strict => "strict",
            Self::Minimal => "minimal",
        }
    }

    /// Returns the rules for this preset, configured from `config`.
    ///
    /// # Errors
    ///
    /// Returns [`RuleDefinitionError`] if rule options are inconsistent.
    pub fn rules(self, config: &Config) -> Result<Vec<Rule>, RuleDefinitionError> {
        let rules = match self {
            Self::Recommended => recommended_rules(config)?,
            Self::Strict => strict_rules(config)?,
            Self::Minimal => minimal_rules(config)?,
        };
        tracing::debug!(preset = %self, rules = rules.len(), "preset resolved");
        Ok(rules)
    }
}

impl std::fmt::Display for Preset {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Unknown preset name.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown preset `{0}` (expected recommended, strict or minimal)")]
pub struct ParsePresetError(String);

impl FromStr for Preset {
    type Err = ParsePresetError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|p| p.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| ParsePresetError(s.to_string()))
    }
}

/// Resolves `[rules.<id>]` options, falling back to an empty table.
struct Options<'a> {
    config: &'a Config,
    empty: RuleConfig,
}

impl<'a> Options<'a> {
    fn new(config: &'a Config) -> Self {
        Self {
            config,
            empty: RuleConfig::default(),
        }
    }

    fn get(&self, id: &str) -> &RuleConfig {
        self.config.rule(id).unwrap_or(&self.empty)
    }
}

/// Returns the recommended set of rules.
///
/// Includes:
/// - `no-console-log` (allowed in tests and stories)
/// - `no-debugger`
/// - `no-focused-tests`, `no-skipped-tests` (warning)
/// - `no-custom-styles`
/// - `img-requires-alt`
/// - `max-file-lines` (warn at 500, error at 1000)
/// - `no-unwrap-expect`
///
/// # Errors
///
/// Returns [`RuleDefinitionError`] if rule options are inconsistent.
pub fn recommended_rules(config: &Config) -> Result<Vec<Rule>, RuleDefinitionError> {
    let opts = Options::new(config);
    Ok(vec![
        NoConsoleLog::new()
            .configure(opts.get(crate::no_console_log::ID))
            .into_rule()?,
        NoDebugger::new().into_rule()?,
        NoFocusedTests::new().into_rule()?,
        NoSkippedTests::new().into_rule()?,
        NoCustomStyles::new()
            .configure(opts.get(crate::no_custom_styles::ID))
            .into_rule()?,
        ImgRequiresAlt::new().into_rule()?,
        MaxFileLines::new()
            .configure(opts.get(crate::max_file_lines::ID))
            .into_rule()?,
        NoUnwrapExpect::new()
            .configure(opts.get(crate::no_unwrap_expect::ID))
            .into_rule()?,
    ])
}

/// Returns the strict set of rules.
///
/// Includes all recommended rules with:
/// - No exceptions for test code in `no-console-log` and `no-unwrap-expect`
/// - `no-skipped-tests` raised to error
/// - `no-custom-styles` without the `:host` allowance
/// - `max-file-lines` lowered to warn at 300, error at 600
///
/// # Errors
///
/// Returns [`RuleDefinitionError`] if rule options are inconsistent.
pub fn strict_rules(config: &Config) -> Result<Vec<Rule>, RuleDefinitionError> {
    let opts = Options::new(config);
    Ok(vec![
        NoConsoleLog::new()
            .allow_in_tests(false)
            .configure(opts.get(crate::no_console_log::ID))
            .into_rule()?,
        NoDebugger::new().into_rule()?,
        NoFocusedTests::new().into_rule()?,
        NoSkippedTests::new().severity(Severity::Error).into_rule()?,
        NoCustomStyles::new()
            .allow_host(false)
            .configure(opts.get(crate::no_custom_styles::ID))
            .into_rule()?,
        ImgRequiresAlt::new().into_rule()?,
        MaxFileLines::new()
            .warn_lines(300)
            .max_lines(600)
            .configure(opts.get(crate::max_file_lines::ID))
            .into_rule()?,
        NoUnwrapExpect::new()
            .allow_in_tests(false)
            .configure(opts.get(crate::no_unwrap_expect::ID))
            .into_rule()?,
    ])
}

/// Returns the minimal set of rules.
///
/// For gradual adoption, only includes:
/// - `no-debugger`
/// - `no-focused-tests`
/// - `no-unwrap-expect` (allowing `.expect()`)
///
/// # Errors
///
/// Returns [`RuleDefinitionError`] if rule options are inconsistent.
pub fn minimal_rules(config: &Config) -> Result<Vec<Rule>, RuleDefinitionError> {
    let opts = Options::new(config);
    Ok(vec![
        NoDebugger::new().into_rule()?,
        NoFocusedTests::new().into_rule()?,
        NoUnwrapExpect::new()
            .allow_expect(true)
            .configure(opts.get(crate::no_unwrap_expect::ID))
            .into_rule()?,
    ])
}

/// Returns all available rules with their default settings.
///
/// # Errors
///
/// Returns [`RuleDefinitionError`] if rule options are inconsistent.
pub fn all_rules(config: &Config) -> Result<Vec<Rule>, RuleDefinitionError> {
    recommended_rules(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(rules: &[Rule]) -> Vec<&str> {
        rules.iter().map(Rule::id).collect()
    }

    #[test]
    fn test_preset_rules() {
        let config = Config::default();
        for preset in Preset::ALL {
            assert!(!preset.rules(&config).unwrap().is_empty());
        }
        assert_eq!(all_rules(&config).unwrap().len(), crate::RULE_IDS.len());
    }

    #[test]
    fn test_minimal_is_subset_of_recommended() {
        let config = Config::default();
        let recommended = recommended_rules(&config).unwrap();
        let recommended = ids(&recommended);
        let minimal = minimal_rules(&config).unwrap();
        assert!(ids(&minimal).iter().all(|id| recommended.contains(id)));
    }

    #[test]
    fn test_strict_raises_skipped_tests() {
        let rules = strict_rules(&Config::default()).unwrap();
        let skipped = rules
            .iter()
            .find(|r| r.id() == crate::no_focused_tests::SKIPPED_ID)
            .unwrap();
        assert_eq!(skipped.severity(), Severity::Error);
    }

    #[test]
    fn test_parse_preset() {
        assert_eq!("strict".parse::<Preset>().unwrap(), Preset::Strict);
        assert_eq!(" Minimal ".parse::<Preset>().unwrap(), Preset::Minimal);
        assert!("paranoid".parse::<Preset>().is_err());
        assert_eq!(Preset::default().to_string(), "recommended");
    }

    #[test]
    fn test_rule_options_apply() {
        let config = Config::parse("[rules.max-file-lines]\nwarn_lines = 2000").unwrap();
        let err = recommended_rules(&config).unwrap_err();
        assert!(matches!(err, RuleDefinitionError::InvalidPattern { .. }));
    }
}

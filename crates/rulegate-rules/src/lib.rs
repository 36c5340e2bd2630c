//! # rulegate-rules
//!
//! Built-in rules and presets for rulegate.
//!
//! ## Available Rules
//!
//! | Id | Category | Description |
//! |----|----------|-------------|
//! | `no-console-log` | behavior | Forbids `console.log` and friends in component code |
//! | `no-debugger` | behavior | Forbids `debugger` statements |
//! | `no-focused-tests` | behavior | Forbids `it.only` / `fdescribe` in test files |
//! | `no-skipped-tests` | behavior | Flags `it.skip` / `xit` in test files |
//! | `no-custom-styles` | architecture | Forbids custom styles in component sources |
//! | `img-requires-alt` | accessibility | Requires `alt` on `<img>` elements |
//! | `max-file-lines` | structure | Warns, then errors, on long files |
//! | `no-unwrap-expect` | behavior | Forbids `.unwrap()` and `.expect()` in production Rust code |
//!
//! ## Usage
//!
//! ```no_run
//! use rulegate_core::{Engine, ScanInput};
//! use rulegate_rules::{NoConsoleLog, NoDebugger};
//!
//! let engine = Engine::builder()
//!     .root("./src")
//!     .rule(NoConsoleLog::new().into_rule()?)
//!     .rule(NoDebugger::new().into_rule()?)
//!     .build()?;
//! let outcome = engine.run(&ScanInput::patterns(["**/*.ts"]))?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod img_requires_alt;
mod max_file_lines;
mod no_console_log;
mod no_custom_styles;
mod no_debugger;
mod no_focused_tests;
mod no_unwrap_expect;
mod presets;

pub use img_requires_alt::ImgRequiresAlt;
pub use max_file_lines::MaxFileLines;
pub use no_console_log::NoConsoleLog;
pub use no_custom_styles::NoCustomStyles;
pub use no_debugger::NoDebugger;
pub use no_focused_tests::{NoFocusedTests, NoSkippedTests};
pub use no_unwrap_expect::NoUnwrapExpect;
pub use presets::{
    all_rules, minimal_rules, recommended_rules, strict_rules, ParsePresetError, Preset,
};

/// Re-export core types for convenience.
pub use rulegate_core::{Rule, RuleConfig, RuleDefinitionError, Severity};

/// Ids of every built-in rule, in preset order.
pub const RULE_IDS: [&str; 8] = [
    no_console_log::ID,
    no_debugger::ID,
    no_focused_tests::FOCUSED_ID,
    no_focused_tests::SKIPPED_ID,
    no_custom_styles::ID,
    img_requires_alt::ID,
    max_file_lines::ID,
    no_unwrap_expect::ID,
];

/// Builds a single built-in rule by id with its default settings plus
/// `options`.
///
/// Returns `None` for ids that are not built in.
#[must_use]
pub fn builtin_rule(id: &str, options: &RuleConfig) -> Option<Result<Rule, RuleDefinitionError>> {
    let rule = match id {
        no_console_log::ID => NoConsoleLog::new().configure(options).into_rule(),
        no_debugger::ID => NoDebugger::new().into_rule(),
        no_focused_tests::FOCUSED_ID => NoFocusedTests::new().into_rule(),
        no_focused_tests::SKIPPED_ID => NoSkippedTests::new().into_rule(),
        no_custom_styles::ID => NoCustomStyles::new().configure(options).into_rule(),
        img_requires_alt::ID => ImgRequiresAlt::new().into_rule(),
        max_file_lines::ID => MaxFileLines::new().configure(options).into_rule(),
        no_unwrap_expect::ID => NoUnwrapExpect::new().configure(options).into_rule(),
        _ => return None,
    };
    Some(rule)
}

/// Script extensions checked by the JavaScript/TypeScript rules.
pub(crate) const SCRIPT_EXTENSIONS: [&str; 6] = ["ts", "tsx", "js", "jsx", "mjs", "cjs"];

/// Maps a regex compile error to a definition error for rule `id`.
pub(crate) fn invalid_pattern(id: &'static str) -> impl FnOnce(regex::Error) -> RuleDefinitionError {
    move |e| RuleDefinitionError::InvalidPattern {
        id: id.to_string(),
        message: e.to_string(),
    }
}

/// Compiles a regex text matcher for rule `id`.
pub(crate) fn regex_pattern(
    id: &'static str,
    pattern: &str,
) -> Result<rulegate_core::TextPattern, RuleDefinitionError> {
    rulegate_core::TextPattern::regex(pattern).map_err(invalid_pattern(id))
}

//! # rulegate-core
//!
//! Rule-based static analysis engine for source trees.
//!
//! The pipeline is Scanner → Evaluator (consumes a [`RuleRegistry`]) →
//! [`aggregate`] → [`decide`]:
//!
//! - [`Rule`] bundles a [`Matcher`] (text pattern, `syn` AST check or closure)
//!   with a category, severity, message template and exception predicates
//! - [`RuleRegistry`] keeps rules in registration order and rejects duplicates
//! - [`Scanner`] resolves globs or explicit paths and reads each file once
//! - [`Evaluator`] runs rules per file, isolating failures and timeouts
//! - [`AggregateReport`] holds the findings and derived counts
//! - [`Policy`] and [`decide`] turn a report into pass/fail and an exit code
//!
//! [`Engine`] wires all of it together from a [`Config`].
//!
//! ## Example
//!
//! ```no_run
//! use rulegate_core::{Category, Engine, Rule, ScanInput, TextPattern};
//!
//! let rule = Rule::builder("no-console-log")
//!     .category(Category::Behavior)
//!     .matcher(TextPattern::literal("console.log("))
//!     .build()?;
//!
//! let engine = Engine::builder().root("./src").rule(rule).build()?;
//! let outcome = engine.run(&ScanInput::patterns(["**/*.ts"]))?;
//! std::process::exit(outcome.decision.exit_code);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod aggregate;
mod baseline;
mod config;
mod declarative;
mod engine;
mod evaluator;
mod filter;
mod matcher;
mod outcome;
mod registry;
mod rule;
mod scanner;
mod target;
mod types;

/// Utility modules for rule implementations.
pub mod utils;

pub use aggregate::{aggregate, AggregateReport, CategorySummary, RuleSummary, SeverityCounts, Status};
pub use baseline::{Baseline, BaselineEntry, BaselineException};
pub use config::{Config, ConfigError, RuleConfig, ScannerConfig};
pub use declarative::{load_pattern_rules, PatternRuleDto};
pub use engine::{Engine, EngineBuilder, EngineError, RunOutcome};
pub use evaluator::{Evaluator, TIMEOUT_RULE_ID};
pub use filter::{Applicability, Exception, FileFilter, LineContains, PathGlob};
pub use matcher::{AstCheck, AstMatcher, MatchContext, MatchResult, Matcher, RuleExecutionError, TextPattern};
pub use outcome::{decide, Decision, Policy, EXIT_POLICY_FAILURE, EXIT_SUCCESS};
pub use registry::RuleRegistry;
pub use rule::{Rule, RuleBuilder, RuleDefinitionError};
pub use scanner::{ScanError, ScanInput, ScanOutcome, ScanSkip, Scanner, SkipReason};
pub use target::{FileMetadata, ScanTarget};
pub use types::{Category, Finding, FindingOrigin, Location, ParseKindError, Severity};
pub use utils::allowance::{AllowCheck, InlineAllow};

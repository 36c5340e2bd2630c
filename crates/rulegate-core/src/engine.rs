//! Engine: wires scanner, registry, evaluator, aggregator and decider.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::aggregate::{aggregate, AggregateReport};
use crate::baseline::Baseline;
use crate::config::Config;
use crate::declarative::load_pattern_rules;
use crate::evaluator::Evaluator;
use crate::outcome::{decide, Decision, Policy};
use crate::registry::RuleRegistry;
use crate::rule::{Rule, RuleDefinitionError};
use crate::scanner::{ScanError, ScanInput, ScanSkip, Scanner};

/// Errors that prevent a run from starting or completing.
#[derive(Debug, Error)]
pub enum EngineError {
    /// A rule, baseline entry or declarative rule is invalid.
    #[error(transparent)]
    Definition(#[from] RuleDefinitionError),

    /// The scan input is malformed.
    #[error(transparent)]
    Scan(#[from] ScanError),

    /// The worker pool could not be created.
    #[error("failed to build worker pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),

    /// IO error resolving the root directory.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Builder for configuring an [`Engine`].
#[derive(Default)]
pub struct EngineBuilder {
    root: Option<PathBuf>,
    rules: Vec<Rule>,
    exclude_patterns: Vec<String>,
    include_patterns: Vec<String>,
    config: Option<Config>,
    policy: Option<Policy>,
    file_timeout: Option<Duration>,
    parallelism: Option<usize>,
}

impl EngineBuilder {
    /// Creates a new builder with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the scan root (default: current directory).
    #[must_use]
    pub fn root(mut self, path: impl Into<PathBuf>) -> Self {
        self.root = Some(path.into());
        self
    }

    /// Adds a rule. Registration order is report order.
    #[must_use]
    pub fn rule(mut self, rule: Rule) -> Self {
        self.rules.push(rule);
        self
    }

    /// Adds several rules.
    #[must_use]
    pub fn rules(mut self, rules: impl IntoIterator<Item = Rule>) -> Self {
        self.rules.extend(rules);
        self
    }

    /// Adds an exclude glob pattern.
    #[must_use]
    pub fn exclude(mut self, pattern: impl Into<String>) -> Self {
        self.exclude_patterns.push(pattern.into());
        self
    }

    /// Adds an include glob pattern used by [`Engine::default_input`].
    #[must_use]
    pub fn include(mut self, pattern: impl Into<String>) -> Self {
        self.include_patterns.push(pattern.into());
        self
    }

    /// Sets the configuration.
    #[must_use]
    pub fn config(mut self, config: Config) -> Self {
        self.config = Some(config);
        self
    }

    /// Sets the policy, overriding the configured one.
    #[must_use]
    pub fn policy(mut self, policy: Policy) -> Self {
        self.policy = Some(policy);
        self
    }

    /// Sets the per-file evaluation budget, overriding the configured one.
    #[must_use]
    pub fn file_timeout(mut self, timeout: Duration) -> Self {
        self.file_timeout = Some(timeout);
        self
    }

    /// Sets the number of worker threads (`1` evaluates sequentially).
    #[must_use]
    pub fn parallelism(mut self, threads: usize) -> Self {
        self.parallelism = Some(threads);
        self
    }

    /// Builds the engine.
    ///
    /// Applies configuration overrides and baseline exceptions, then
    /// registers every rule. Definition problems fail here, before any file
    /// is scanned.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Definition`] for duplicate ids, invalid
    /// declarative rules or invalid baseline entries, [`EngineError::Scan`]
    /// for malformed exclude patterns and [`EngineError::Io`] if the current
    /// directory cannot be resolved.
    pub fn build(self) -> Result<Engine, EngineError> {
        let config = self.config.unwrap_or_default();

        let root = self.root.unwrap_or_else(|| PathBuf::from("."));
        let root = if root.is_absolute() {
            root
        } else {
            std::env::current_dir()?.join(&root)
        };

        let baseline = Baseline::new(&config.baseline)?;
        let declared = load_pattern_rules(config.pattern_rules.clone())?;
        let registry = build_registry(self.rules.into_iter().chain(declared), &config, &baseline)?;

        let mut scanner = Scanner::new(&root).respect_gitignore(config.scanner.respect_gitignore);
        for pattern in self.exclude_patterns.iter().chain(&config.scanner.exclude) {
            scanner = scanner.exclude(pattern)?;
        }

        let parallelism = self.parallelism.or(config.scanner.parallelism);
        let mut evaluator = Evaluator::new().parallel(parallelism != Some(1));
        if let Some(timeout) = self.file_timeout.or_else(|| config.file_timeout()) {
            evaluator = evaluator.with_file_timeout(timeout);
        }

        let pool = match parallelism {
            Some(threads) if threads > 1 => Some(
                rayon::ThreadPoolBuilder::new()
                    .num_threads(threads)
                    .thread_name(|i| format!("rulegate-worker-{i}"))
                    .build()?,
            ),
            _ => None,
        };

        let include = if self.include_patterns.is_empty() {
            config.scanner.include.clone()
        } else {
            self.include_patterns
        };

        info!(
            root = %root.display(),
            rules = registry.len(),
            baseline = baseline.len(),
            "engine ready"
        );

        Ok(Engine {
            root,
            registry: Arc::new(registry),
            scanner,
            evaluator,
            policy: self.policy.unwrap_or(config.policy),
            include,
            pool,
        })
    }
}

fn build_registry(
    rules: impl Iterator<Item = Rule>,
    config: &Config,
    baseline: &Baseline,
) -> Result<RuleRegistry, RuleDefinitionError> {
    let mut registry = RuleRegistry::new();
    let mut seen = HashSet::new();

    for mut rule in rules {
        // Disabled rules still claim their id.
        if !seen.insert(rule.id().to_string()) {
            return Err(RuleDefinitionError::DuplicateRuleId {
                id: rule.id().to_string(),
            });
        }
        if !config.is_rule_enabled(rule.id()) {
            debug!(rule_id = rule.id(), "rule disabled by config");
            continue;
        }
        if let Some(severity) = config.rule_severity(rule.id()) {
            debug!(rule_id = rule.id(), %severity, "severity override");
            rule = rule.with_severity(severity);
        }
        if let Some(exception) = baseline.exception_for(rule.id()) {
            rule = rule.with_exception(exception);
        }
        registry.register(rule)?;
    }

    for rule in baseline.unknown_rules(|id| seen.contains(id)) {
        warn!(rule_id = rule, "baseline entry refers to an unknown rule");
    }

    Ok(registry)
}

/// Result of one engine run.
#[derive(Debug, Clone, Serialize)]
pub struct RunOutcome {
    /// Aggregated findings.
    pub report: AggregateReport,
    /// Paths the scanner dropped.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub skipped: Vec<ScanSkip>,
    /// Pass/fail decision.
    pub decision: Decision,
}

/// A configured engine, ready to run.
///
/// Use [`Engine::builder()`] to construct an instance.
pub struct Engine {
    root: PathBuf,
    registry: Arc<RuleRegistry>,
    scanner: Scanner,
    evaluator: Evaluator,
    policy: Policy,
    include: Vec<String>,
    pool: Option<rayon::ThreadPool>,
}

impl Engine {
    /// Creates a new builder for configuring an engine.
    #[must_use]
    pub fn builder() -> EngineBuilder {
        EngineBuilder::new()
    }

    /// Returns the scan root.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Returns the rule registry.
    #[must_use]
    pub fn registry(&self) -> &RuleRegistry {
        &self.registry
    }

    /// Returns the effective policy.
    #[must_use]
    pub fn policy(&self) -> &Policy {
        &self.policy
    }

    /// Input used when the caller gives no paths: configured include
    /// patterns, or the whole root.
    #[must_use]
    pub fn default_input(&self) -> ScanInput {
        if self.include.is_empty() {
            ScanInput::paths(["."])
        } else {
            ScanInput::Patterns(self.include.clone())
        }
    }

    /// Scans, evaluates, aggregates and decides.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Scan`] for malformed patterns. Rule failures
    /// and unreadable files do not abort the run.
    pub fn run(&self, input: &ScanInput) -> Result<RunOutcome, EngineError> {
        let work = || -> Result<RunOutcome, EngineError> {
            let scan = self.scanner.scan(input)?;
            let files_scanned = scan.targets.len();
            let findings = self.evaluator.evaluate(&scan.targets, &self.registry);
            drop(scan.targets);

            let report = aggregate(findings, files_scanned);
            let decision = decide(&report, &self.policy);
            info!(
                files = files_scanned,
                findings = report.findings().len(),
                passed = decision.passed,
                "run complete"
            );

            Ok(RunOutcome {
                report,
                skipped: scan.skipped,
                decision,
            })
        };

        match &self.pool {
            Some(pool) => pool.install(work),
            None => work(),
        }
    }
}

impl std::fmt::Debug for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine")
            .field("root", &self.root)
            .field("rules", &self.registry.len())
            .field("policy", &self.policy)
            .finish_non_exhaustive()
    }
}

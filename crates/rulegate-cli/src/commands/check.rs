//! Check command implementation.

use anyhow::{bail, Context, Result};
use rulegate_core::{Config, Engine, Policy, RuleConfig, ScanInput, Severity};
use rulegate_rules::{builtin_rule, Preset, Rule};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::config_resolver::{self, ConfigSource};
use crate::{OutputFormat, SeverityArg};

/// Arguments of `rulegate check`.
#[derive(Debug, clap::Args)]
pub struct CheckArgs {
    /// Files or directories to check (default: configured include patterns,
    /// otherwise the whole project)
    paths: Vec<PathBuf>,

    /// Glob patterns to check, relative to the project root
    #[arg(short, long = "pattern", conflicts_with = "paths")]
    patterns: Vec<String>,

    /// Exclude patterns (can be specified multiple times)
    #[arg(short, long)]
    exclude: Vec<String>,

    /// Only run specific rules (comma-separated ids)
    #[arg(long, value_delimiter = ',')]
    rules: Vec<String>,

    /// Rule preset (default: config `preset`, then recommended)
    #[arg(long)]
    preset: Option<Preset>,

    /// Also fail on warnings
    #[arg(long)]
    strict: bool,

    /// Severities that fail the run (comma-separated)
    #[arg(long, value_enum, value_delimiter = ',')]
    fail_on: Vec<SeverityArg>,

    /// Output format
    #[arg(short, long, default_value = "text")]
    format: OutputFormat,

    /// Also write the full JSON report to this file
    #[arg(long)]
    report: Option<PathBuf>,

    /// Per-file evaluation budget in milliseconds
    #[arg(long)]
    timeout_ms: Option<u64>,

    /// Worker threads (1 evaluates sequentially)
    #[arg(short, long)]
    jobs: Option<usize>,

    /// Project root: config lookup and relative paths in reports
    #[arg(long, default_value = ".")]
    root: PathBuf,
}

/// Runs the check command and returns the process exit code.
pub fn run(args: &CheckArgs, explicit_config: Option<&Path>) -> Result<u8> {
    let source = config_resolver::resolve(&args.root, explicit_config);
    let mut config = load_config(&source)?;

    let preset = match (args.preset, config.preset.as_deref()) {
        (Some(preset), _) => preset,
        (None, Some(name)) => name
            .parse()
            .with_context(|| format!("invalid `preset` in {source}"))?,
        (None, None) => Preset::default(),
    };

    let rules = if args.rules.is_empty() {
        preset.rules(&config)?
    } else {
        select_rules(&args.rules, &mut config)?
    };

    let mut builder = Engine::builder()
        .root(&args.root)
        .rules(rules)
        .policy(policy(args, &config.policy));
    for pattern in &args.exclude {
        builder = builder.exclude(pattern);
    }
    if let Some(ms) = args.timeout_ms.filter(|&ms| ms > 0) {
        builder = builder.file_timeout(Duration::from_millis(ms));
    }
    if let Some(jobs) = args.jobs {
        builder = builder.parallelism(jobs);
    }

    let engine = builder
        .config(config)
        .build()
        .context("failed to set up the engine")?;

    tracing::info!(
        "Checking {} with {} rules ({preset} preset)",
        engine.root().display(),
        engine.registry().len()
    );

    let input = if !args.paths.is_empty() {
        let cwd = std::env::current_dir().context("cannot resolve current directory")?;
        ScanInput::paths(args.paths.iter().map(|p| cwd.join(p)))
    } else if !args.patterns.is_empty() {
        ScanInput::Patterns(args.patterns.clone())
    } else {
        engine.default_input()
    };

    let outcome = engine.run(&input).context("check failed")?;

    super::output::print(&outcome, args.format)?;

    if let Some(path) = &args.report {
        let json = serde_json::to_string_pretty(&outcome)?;
        std::fs::write(path, json)
            .with_context(|| format!("failed to write report: {}", path.display()))?;
        tracing::info!("Report written to {}", path.display());
    }

    Ok(u8::try_from(outcome.decision.exit_code).unwrap_or(u8::MAX))
}

fn load_config(source: &ConfigSource) -> Result<Config> {
    let Some(path) = source.path() else {
        return Ok(Config::default());
    };
    if source.is_global() {
        tracing::info!("Using global config: {}", path.display());
    }
    Config::from_file(path).with_context(|| format!("Failed to load config: {}", path.display()))
}

/// Builds the built-in rules named by `--rules` and disables declarative
/// rules that were not named.
fn select_rules(ids: &[String], config: &mut Config) -> Result<Vec<Rule>> {
    let declared: Vec<String> = config.pattern_rules.iter().map(|r| r.id.clone()).collect();
    let empty = RuleConfig::default();
    let mut rules = Vec::new();

    for id in ids.iter().map(|id| id.trim()).filter(|id| !id.is_empty()) {
        if declared.iter().any(|d| d == id) {
            continue;
        }
        match builtin_rule(id, config.rule(id).unwrap_or(&empty)) {
            Some(rule) => rules.push(rule?),
            None => bail!("unknown rule `{id}` (see `rulegate list-rules`)"),
        }
    }

    for id in declared {
        if !ids.iter().any(|wanted| wanted.trim() == id) {
            config.rules.entry(id).or_default().enabled = Some(false);
        }
    }

    Ok(rules)
}

/// Command-line flags override the configured policy.
fn policy(args: &CheckArgs, configured: &Policy) -> Policy {
    let fail_on = if args.fail_on.is_empty() {
        configured.fail_on.clone()
    } else {
        args.fail_on.iter().copied().map(Severity::from).collect()
    };
    Policy {
        fail_on,
        strict: args.strict || configured.strict,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[derive(Parser)]
    struct Harness {
        #[command(flatten)]
        args: CheckArgs,
    }

    fn parse(argv: &[&str]) -> CheckArgs {
        Harness::try_parse_from(std::iter::once("check").chain(argv.iter().copied()))
            .unwrap()
            .args
    }

    #[test]
    fn test_parse_arguments() {
        let args = parse(&[
            "--rules",
            "no-debugger,no-console-log",
            "--fail-on",
            "error,warning",
            "--preset",
            "strict",
            "--format",
            "json",
            "src/a.ts",
        ]);
        assert_eq!(args.rules, ["no-debugger", "no-console-log"]);
        assert_eq!(args.fail_on, [SeverityArg::Error, SeverityArg::Warning]);
        assert_eq!(args.preset, Some(Preset::Strict));
        assert_eq!(args.format, OutputFormat::Json);
        assert_eq!(args.paths, [PathBuf::from("src/a.ts")]);
    }

    #[test]
    fn test_patterns_conflict_with_paths() {
        let result = Harness::try_parse_from(["check", "src", "--pattern", "**/*.ts"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_policy_flags_override_config() {
        let configured = Policy::default();

        let args = parse(&["--strict"]);
        assert_eq!(
            policy(&args, &configured).failing_severities(),
            [Severity::Error, Severity::Warning]
        );

        let args = parse(&["--fail-on", "info"]);
        assert_eq!(policy(&args, &configured).failing_severities(), [Severity::Info]);

        let args = parse(&[]);
        assert_eq!(policy(&args, &configured), configured);
    }

    #[test]
    fn test_select_rules() {
        let mut config = Config::parse(
            r#"
[[pattern-rule]]
id = "no-inline-style"
literal = "style="

[[pattern-rule]]
id = "no-todo"
literal = "TODO"
"#,
        )
        .unwrap();

        let ids = vec!["no-debugger".to_string(), "no-todo".to_string()];
        let rules = select_rules(&ids, &mut config).unwrap();
        assert_eq!(rules.len(), 1);
        assert_eq!(rules[0].id(), "no-debugger");
        assert!(!config.is_rule_enabled("no-inline-style"));
        assert!(config.is_rule_enabled("no-todo"));

        let err = select_rules(&["no-such-rule".to_string()], &mut config).unwrap_err();
        assert!(err.to_string().contains("unknown rule `no-such-rule`"));
    }
}

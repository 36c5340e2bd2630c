//! Init command implementation.

use anyhow::{bail, Context, Result};
use std::path::Path;

const DEFAULT_CONFIG: &str = r#"# rulegate configuration

# Rule preset: "recommended", "strict" or "minimal"
preset = "recommended"

[policy]
# Severities that fail the run
fail_on = ["error"]
# Also fail on warnings
strict = false

[scanner]
# Glob patterns checked when no paths are given (default: the whole project)
# include = ["src/**/*.ts", "src/**/*.css"]

# Glob patterns to exclude
exclude = [
    "**/node_modules/**",
    "**/target/**",
    "**/dist/**",
]

# Respect .gitignore files
respect_gitignore = true

# Worker threads (1 evaluates sequentially)
# parallelism = 4

# Per-file evaluation budget in milliseconds
# file_timeout_ms = 5000

# Rule configurations
# Each rule can be enabled/disabled and have its severity overridden

[rules.no-console-log]
enabled = true
# severity = "warning"  # Override default severity
allow_in_tests = true

[rules.max-file-lines]
warn_lines = 500
max_lines = 1000

# Project-specific text rules
# [[pattern-rule]]
# id = "no-inline-style"
# category = "architecture"
# severity = "error"
# literal = "style=\""
# message = "inline styles bypass the design system"
# include = ["src/components/**"]
# skip_tests = true

# Approved exceptions; each needs a justification
# [[baseline]]
# rule = "no-console-log"
# path = "src/legacy/**"
# justification = "legacy module, removal tracked separately"
"#;

/// Config file written by `init`.
const CONFIG_FILE: &str = "rulegate.toml";

/// Runs the init command.
pub fn run(force: bool) -> Result<u8> {
    write_config(Path::new(CONFIG_FILE), force)?;

    println!("Created {CONFIG_FILE}");
    println!("\nNext steps:");
    println!("  1. Edit {CONFIG_FILE} to configure rules");
    println!("  2. Run: rulegate check");

    Ok(0)
}

fn write_config(path: &Path, force: bool) -> Result<()> {
    if path.exists() && !force {
        bail!(
            "Configuration file already exists at {}. Use --force to overwrite.",
            path.display()
        );
    }

    std::fs::write(path, DEFAULT_CONFIG)
        .with_context(|| format!("failed to write {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rulegate_core::Config;

    #[test]
    fn test_template_parses() {
        let config = Config::parse(DEFAULT_CONFIG).unwrap();
        assert_eq!(config.preset.as_deref(), Some("recommended"));
        assert!(config.is_rule_enabled("no-console-log"));
        assert_eq!(
            config.rule("max-file-lines").unwrap().get_int("warn_lines", 0),
            500
        );
    }

    #[test]
    fn test_refuses_to_overwrite_without_force() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join(CONFIG_FILE);
        std::fs::write(&path, "preset = \"minimal\"\n").unwrap();

        let err = write_config(&path, false).unwrap_err();
        assert!(err.to_string().contains("--force"));
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "preset = \"minimal\"\n");

        write_config(&path, true).unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), DEFAULT_CONFIG);
    }
}

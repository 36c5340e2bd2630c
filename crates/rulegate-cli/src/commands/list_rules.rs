//! List rules command implementation.

use anyhow::Result;
use rulegate_core::Config;
use rulegate_rules::{all_rules, Preset, Rule};
use serde::Serialize;

use crate::OutputFormat;

#[derive(Debug, Serialize)]
struct RuleInfo<'a> {
    id: &'a str,
    category: &'static str,
    severity: &'static str,
    kind: &'static str,
    description: &'a str,
    presets: Vec<&'static str>,
}

/// Runs the list-rules command.
pub fn run(format: OutputFormat) -> Result<u8> {
    let config = Config::default();
    let rules = all_rules(&config)?;
    let presets: Vec<(Preset, Vec<String>)> = Preset::ALL
        .into_iter()
        .map(|preset| {
            let ids = preset
                .rules(&config)
                .map(|rules| rules.iter().map(|r| r.id().to_string()).collect())
                .unwrap_or_default();
            (preset, ids)
        })
        .collect();

    let infos: Vec<RuleInfo<'_>> = rules
        .iter()
        .map(|rule| RuleInfo {
            id: rule.id(),
            category: rule.category().as_str(),
            severity: rule.severity().as_str(),
            kind: rule.matcher_kind(),
            description: rule.description(),
            presets: presets
                .iter()
                .filter(|(_, ids)| ids.iter().any(|id| id == rule.id()))
                .map(|(preset, _)| preset.as_str())
                .collect(),
        })
        .collect();

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&infos)?),
        OutputFormat::Compact => {
            for info in &infos {
                println!("{}", info.id);
            }
        }
        OutputFormat::Text => print_text(&infos, &rules),
    }
    Ok(0)
}

fn print_text(infos: &[RuleInfo<'_>], rules: &[Rule]) {
    println!("Available rules:\n");
    println!(
        "{:<20} {:<14} {:<8} Description",
        "Id", "Category", "Severity"
    );
    println!("{}", "-".repeat(80));

    for info in infos {
        println!(
            "{:<20} {:<14} {:<8} {}",
            info.id, info.category, info.severity, info.description
        );
    }

    println!("\nPresets:");
    for preset in Preset::ALL {
        let members: Vec<&str> = infos
            .iter()
            .filter(|info| info.presets.contains(&preset.as_str()))
            .map(|info| info.id)
            .collect();
        let marker = if preset == Preset::default() { " (default)" } else { "" };
        println!(
            "  {:<12} {}/{} rules{marker}: {}",
            preset.as_str(),
            members.len(),
            rules.len(),
            members.join(", ")
        );
    }

    println!("\nUse --rules to run specific rules, e.g.:");
    println!("  rulegate check --rules no-console-log,no-debugger");
    println!("Declare project-specific rules with [[pattern-rule]] tables in rulegate.toml.");
}

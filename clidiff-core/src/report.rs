//! Diff files, the summary document, and the console view of a comparison.

use std::io::Write;
use std::path::PathBuf;

use chrono::{DateTime, Local};
use fs_err as fs;

use crate::baseline::ResultSet;
use crate::compare::{Comparison, Outcome, ScenarioDiff};
use crate::console::{Console, Style};
use crate::error::Result;
use crate::session::Session;

/// Files written by [`render`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportFiles {
    pub diffs: Vec<PathBuf>,
    pub summary: PathBuf,
}

/// Diff file for one differing scenario.
pub fn diff_document(tool: &str, name: &str, command: &str, diff: &ScenarioDiff) -> String {
    let mut out = String::new();
    out.push_str(&format!("Scenario: {name}\n"));
    out.push_str(&format!("Command: {}\n", command_line(tool, command)));
    out.push_str(&"=".repeat(80));
    out.push_str("\n\n");
    out.push_str(&diff.body());
    out
}

/// Markdown summary of a comparison.
pub fn summary_document(
    tool: &str,
    baseline: &ResultSet,
    comparison: &Comparison,
    generated: DateTime<Local>,
) -> String {
    let summary = comparison.summary();
    let mut out = String::new();
    out.push_str(&format!("# {tool} UI/UX Comparison Report\n\n"));
    out.push_str(&format!("Generated: {}\n\n", generated.format("%Y-%m-%d %H:%M:%S")));

    out.push_str("## Summary\n\n");
    out.push_str(&format!("- Total scenarios: {}\n", summary.total));
    out.push_str(&format!("- Identical: {}\n", summary.identical));
    out.push_str(&format!("- Different: {}\n", summary.differing));
    out.push_str(&format!("- Missing: {}\n\n", summary.missing));

    if !comparison.has_differences() {
        out.push_str("All scenarios are identical.\n");
        return out;
    }

    out.push_str("## Scenarios with Differences\n\n");
    for entry in comparison.differences() {
        let name = entry.name.as_str();
        out.push_str(&format!("### {name}\n\n"));
        if let Some(record) = baseline.get(name) {
            out.push_str(&format!("Command: `{}`\n\n", command_line(tool, &record.command)));
        }
        match &entry.outcome {
            Outcome::Differing(diff) => {
                if let Some((before, after)) = diff.exit_code {
                    out.push_str(&format!("**Exit code changed:** {before} → {after}\n\n"));
                }
                if diff.stdout.is_some() {
                    out.push_str(&format!("**Stdout changed** (see `{name}.diff`)\n\n"));
                }
                if diff.stderr.is_some() {
                    out.push_str(&format!("**Stderr changed** (see `{name}.diff`)\n\n"));
                }
            }
            Outcome::MissingInCandidate => {
                out.push_str("**Scenario missing in candidate run**\n\n");
            }
            Outcome::Identical => {}
        }
    }
    out
}

/// Write one `.diff` per differing scenario and `summary.md` into the
/// session, and print the per-scenario and summary view to `console`.
pub fn render<W: Write>(
    tool: &str,
    baseline: &ResultSet,
    comparison: &Comparison,
    session: &Session,
    console: &mut Console<W>,
) -> Result<ReportFiles> {
    console.blank();
    console.heading("=== Comparison Results ===");
    console.blank();

    let mut diffs = Vec::new();
    for entry in &comparison.outcomes {
        let name = entry.name.as_str();
        match &entry.outcome {
            Outcome::Identical => console.success(&format!("✓ {name}: Identical")),
            Outcome::MissingInCandidate => {
                console.error(&format!("✗ {name}: Missing in candidate run"))
            }
            Outcome::Differing(diff) => {
                console.warn(&format!("≠ {name}: Output differs"));
                let command = baseline.get(name).map(|r| r.command.as_str()).unwrap_or_default();
                let path = session.diff_path(name);
                fs::write(&path, diff_document(tool, name, command, diff))?;
                console.detail(&format!("  Diff saved to: {}", path.display()));
                diffs.push(path);
            }
        }
    }

    let summary_path = session.summary_path();
    fs::write(
        &summary_path,
        summary_document(tool, baseline, comparison, Local::now()),
    )?;

    let summary = comparison.summary();
    console.blank();
    console.heading("Summary:");
    console.println(&format!("  Total scenarios: {}", summary.total));
    let identical = console.paint(Style::Success, &summary.identical.to_string());
    console.println(&format!("  Identical: {identical}"));
    let differing = console.paint(Style::Warning, &summary.differing.to_string());
    console.println(&format!("  Different: {differing}"));
    if summary.missing > 0 {
        let missing = console.paint(Style::Error, &summary.missing.to_string());
        console.println(&format!("  Missing: {missing}"));
    }

    if comparison.has_differences() {
        console.blank();
        console.warn("Review the diffs to determine if changes are expected:");
        console.println("  - Refactoring: Changes indicate potential issues");
        console.println("  - Enhancement: Changes should match your new features");
        console.blank();
        console.println(&format!("Diffs saved in: {}", session.dir().display()));
    }
    console.println(&format!("Full report: {}", summary_path.display()));

    Ok(ReportFiles {
        diffs,
        summary: summary_path,
    })
}

fn command_line(tool: &str, command: &str) -> String {
    if command.is_empty() {
        tool.to_string()
    } else {
        format!("{tool} {command}")
    }
}

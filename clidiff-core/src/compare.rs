//! Baseline vs candidate comparison.

use std::fmt;

use similar::TextDiff;

use crate::baseline::ResultSet;
use crate::capture::CapturedRecord;

/// Label for the old side of every diff.
pub const BASELINE_LABEL: &str = "baseline";
/// Label for the new side of every diff.
pub const CANDIDATE_LABEL: &str = "candidate";

/// An observable field of a captured record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    ExitCode,
    Stdout,
    Stderr,
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Field::ExitCode => write!(f, "exit code"),
            Field::Stdout => write!(f, "stdout"),
            Field::Stderr => write!(f, "stderr"),
        }
    }
}

/// Per-field differences for one scenario. A `None` field did not change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScenarioDiff {
    /// Baseline and candidate exit codes.
    pub exit_code: Option<(i32, i32)>,

    /// Unified line diff of stdout.
    pub stdout: Option<String>,

    /// Unified line diff of stderr.
    pub stderr: Option<String>,
}

impl ScenarioDiff {
    /// Diff two records, or `None` if their observable output is identical.
    pub fn between(baseline: &CapturedRecord, candidate: &CapturedRecord) -> Option<Self> {
        if baseline.same_output(candidate) {
            return None;
        }
        Some(Self {
            exit_code: (baseline.exit_code != candidate.exit_code)
                .then_some((baseline.exit_code, candidate.exit_code)),
            stdout: (baseline.stdout != candidate.stdout)
                .then(|| unified_diff(&baseline.stdout, &candidate.stdout)),
            stderr: (baseline.stderr != candidate.stderr)
                .then(|| unified_diff(&baseline.stderr, &candidate.stderr)),
        })
    }

    /// Fields that changed, in report order.
    pub fn changed_fields(&self) -> Vec<Field> {
        let mut fields = Vec::new();
        if self.exit_code.is_some() {
            fields.push(Field::ExitCode);
        }
        if self.stdout.is_some() {
            fields.push(Field::Stdout);
        }
        if self.stderr.is_some() {
            fields.push(Field::Stderr);
        }
        fields
    }

    /// Diff body: only the sections for fields that changed.
    pub fn body(&self) -> String {
        let mut out = String::new();
        if let Some((before, after)) = self.exit_code {
            out.push_str("Exit Code:\n");
            out.push_str(&format!("  Baseline:  {before}\n"));
            out.push_str(&format!("  Candidate: {after}\n\n"));
        }
        if let Some(diff) = &self.stdout {
            push_section(&mut out, "STDOUT Diff:", diff);
        }
        if let Some(diff) = &self.stderr {
            push_section(&mut out, "STDERR Diff:", diff);
        }
        out
    }
}

fn push_section(out: &mut String, title: &str, diff: &str) {
    out.push_str(title);
    out.push('\n');
    out.push_str(&"-".repeat(40));
    out.push('\n');
    out.push_str(diff);
    if !diff.ends_with('\n') {
        out.push('\n');
    }
    out.push('\n');
}

/// Line-based unified diff labeled `baseline` / `candidate`.
pub fn unified_diff(baseline: &str, candidate: &str) -> String {
    let diff = TextDiff::from_lines(baseline, candidate);
    let mut unified = diff.unified_diff();
    unified
        .context_radius(3)
        .header(BASELINE_LABEL, CANDIDATE_LABEL);
    unified.to_string()
}

/// Classification of one baseline scenario.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Identical,
    Differing(ScenarioDiff),
    MissingInCandidate,
}

impl Outcome {
    pub fn is_identical(&self) -> bool {
        matches!(self, Outcome::Identical)
    }
}

/// Outcome for one scenario name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScenarioOutcome {
    pub name: String,
    pub outcome: Outcome,
}

/// Outcomes for every baseline scenario, in baseline order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Comparison {
    pub outcomes: Vec<ScenarioOutcome>,
}

/// Totals over a [`Comparison`].
///
/// `differing` counts every scenario that is not identical, missing ones
/// included; `missing` is the subset absent from the candidate run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Summary {
    pub total: usize,
    pub identical: usize,
    pub differing: usize,
    pub missing: usize,
}

impl Comparison {
    /// Compare every baseline scenario against the candidate.
    ///
    /// The baseline decides which scenarios are expected: names that only
    /// appear in the candidate are ignored.
    pub fn compare(baseline: &ResultSet, candidate: &ResultSet) -> Self {
        let outcomes = baseline
            .iter()
            .map(|(name, expected)| {
                let outcome = match candidate.get(name) {
                    None => Outcome::MissingInCandidate,
                    Some(actual) => match ScenarioDiff::between(expected, actual) {
                        None => Outcome::Identical,
                        Some(diff) => Outcome::Differing(diff),
                    },
                };
                ScenarioOutcome {
                    name: name.to_string(),
                    outcome,
                }
            })
            .collect();
        Self { outcomes }
    }

    pub fn get(&self, name: &str) -> Option<&Outcome> {
        self.outcomes
            .iter()
            .find(|o| o.name == name)
            .map(|o| &o.outcome)
    }

    pub fn len(&self) -> usize {
        self.outcomes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }

    /// Scenarios that are not identical, in baseline order.
    pub fn differences(&self) -> impl Iterator<Item = &ScenarioOutcome> {
        self.outcomes.iter().filter(|o| !o.outcome.is_identical())
    }

    pub fn has_differences(&self) -> bool {
        self.differences().next().is_some()
    }

    pub fn summary(&self) -> Summary {
        let mut summary = Summary {
            total: self.outcomes.len(),
            ..Summary::default()
        };
        for o in &self.outcomes {
            match o.outcome {
                Outcome::Identical => summary.identical += 1,
                Outcome::Differing(_) => summary.differing += 1,
                Outcome::MissingInCandidate => {
                    summary.differing += 1;
                    summary.missing += 1;
                }
            }
        }
        summary
    }
}

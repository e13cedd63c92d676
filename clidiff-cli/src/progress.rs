//! Progress display while scenarios run.

use clidiff_core::{CaptureObserver, CapturedRecord, Scenario};
use indicatif::{ProgressBar, ProgressStyle};

/// Shows a bar on an interactive stderr; in verbose mode also prints each
/// invocation.
pub struct Progress {
    bar: ProgressBar,
    tool: String,
    verbose: bool,
}

impl Progress {
    pub fn new(tool: &str, show_bar: bool, verbose: bool) -> Self {
        let bar = if show_bar {
            let bar = ProgressBar::new(0);
            let template = "{bar:30.cyan/blue} {pos}/{len} {msg}";
            if let Ok(style) = ProgressStyle::with_template(template) {
                bar.set_style(style);
            }
            bar
        } else {
            ProgressBar::hidden()
        };
        Self {
            bar,
            tool: tool.to_string(),
            verbose,
        }
    }

    pub fn finish(&self) {
        self.bar.finish_and_clear();
    }
}

impl CaptureObserver for Progress {
    fn begin(&mut self, total: usize) {
        self.bar.set_length(total as u64);
        self.bar.set_position(0);
    }

    fn started(&mut self, scenario: &Scenario) {
        if self.verbose {
            let line = format!("  Running: {} {}", self.tool, scenario.command);
            if self.bar.is_hidden() {
                println!("{line}");
            } else {
                self.bar.println(line);
            }
        }
        self.bar.set_message(scenario.name.clone());
    }

    fn finished(&mut self, _scenario: &Scenario, _record: &CapturedRecord) {
        self.bar.inc(1);
    }
}

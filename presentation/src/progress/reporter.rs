//! Progress reporting for turn execution

use colored::Colorize;
use fincounsel_application::{TurnProgress, TurnStage};
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

/// Spinner showing the current stage of a turn
pub struct ProgressReporter {
    spinner: ProgressBar,
}

impl ProgressReporter {
    pub fn new() -> Self {
        let spinner = ProgressBar::new_spinner();
        spinner.set_style(Self::spinner_style());
        spinner.enable_steady_tick(Duration::from_millis(80));
        Self { spinner }
    }

    fn spinner_style() -> ProgressStyle {
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {msg} {elapsed:.dim}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
    }
}

impl Default for ProgressReporter {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for ProgressReporter {
    fn drop(&mut self) {
        if !self.spinner.is_finished() {
            self.spinner.finish_and_clear();
        }
    }
}

impl TurnProgress for ProgressReporter {
    fn on_stage(&self, stage: TurnStage) {
        self.spinner.set_message(stage.label());
    }

    fn on_turn_complete(&self) {
        self.spinner.finish_and_clear();
    }
}

/// Simple text-based progress (no fancy UI)
///
/// Writes to stderr so JSON on stdout stays parseable.
pub struct SimpleProgress;

impl TurnProgress for SimpleProgress {
    fn on_stage(&self, stage: TurnStage) {
        eprintln!("{} {}", "->".cyan(), stage.label());
    }
}

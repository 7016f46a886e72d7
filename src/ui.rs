//! Terminal output: batch progress bar and coloured summaries.
//!
//! Uses `indicatif` for the progress bar and `console` for colours.
//! [`BatchProgress`] is the [`ProgressSink`] the CLI hands to the builder.

use console::Style;
use indicatif::{ProgressBar, ProgressStyle};

use crate::catalog::Category;
use crate::engine::{BatchReport, ProgressSink};
use crate::error::GeneratorError;
use crate::workflow::{Recurrence, StepKind, Workflow};

/// Progress bar over the whole batch.
///
/// Failures are printed above the bar in red; the final summary is green
/// when every ticket made it and yellow otherwise.
pub struct BatchProgress {
    pb: ProgressBar,
    green: Style,
    red: Style,
    yellow: Style,
}

impl BatchProgress {
    pub fn start(total: usize) -> Self {
        let pb = ProgressBar::new(total as u64);
        let style = ProgressStyle::default_bar()
            .template("{spinner:.cyan} [{bar:30.cyan/blue}] {pos}/{len} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar());
        pb.set_style(style.progress_chars("=> "));
        pb.enable_steady_tick(std::time::Duration::from_millis(100));

        Self {
            pb,
            green: Style::new().green().bold(),
            red: Style::new().red().bold(),
            yellow: Style::new().yellow(),
        }
    }

    /// Clears the bar and prints what was written where.
    pub fn finish(&self, report: &BatchReport, outputs: &[String]) {
        self.pb.finish_and_clear();
        let style = if report.failures.is_empty() {
            &self.green
        } else {
            &self.yellow
        };
        println!(
            "  {} {} tickets generated, {} failed",
            style.apply_to("✓"),
            report.tickets.len(),
            report.failures.len()
        );
        for out in outputs {
            println!("    → {out}");
        }
    }
}

impl ProgressSink for BatchProgress {
    fn category_started(&self, category: &str, count: usize) {
        self.pb.set_message(format!("{category} (0/{count})"));
    }

    fn ticket_done(&self, done: usize, total: usize, category: &str) {
        self.pb.inc(1);
        self.pb.set_message(format!("{category} ({done}/{total})"));
    }

    fn ticket_failed(&self, ticket_id: &str, error: &GeneratorError) {
        self.pb
            .println(format!("  {} {ticket_id}: {error}", self.red.apply_to("✗")));
    }
}

/// Category table with planned counts for `total`.
pub fn print_catalog(categories: &[Category], total: usize, default_workflow: &str) {
    let bold = Style::new().bold();
    println!(
        "{}",
        bold.apply_to(format!(
            "{:<6} {:<36} {:>6} {:>7}  {}",
            "CODE", "CATEGORY", "WEIGHT", "TICKETS", "WORKFLOW"
        ))
    );
    let mut planned = 0;
    for cat in categories {
        let count = cat.ticket_count(total);
        planned += count;
        println!(
            "{:<6} {:<36} {:>6.2} {:>7}  {}",
            cat.code,
            cat.name,
            cat.weight,
            count,
            cat.workflow.as_deref().unwrap_or(default_workflow)
        );
    }
    println!("{planned} of {total} tickets planned");
}

pub fn print_workflow(workflow: &Workflow) {
    let dim = Style::new().dim();
    println!("{}", Style::new().bold().apply_to(&workflow.name));
    for (i, step) in workflow.steps.iter().enumerate() {
        let kind = match step.kind {
            StepKind::Mandatory => "mandatory",
            StepKind::Optional => "optional",
        };
        let recurrence = match step.recurrence {
            Recurrence::Once => "once",
            Recurrence::Many => "many",
        };
        println!(
            "{:>3}. {} {}",
            i + 1,
            step.status,
            dim.apply_to(format!("[{kind}, {recurrence}, {}]", step.role))
        );
    }
}

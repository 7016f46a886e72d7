//! Simulated calendar: open-date draws and the per-ticket running clock.

use chrono::{Days, NaiveDate};
use rand::Rng;
use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};

use crate::error::GeneratorError;

/// Inclusive range of calendar days tickets may be opened in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self, GeneratorError> {
        if end < start {
            return Err(GeneratorError::Config(format!(
                "date range end {end} is before start {start}"
            )));
        }
        Ok(Self { start, end })
    }

    /// Number of days in the range, both ends included.
    pub fn days(&self) -> u64 {
        (self.end - self.start).num_days() as u64 + 1
    }

    #[cfg(test)]
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }
}

/// Inclusive window, in days, for one clock advance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DayWindow {
    pub min: u32,
    pub max: u32,
}

impl DayWindow {
    pub const fn new(min: u32, max: u32) -> Self {
        Self { min, max }
    }
}

/// Which kind of work separates an entry from the next one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepContext {
    /// Ordinary review/analysis step.
    Step,
    /// Remediation work for one corrective action.
    ActionExecution,
    /// Checking one corrective action.
    ActionValidation,
}

/// Per-category pacing of the clock.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DelayProfile {
    #[serde(default = "default_step_window")]
    pub step: DayWindow,
    #[serde(default = "default_execution_window")]
    pub execution: DayWindow,
    #[serde(default = "default_validation_window")]
    pub validation: DayWindow,
}

fn default_step_window() -> DayWindow {
    DayWindow::new(1, 5)
}

fn default_execution_window() -> DayWindow {
    DayWindow::new(5, 15)
}

fn default_validation_window() -> DayWindow {
    DayWindow::new(1, 5)
}

impl Default for DelayProfile {
    fn default() -> Self {
        Self {
            step: default_step_window(),
            execution: default_execution_window(),
            validation: default_validation_window(),
        }
    }
}

impl DelayProfile {
    /// Software fixes need builds, reviews and requalification.
    pub const fn slow() -> Self {
        Self {
            step: DayWindow::new(2, 7),
            execution: DayWindow::new(10, 25),
            validation: DayWindow::new(2, 7),
        }
    }

    /// Safety findings are escalated and closed quickly.
    pub const fn fast() -> Self {
        Self {
            step: DayWindow::new(1, 3),
            execution: DayWindow::new(3, 10),
            validation: DayWindow::new(1, 2),
        }
    }

    pub fn window(&self, ctx: StepContext) -> DayWindow {
        match ctx {
            StepContext::Step => self.step,
            StepContext::ActionExecution => self.execution,
            StepContext::ActionValidation => self.validation,
        }
    }

    pub fn validate(&self) -> Result<(), String> {
        for (name, w) in [
            ("step", self.step),
            ("execution", self.execution),
            ("validation", self.validation),
        ] {
            if w.min > w.max {
                return Err(format!("{name} window min {} > max {}", w.min, w.max));
            }
        }
        Ok(())
    }
}

/// Draws `count` open dates uniformly (with replacement) from `range`.
pub fn allocate_open_dates(rng: &mut StdRng, count: usize, range: DateRange) -> Vec<NaiveDate> {
    let span = range.days();
    (0..count)
        .map(|_| {
            let offset = rng.gen_range(0..span);
            range
                .start
                .checked_add_days(Days::new(offset))
                .unwrap_or(range.start)
        })
        .collect()
}

/// Moves the clock forward by a draw from the profile's window for `ctx`.
/// Never returns a date earlier than `current`.
pub fn advance(
    rng: &mut StdRng,
    current: NaiveDate,
    profile: &DelayProfile,
    ctx: StepContext,
) -> NaiveDate {
    let window = profile.window(ctx);
    let days = rng.gen_range(window.min..=window.max);
    current
        .checked_add_days(Days::new(u64::from(days)))
        .unwrap_or(current)
}

//! Bounded integer signals that size repeatable steps.
//!
//! A [`SignalSource`] produces raw text (an LLM answer, usually). The
//! `estimate_*` functions turn that into a number inside the documented
//! range and draw uniformly from the range whenever the source errors or
//! answers something unusable. They never fail.

use std::ops::RangeInclusive;

use rand::Rng;
use rand::rngs::StdRng;
use tracing::{debug, warn};

use crate::error::GeneratorError;

pub const COMPLEXITY_RANGE: RangeInclusive<u32> = 1..=3;
pub const ACTION_COUNT_RANGE: RangeInclusive<u32> = 1..=5;

pub trait SignalSource {
    /// Raw complexity answer for a description and its first analysis.
    async fn complexity_signal(
        &self,
        description: &str,
        first_analysis: &str,
    ) -> Result<String, GeneratorError>;

    /// Raw action-count answer for the ticket history so far.
    async fn action_count_signal(&self, history: &[String]) -> Result<String, GeneratorError>;
}

/// Source used when no backend is configured; every estimate is a random draw.
#[derive(Debug, Clone, Copy, Default)]
pub struct OfflineSignal;

impl SignalSource for OfflineSignal {
    async fn complexity_signal(&self, _: &str, _: &str) -> Result<String, GeneratorError> {
        Err(GeneratorError::OracleUnavailable("offline".into()))
    }

    async fn action_count_signal(&self, _: &[String]) -> Result<String, GeneratorError> {
        Err(GeneratorError::OracleUnavailable("offline".into()))
    }
}

/// Parses an integer answer and keeps it only if it lies in `range`.
pub fn parse_signal(raw: &str, range: &RangeInclusive<u32>) -> Option<u32> {
    let value = raw.trim().trim_end_matches('.').parse::<i64>().ok()?;
    u32::try_from(value).ok().filter(|v| range.contains(v))
}

fn resolve(
    signal: &str,
    raw: Result<String, GeneratorError>,
    range: RangeInclusive<u32>,
    rng: &mut StdRng,
) -> u32 {
    match raw {
        Ok(text) => match parse_signal(&text, &range) {
            Some(value) => value,
            None => {
                warn!(signal, raw = %text, "unusable oracle answer, drawing at random");
                rng.gen_range(range)
            }
        },
        Err(GeneratorError::OracleUnavailable(reason)) => {
            debug!(signal, %reason, "oracle unavailable, drawing at random");
            rng.gen_range(range)
        }
        Err(e) => {
            warn!(signal, error = %e, "oracle call failed, drawing at random");
            rng.gen_range(range)
        }
    }
}

/// Complexity in {1, 2, 3}.
pub async fn estimate_complexity(
    source: &impl SignalSource,
    rng: &mut StdRng,
    description: &str,
    first_analysis: &str,
) -> u32 {
    let raw = source.complexity_signal(description, first_analysis).await;
    resolve("complexity", raw, COMPLEXITY_RANGE, rng)
}

/// Number of corrective actions in [1, 5].
pub async fn estimate_action_count(
    source: &impl SignalSource,
    rng: &mut StdRng,
    history: &[String],
) -> u32 {
    let raw = source.action_count_signal(history).await;
    resolve("action_count", raw, ACTION_COUNT_RANGE, rng)
}

//! Selection of the observation that anchors growth estimation

use chrono::TimeDelta;

use crate::models::{Observation, SeasonWindow};

/// First observation at or after the end of the warm-up period.
///
/// Returns `None` when the season start is unknown or no observation has
/// been taken since the warm-up ended.
pub fn find_extrapolation_start<'a>(
    series: &'a [Observation],
    window: &SeasonWindow,
    warmup_weeks: u32,
) -> Option<&'a Observation> {
    let start = window.start_date?;
    let threshold = start + TimeDelta::weeks(i64::from(warmup_weeks));
    series.iter().find(|obs| obs.timestamp >= threshold)
}

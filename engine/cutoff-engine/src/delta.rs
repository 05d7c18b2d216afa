//! Weekly score deltas per faction bucket

use chrono::{DateTime, TimeDelta, Utc};

use crate::models::{
    CrossFactionSupport, Faction, Observation, SeasonWindow, WeeklyDelta, WeeklyGain,
};

/// Net change of each faction bucket between `from` and `to` (both inclusive).
///
/// When `is_first_week` is set and a bucket starts at the very first
/// observation of the series, that bucket's baseline is zero instead of the
/// first score. Buckets without observations in the window report zero.
pub fn compute_weekly_delta(
    series: &[Observation],
    mode: CrossFactionSupport,
    is_first_week: bool,
    from: DateTime<Utc>,
    to: DateTime<Utc>,
) -> WeeklyDelta {
    let delta = |belongs: &dyn Fn(&Observation) -> bool| {
        bucket_delta(series, is_first_week, from, to, belongs)
    };

    match mode {
        CrossFactionSupport::Complete => WeeklyDelta {
            combined_delta: delta(&|_| true),
            ..WeeklyDelta::default()
        },
        CrossFactionSupport::Partial => WeeklyDelta {
            combined_delta: delta(&|obs| obs.faction.is_none()),
            ..WeeklyDelta::default()
        },
        CrossFactionSupport::None => WeeklyDelta {
            horde_delta: delta(&|obs| obs.faction == Some(Faction::Horde)),
            alliance_delta: delta(&|obs| obs.faction == Some(Faction::Alliance)),
            combined_delta: 0.0,
        },
    }
}

fn bucket_delta(
    series: &[Observation],
    is_first_week: bool,
    from: DateTime<Utc>,
    to: DateTime<Utc>,
    belongs: &dyn Fn(&Observation) -> bool,
) -> f64 {
    let mut bucket = series
        .iter()
        .enumerate()
        .filter(|(_, obs)| obs.timestamp >= from && obs.timestamp <= to && belongs(obs));

    let Some((start_index, start)) = bucket.next() else {
        return 0.0;
    };
    let end = bucket.last().map_or(start, |(_, obs)| obs);

    // Position check, not value check: only the series head counts as "no prior progress".
    let baseline = if is_first_week && start_index == 0 { 0.0 } else { start.score };
    end.score - baseline
}

/// Weekly deltas for every elapsed week since the region's season start.
///
/// Weeks are consecutive 7-day windows anchored at the start date; the table
/// stops at `now` or at the season end, whichever comes first. Regions
/// without a start date have no table.
pub fn weekly_gains(
    series: &[Observation],
    mode: CrossFactionSupport,
    window: &SeasonWindow,
    now: DateTime<Utc>,
) -> Vec<WeeklyGain> {
    let Some(start) = window.start_date else {
        return Vec::new();
    };
    let until = window.end_date.map_or(now, |end| end.min(now));

    let mut gains = Vec::new();
    let mut from = start;
    let mut week = 0u32;
    while from < until {
        let to = from + TimeDelta::weeks(1);
        gains.push(WeeklyGain {
            week,
            from,
            to,
            delta: compute_weekly_delta(series, mode, week == 0, from, to),
        });
        from = to;
        week += 1;
    }
    gains
}

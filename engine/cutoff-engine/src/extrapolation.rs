//! Growth estimation and projected trajectory
//!
//! Two strategies project the cutoff forward:
//!
//! * **Weighted recent growth** - when enough post-warm-up weekly samples exist
//!   and more than a day remains, the weekly deltas are averaged with recency
//!   weights (latest week 1.0, each older week one step less, floored) and
//!   turned into a daily increment.
//! * **Linear ratio** - otherwise the growth between the anchor observation
//!   and the latest observation is scaled to the remaining time.
//!
//! A dense day-by-day curve is emitted when more than one day remains, a
//! two-point segment otherwise. Every projected score is rounded to one
//! decimal place.

use chrono::{DateTime, NaiveDate, TimeDelta, TimeZone, Timelike, Utc};
use tracing::debug;

use crate::anchor::find_extrapolation_start;
use crate::config::ExtrapolationParameters;
use crate::delta::weekly_gains;
use crate::models::{
    days_to_duration, fractional_days, CrossFactionSupport, Faction, FactionForecast,
    ForecastPoint, ForecastResult, Observation, Region, Season, SeasonWindow,
};

/// Resolved forecast target
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Horizon {
    /// Instant the forecast projects to
    pub working_end: DateTime<Utc>,
    /// Fractional days from now until `working_end`
    pub days_until_end: f64,
}

/// Round half away from zero on the tenths digit
pub fn round_to_tenth(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// Recency weight of the `index`-th of `count` weekly samples (oldest first)
pub fn recency_weight(params: &ExtrapolationParameters, index: usize, count: usize) -> f64 {
    let age = count.saturating_sub(index + 1) as f64;
    (1.0 - age / params.weight_horizon_weeks).max(params.min_weight)
}

/// Recency weighted average daily growth.
///
/// The weighted sum is divided by the sample count, not the weight total.
/// Callers must pass at least one sample.
pub fn weighted_daily_growth(params: &ExtrapolationParameters, samples: &[f64]) -> f64 {
    debug_assert!(!samples.is_empty(), "weighted growth needs at least one sample");
    let count = samples.len();
    let weighted: f64 = samples
        .iter()
        .enumerate()
        .map(|(index, delta)| delta * recency_weight(params, index, count))
        .sum();
    weighted / count as f64 / 7.0
}

/// Non-zero combined weekly deltas since the season start, minus the warm-up weeks.
///
/// The combined (untagged) bucket is read regardless of the faction mode.
pub fn weekly_growth_samples(
    params: &ExtrapolationParameters,
    window: &SeasonWindow,
    mode: CrossFactionSupport,
    series: &[Observation],
    now: DateTime<Utc>,
) -> Vec<f64> {
    weekly_gains(series, mode, window, now)
        .into_iter()
        .map(|gain| gain.delta.combined_delta)
        .filter(|delta| *delta != 0.0 && !delta.is_nan())
        .skip(params.warmup_weeks as usize)
        .collect()
}

/// Split a region's series into the buckets that get their own forecast.
///
/// `none` forecasts horde and alliance separately, `partial` only the
/// untagged (combined) leaderboard, `complete` the whole series.
pub fn extrapolation_buckets(
    series: &[Observation],
    mode: CrossFactionSupport,
) -> Vec<(Option<Faction>, Vec<Observation>)> {
    let with_faction = |faction: Option<Faction>| -> Vec<Observation> {
        series.iter().filter(|obs| obs.faction == faction).cloned().collect()
    };

    match mode {
        CrossFactionSupport::Complete => vec![(None, series.to_vec())],
        CrossFactionSupport::Partial => vec![(None, with_faction(None))],
        CrossFactionSupport::None => vec![
            (Some(Faction::Horde), with_faction(Some(Faction::Horde))),
            (Some(Faction::Alliance), with_faction(Some(Faction::Alliance))),
        ],
    }
}

/// Forecast that reaches furthest; on equal end instants the higher projected score wins
pub fn furthest_forecast(forecasts: &[FactionForecast]) -> ForecastResult {
    forecasts
        .iter()
        .filter_map(|f| f.forecast.last_point().map(|point| (point, &f.forecast)))
        .max_by(|(a, _), (b, _)| {
            a.timestamp.cmp(&b.timestamp).then(a.score.total_cmp(&b.score))
        })
        .map(|(_, forecast)| forecast.clone())
        .unwrap_or(ForecastResult::None)
}

/// Move an override calendar date onto the season start's hour of day (UTC)
pub fn retime_override(date: NaiveDate, start: DateTime<Utc>) -> Option<DateTime<Utc>> {
    date.and_hms_opt(start.hour(), 0, 0)
        .map(|naive| Utc.from_utc_datetime(&naive))
}

/// Parse a `YYYY-MM-DD` override; anything unparseable or not after today is ignored
pub fn parse_override_date(input: &str, now: DateTime<Utc>) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(input.trim(), "%Y-%m-%d")
        .ok()
        .filter(|date| *date > now.date_naive())
}

/// Work out where the forecast ends.
///
/// An announced season end always wins. Without one, a future override is
/// used; otherwise the default horizon is laid out from the last observation.
/// `None` when the default horizon runs past the representable time range.
pub fn resolve_horizon(
    params: &ExtrapolationParameters,
    window: &SeasonWindow,
    start: DateTime<Utc>,
    override_date: Option<NaiveDate>,
    last: &Observation,
    now: DateTime<Utc>,
) -> Option<Horizon> {
    let target_end = match window.end_date {
        Some(end) => Some(end),
        None => override_date
            .and_then(|date| retime_override(date, start))
            .filter(|end| *end > now),
    };

    match target_end {
        Some(end) => Some(Horizon { working_end: end, days_until_end: fractional_days(end - now) }),
        None => {
            let working_end = days_to_duration(params.default_horizon_days)
                .and_then(|span| last.timestamp.checked_add_signed(span))?;
            Some(Horizon { working_end, days_until_end: params.default_horizon_days })
        }
    }
}

/// Project a region's series forward.
///
/// The faction mode picks the bucket that is projected: the whole series
/// under `complete`, the untagged observations under `partial`. Under `none`
/// each faction is projected on its own and the one reaching furthest is
/// returned; [`extrapolate_factions`] yields both.
pub fn extrapolate(
    params: &ExtrapolationParameters,
    window: &SeasonWindow,
    mode: CrossFactionSupport,
    series: &[Observation],
    override_date: Option<NaiveDate>,
    now: DateTime<Utc>,
) -> ForecastResult {
    furthest_forecast(&extrapolate_factions(params, window, mode, series, override_date, now))
}

/// One forecast per faction bucket of a region's series
pub fn extrapolate_factions(
    params: &ExtrapolationParameters,
    window: &SeasonWindow,
    mode: CrossFactionSupport,
    series: &[Observation],
    override_date: Option<NaiveDate>,
    now: DateTime<Utc>,
) -> Vec<FactionForecast> {
    extrapolation_buckets(series, mode)
        .into_iter()
        .map(|(faction, bucket)| FactionForecast {
            faction,
            forecast: extrapolate_bucket(params, window, mode, series, &bucket, override_date, now),
        })
        .collect()
}

/// Same as [`extrapolate`] for a region of a season, with default parameters
pub fn compute_extrapolation(
    season: &Season,
    region: Region,
    series: &[Observation],
    override_date: Option<NaiveDate>,
    now: DateTime<Utc>,
) -> ForecastResult {
    extrapolate(
        &ExtrapolationParameters::default(),
        &season.window(region),
        season.cross_faction_support,
        series,
        override_date,
        now,
    )
}

/// Project one bucket. Weekly growth samples come from the full series.
fn extrapolate_bucket(
    params: &ExtrapolationParameters,
    window: &SeasonWindow,
    mode: CrossFactionSupport,
    series: &[Observation],
    bucket: &[Observation],
    override_date: Option<NaiveDate>,
    now: DateTime<Utc>,
) -> ForecastResult {
    let Some(last) = bucket.last() else {
        return ForecastResult::None;
    };
    if window.has_ended(now) {
        debug!("Season already ended, no forecast");
        return ForecastResult::None;
    }
    let Some(start) = window.start_date else {
        return ForecastResult::None;
    };
    let Some(anchor) = find_extrapolation_start(bucket, window, params.warmup_weeks) else {
        debug!("No observation past the {}-week warm-up yet", params.warmup_weeks);
        return ForecastResult::None;
    };
    let Some(horizon) = resolve_horizon(params, window, start, override_date, last, now) else {
        debug!("Default horizon of {} days is out of range", params.default_horizon_days);
        return ForecastResult::None;
    };

    let samples = weekly_growth_samples(params, window, mode, series, now);
    let more_than_a_day = horizon.days_until_end > 1.0;

    if samples.len() >= params.min_weighted_samples && more_than_a_day {
        let daily_increment = weighted_daily_growth(params, &samples);
        let end_score = round_to_tenth(last.score + daily_increment * horizon.days_until_end);
        debug!(
            "Weighted growth over {} weeks: {:.3}/day, {:.2} days left, end score {:.1}",
            samples.len(),
            daily_increment,
            horizon.days_until_end,
            end_score
        );
        return trajectory(last, &horizon, daily_increment, end_score);
    }

    let days_passed = fractional_days(last.timestamp - anchor.timestamp);
    if days_passed <= 0.0 {
        debug!("Anchor is the latest observation, growth rate unknown");
        return ForecastResult::None;
    }
    let factor = horizon.days_until_end / days_passed;
    let end_score = round_to_tenth(last.score + (last.score - anchor.score) * factor);
    debug!(
        "Linear ratio: {:.2} days passed, factor {:.3}, end score {:.1}",
        days_passed, factor, end_score
    );

    if more_than_a_day {
        let daily_increment = (end_score - last.score) / horizon.days_until_end;
        trajectory(last, &horizon, daily_increment, end_score)
    } else {
        segment(last, horizon.working_end, end_score)
    }
}

/// Dense curve from the last observation to the working end.
///
/// Falls back to a segment when the span is too short for strictly
/// increasing millisecond timestamps.
fn trajectory(
    last: &Observation,
    horizon: &Horizon,
    daily_increment: f64,
    end_score: f64,
) -> ForecastResult {
    let span_ms = (horizon.working_end - last.timestamp).num_milliseconds() as f64;
    let interval_ms = span_ms / horizon.days_until_end;
    if !(interval_ms >= 1.0) {
        return segment(last, horizon.working_end, end_score);
    }

    let mut points = Vec::with_capacity(horizon.days_until_end.ceil() as usize + 1);
    points.push(last.point());

    let mut day = 1u32;
    while f64::from(day) < horizon.days_until_end {
        let offset = TimeDelta::milliseconds((interval_ms * f64::from(day)).floor() as i64);
        points.push(ForecastPoint {
            timestamp: last.timestamp + offset,
            score: round_to_tenth(last.score + daily_increment * f64::from(day)),
        });
        day += 1;
    }

    points.push(ForecastPoint { timestamp: horizon.working_end, score: end_score });
    ForecastResult::DenseCurve(points)
}

/// Two-point projection; nothing when the last observation is already at or past the end
fn segment(last: &Observation, working_end: DateTime<Utc>, end_score: f64) -> ForecastResult {
    if working_end <= last.timestamp {
        debug!("Last observation is not before the working end, no segment");
        return ForecastResult::None;
    }
    ForecastResult::Segment {
        from: last.clone(),
        to: ForecastPoint { timestamp: working_end, score: end_score },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn start() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 4, 23, 15, 0, 0).unwrap()
    }

    fn day(n: f64) -> DateTime<Utc> {
        start() + days_to_duration(n).unwrap()
    }

    #[test]
    fn test_round_to_tenth() {
        assert_eq!(round_to_tenth(116.8666), 116.9);
        assert_eq!(round_to_tenth(2.25), 2.3);
        assert_eq!(round_to_tenth(-2.25), -2.3);
        assert_eq!(round_to_tenth(100.0), 100.0);
    }

    #[test]
    fn test_recency_weights() {
        let params = ExtrapolationParameters::default();
        let weights: Vec<f64> = (0..6).map(|i| recency_weight(&params, i, 6)).collect();
        let expected = [0.5, 0.6, 0.7, 0.8, 0.9, 1.0];
        for (weight, want) in weights.iter().zip(expected) {
            assert!((weight - want).abs() < 1e-12, "{weight} != {want}");
        }

        // Weeks beyond the horizon bottom out at the floor.
        assert_eq!(recency_weight(&params, 0, 15), 0.1);
        assert_eq!(recency_weight(&params, 14, 15), 1.0);
    }

    #[test]
    fn test_weighted_daily_growth_divides_by_count() {
        let params = ExtrapolationParameters::default();
        let growth = weighted_daily_growth(&params, &[5.0, 6.0, 4.0, 5.0, 6.0, 7.0]);
        let expected =
            (5.0 * 0.5 + 6.0 * 0.6 + 4.0 * 0.7 + 5.0 * 0.8 + 6.0 * 0.9 + 7.0) / 6.0 / 7.0;
        assert!((growth - expected).abs() < 1e-12);
    }

    #[test]
    fn test_parse_override_date() {
        let now = Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap();
        assert_eq!(
            parse_override_date("2024-07-15", now),
            NaiveDate::from_ymd_opt(2024, 7, 15)
        );
        assert_eq!(parse_override_date("2024-06-01", now), None);
        assert_eq!(parse_override_date("2024-05-01", now), None);
        assert_eq!(parse_override_date("15/07/2024", now), None);
        assert_eq!(parse_override_date("", now), None);
    }

    #[test]
    fn test_retime_override_uses_start_hour() {
        let date = NaiveDate::from_ymd_opt(2024, 7, 15).unwrap();
        let retimed = retime_override(date, start()).unwrap();
        assert_eq!(retimed, Utc.with_ymd_and_hms(2024, 7, 15, 15, 0, 0).unwrap());
    }

    #[test]
    fn test_announced_end_beats_override() {
        let params = ExtrapolationParameters::default();
        let window = SeasonWindow::new(Some(start()), Some(day(70.0)));
        let last = Observation::new(day(40.0), 100.0);
        let override_date = NaiveDate::from_ymd_opt(2030, 1, 1);

        let horizon =
            resolve_horizon(&params, &window, start(), override_date, &last, day(42.0)).unwrap();
        assert_eq!(horizon.working_end, day(70.0));
        assert_eq!(horizon.days_until_end, 28.0);
    }

    #[test]
    fn test_past_override_falls_back_to_default_horizon() {
        let params = ExtrapolationParameters::default();
        let window = SeasonWindow::new(Some(start()), None);
        let last = Observation::new(day(40.0), 100.0);
        let override_date = Some(day(30.0).date_naive());

        let horizon =
            resolve_horizon(&params, &window, start(), override_date, &last, day(42.0)).unwrap();
        assert_eq!(horizon.working_end, day(61.0));
        assert_eq!(horizon.days_until_end, 21.0);
    }

    #[test]
    fn test_early_exits() {
        let params = ExtrapolationParameters::default();
        let series = vec![Observation::new(day(30.0), 100.0), Observation::new(day(40.0), 150.0)];
        let mode = CrossFactionSupport::Complete;

        let ended = SeasonWindow::new(Some(start()), Some(day(41.0)));
        assert!(extrapolate(&params, &ended, mode, &series, None, day(42.0)).is_none());

        let unknown_start = SeasonWindow::new(None, Some(day(70.0)));
        assert!(extrapolate(&params, &unknown_start, mode, &series, None, day(42.0)).is_none());

        let window = SeasonWindow::new(Some(start()), Some(day(70.0)));
        assert!(extrapolate(&params, &window, mode, &[], None, day(42.0)).is_none());

        let in_warmup = vec![Observation::new(day(20.0), 50.0)];
        assert!(extrapolate(&params, &window, mode, &in_warmup, None, day(21.0)).is_none());
    }

    #[test]
    fn test_anchor_equal_to_last_yields_no_forecast() {
        let params = ExtrapolationParameters::default();
        let window = SeasonWindow::new(Some(start()), Some(day(70.0)));
        let series = vec![Observation::new(day(10.0), 20.0), Observation::new(day(30.0), 100.0)];
        let mode = CrossFactionSupport::Complete;
        let result = extrapolate(&params, &window, mode, &series, None, day(31.0));
        assert!(result.is_none());
    }

    #[test]
    fn test_oversized_default_horizon_yields_no_forecast() {
        let params = ExtrapolationParameters { default_horizon_days: 1e12, ..Default::default() };
        let window = SeasonWindow::new(Some(start()), None);
        let series = vec![Observation::new(day(28.0), 50.0), Observation::new(day(35.0), 60.0)];

        let last = series.last().unwrap();
        assert!(resolve_horizon(&params, &window, start(), None, last, day(36.0)).is_none());

        let mode = CrossFactionSupport::Complete;
        assert!(extrapolate(&params, &window, mode, &series, None, day(36.0)).is_none());
    }

    #[test]
    fn test_future_dated_last_observation_has_no_segment() {
        let params = ExtrapolationParameters::default();
        let window = SeasonWindow::new(Some(start()), Some(day(40.0)));
        let series = vec![
            Observation::new(day(0.0), 0.0),
            Observation::new(day(28.0), 50.0),
            Observation::new(day(41.0), 70.0),
        ];

        // 0.2 days left, but the latest snapshot is already past the end.
        let mode = CrossFactionSupport::Complete;
        let result = extrapolate(&params, &window, mode, &series, None, day(39.8));
        assert!(result.is_none());
    }

    #[test]
    fn test_buckets_follow_faction_mode() {
        let series = vec![
            Observation::tagged(day(1.0), 10.0, Faction::Horde),
            Observation::new(day(2.0), 20.0),
            Observation::tagged(day(3.0), 30.0, Faction::Alliance),
        ];

        let complete = extrapolation_buckets(&series, CrossFactionSupport::Complete);
        assert_eq!(complete, vec![(None, series.clone())]);

        let partial = extrapolation_buckets(&series, CrossFactionSupport::Partial);
        assert_eq!(partial, vec![(None, vec![series[1].clone()])]);

        let none = extrapolation_buckets(&series, CrossFactionSupport::None);
        assert_eq!(
            none,
            vec![
                (Some(Faction::Horde), vec![series[0].clone()]),
                (Some(Faction::Alliance), vec![series[2].clone()]),
            ]
        );
    }

    #[test]
    fn test_furthest_forecast_prefers_later_then_higher() {
        let from = Observation::new(day(35.0), 60.0);
        let segment_to = |ts, score| FactionForecast {
            faction: None,
            forecast: ForecastResult::Segment {
                from: from.clone(),
                to: ForecastPoint { timestamp: ts, score },
            },
        };

        let forecasts = vec![
            segment_to(day(40.0), 500.0),
            segment_to(day(42.0), 80.0),
            segment_to(day(42.0), 90.0),
            FactionForecast { faction: None, forecast: ForecastResult::None },
        ];
        let furthest = furthest_forecast(&forecasts);
        assert_eq!(
            furthest.last_point(),
            Some(ForecastPoint { timestamp: day(42.0), score: 90.0 })
        );
        assert!(furthest_forecast(&[]).is_none());
    }
}

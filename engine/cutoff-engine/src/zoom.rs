//! Initial chart zoom window

use chrono::{DateTime, Utc};

use crate::config::ZoomParameters;
use crate::models::{
    days_to_duration, ForecastResult, Observation, Region, Season, SeasonWindow, ZoomWindow,
};

/// Look-back in days for the given time left and forecast presence
pub fn lookback_days(
    params: &ZoomParameters,
    days_until_end: Option<f64>,
    has_forecast: bool,
) -> f64 {
    match days_until_end {
        Some(days) if days < 1.0 => params.final_day_lookback_days,
        Some(days) if days < 7.0 => {
            if has_forecast {
                params.final_week_lookback_days_with_forecast
            } else {
                params.final_week_lookback_days
            }
        }
        _ => {
            if has_forecast {
                params.lookback_days_with_forecast
            } else {
                params.lookback_days
            }
        }
    }
}

/// Pick the initially visible time range for a region's chart.
///
/// The window ends at the last forecast point (or the last observation) and
/// starts at the latest observation strictly before the look-back threshold,
/// or at the Unix epoch when none qualifies (including a threshold before
/// the representable time range). Empty series have no window.
pub fn select_zoom_window(
    params: &ZoomParameters,
    window: &SeasonWindow,
    series: &[Observation],
    forecast: &ForecastResult,
    now: DateTime<Utc>,
) -> Option<ZoomWindow> {
    let last = series.last()?;
    let end = forecast.last_point().map_or(last.timestamp, |point| point.timestamp);
    let lookback = lookback_days(params, window.days_until_end(now), !forecast.is_none());
    let threshold = days_to_duration(lookback).and_then(|span| end.checked_sub_signed(span));

    let start = threshold
        .and_then(|threshold| {
            series.iter().rev().map(|obs| obs.timestamp).find(|ts| *ts < threshold)
        })
        .unwrap_or(DateTime::<Utc>::UNIX_EPOCH);

    Some(ZoomWindow { start, end })
}

/// Same as [`select_zoom_window`] for a region of a season, with default parameters
pub fn compute_zoom_window(
    season: &Season,
    region: Region,
    series: &[Observation],
    forecast: &ForecastResult,
    now: DateTime<Utc>,
) -> Option<ZoomWindow> {
    select_zoom_window(&ZoomParameters::default(), &season.window(region), series, forecast, now)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ForecastPoint;
    use chrono::{TimeDelta, TimeZone};

    fn start() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 4, 23, 15, 0, 0).unwrap()
    }

    fn day(n: i64) -> DateTime<Utc> {
        start() + TimeDelta::days(n)
    }

    fn daily_series(days: i64) -> Vec<Observation> {
        (0..=days).map(|d| Observation::new(day(d), d as f64 * 10.0)).collect()
    }

    #[test]
    fn test_lookback_selection() {
        let params = ZoomParameters::default();
        assert_eq!(lookback_days(&params, Some(0.5), true), 8.0);
        assert_eq!(lookback_days(&params, Some(-3.0), false), 8.0);
        assert_eq!(lookback_days(&params, Some(1.0), true), 21.0);
        assert_eq!(lookback_days(&params, Some(6.9), false), 14.0);
        assert_eq!(lookback_days(&params, Some(7.0), true), 42.0);
        assert_eq!(lookback_days(&params, None, false), 28.0);
    }

    #[test]
    fn test_empty_series_has_no_window() {
        let window = SeasonWindow::new(Some(start()), None);
        let params = ZoomParameters::default();
        let zoom = select_zoom_window(&params, &window, &[], &ForecastResult::None, day(10));
        assert!(zoom.is_none());
    }

    #[test]
    fn test_without_forecast_ends_at_last_observation() {
        let series = daily_series(60);
        let window = SeasonWindow::new(Some(start()), None);
        let params = ZoomParameters::default();
        let zoom =
            select_zoom_window(&params, &window, &series, &ForecastResult::None, day(60)).unwrap();
        assert_eq!(zoom.end, day(60));
        // 4 weeks back is day 32; the latest observation strictly before it is day 31.
        assert_eq!(zoom.start, day(31));
    }

    #[test]
    fn test_forecast_extends_the_window() {
        let series = daily_series(60);
        let window = SeasonWindow::new(Some(start()), Some(day(80)));
        let forecast = ForecastResult::Segment {
            from: series[60].clone(),
            to: ForecastPoint { timestamp: day(80), score: 800.0 },
        };
        let params = ZoomParameters::default();
        let zoom = select_zoom_window(&params, &window, &series, &forecast, day(60)).unwrap();
        assert_eq!(zoom.end, day(80));
        // 6 weeks before day 80 is day 38.
        assert_eq!(zoom.start, day(37));
    }

    #[test]
    fn test_final_day_lookback() {
        let series = daily_series(60);
        let window = SeasonWindow::new(Some(start()), Some(day(60) + TimeDelta::hours(12)));
        let params = ZoomParameters::default();
        let zoom =
            select_zoom_window(&params, &window, &series, &ForecastResult::None, day(60)).unwrap();
        assert_eq!(zoom.start, day(51));
    }

    #[test]
    fn test_falls_back_to_epoch() {
        let series = daily_series(5);
        let window = SeasonWindow::new(Some(start()), None);
        let params = ZoomParameters::default();
        let zoom =
            select_zoom_window(&params, &window, &series, &ForecastResult::None, day(5)).unwrap();
        assert_eq!(zoom.start, DateTime::<Utc>::UNIX_EPOCH);
        assert_eq!(zoom.end, day(5));
    }

    #[test]
    fn test_oversized_lookback_falls_back_to_epoch() {
        let series = daily_series(60);
        let window = SeasonWindow::new(Some(start()), None);
        let params = ZoomParameters { lookback_days: 1e12, ..Default::default() };
        let zoom =
            select_zoom_window(&params, &window, &series, &ForecastResult::None, day(60)).unwrap();
        assert_eq!(zoom.start, DateTime::<Utc>::UNIX_EPOCH);
        assert_eq!(zoom.end, day(60));
    }
}

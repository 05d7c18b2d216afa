use chrono::{DateTime, NaiveDate, Utc};

use crate::config::ForecastConfig;
use crate::delta::{compute_weekly_delta, weekly_gains};
use crate::extrapolation::{extrapolate, extrapolate_factions};
use crate::models::*;
use crate::zoom::select_zoom_window;

/// Forecast calculator bound to one configuration
#[derive(Debug, Clone, Default)]
pub struct CutoffCalculator {
    config: ForecastConfig,
}

impl CutoffCalculator {
    /// Create a new cutoff calculator
    pub fn new(config: ForecastConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ForecastConfig {
        &self.config
    }

    /// Project a region's series to the season end, the override date or the default horizon
    pub fn extrapolate(
        &self,
        season: &Season,
        region: Region,
        series: &[Observation],
        override_date: Option<NaiveDate>,
        now: DateTime<Utc>,
    ) -> ForecastResult {
        extrapolate(
            &self.config.extrapolation,
            &season.window(region),
            season.cross_faction_support,
            series,
            override_date,
            now,
        )
    }

    /// One forecast per faction bucket the season's mode tracks
    pub fn extrapolate_factions(
        &self,
        season: &Season,
        region: Region,
        series: &[Observation],
        override_date: Option<NaiveDate>,
        now: DateTime<Utc>,
    ) -> Vec<FactionForecast> {
        extrapolate_factions(
            &self.config.extrapolation,
            &season.window(region),
            season.cross_faction_support,
            series,
            override_date,
            now,
        )
    }

    /// Initial chart window for a region's series and forecast
    pub fn zoom_window(
        &self,
        season: &Season,
        region: Region,
        series: &[Observation],
        forecast: &ForecastResult,
        now: DateTime<Utc>,
    ) -> Option<ZoomWindow> {
        select_zoom_window(&self.config.zoom, &season.window(region), series, forecast, now)
    }

    /// Net change per faction bucket within `[from, to]`
    pub fn weekly_delta(
        &self,
        series: &[Observation],
        mode: CrossFactionSupport,
        is_first_week: bool,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> WeeklyDelta {
        compute_weekly_delta(series, mode, is_first_week, from, to)
    }

    /// Weekly gains table for a region
    pub fn weekly_gains(
        &self,
        season: &Season,
        region: Region,
        series: &[Observation],
        now: DateTime<Utc>,
    ) -> Vec<WeeklyGain> {
        weekly_gains(series, season.cross_faction_support, &season.window(region), now)
    }
}

use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;
use std::str::FromStr;

use crate::error::{CutoffError, Result};

/// Milliseconds in one day
pub const DAY_MS: f64 = 86_400_000.0;

/// Convert a signed duration into fractional days
pub fn fractional_days(delta: TimeDelta) -> f64 {
    delta.num_milliseconds() as f64 / DAY_MS
}

/// Duration covering a (possibly fractional) number of days, truncated to whole milliseconds.
///
/// `None` when the span does not fit in a `TimeDelta`.
pub fn days_to_duration(days: f64) -> Option<TimeDelta> {
    let ms = days * DAY_MS;
    if !ms.is_finite() {
        return None;
    }
    TimeDelta::try_milliseconds(ms as i64)
}

/// Faction a leaderboard snapshot belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Faction {
    Horde,
    Alliance,
}

/// How the ranking metric treats factions for a season
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CrossFactionSupport {
    /// Every observation is faction tagged; factions are tracked separately
    None,
    /// Tagged and untagged observations coexist; untagged is the combined leaderboard
    Partial,
    /// No observation is tagged; one combined series
    #[default]
    Complete,
}

/// Leaderboard region
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Region {
    Us,
    Eu,
    Kr,
    Tw,
}

impl Region {
    pub fn as_str(&self) -> &'static str {
        match self {
            Region::Us => "us",
            Region::Eu => "eu",
            Region::Kr => "kr",
            Region::Tw => "tw",
        }
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Region {
    type Err = CutoffError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "us" => Ok(Region::Us),
            "eu" => Ok(Region::Eu),
            "kr" => Ok(Region::Kr),
            "tw" => Ok(Region::Tw),
            other => Err(CutoffError::UnknownRegion(other.to_string())),
        }
    }
}

/// One score snapshot of the cutoff
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub timestamp: DateTime<Utc>,
    pub score: f64,
    /// Absent for the combined / cross-faction leaderboard
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub faction: Option<Faction>,
}

impl Observation {
    pub fn new(timestamp: DateTime<Utc>, score: f64) -> Self {
        Self { timestamp, score, faction: None }
    }

    pub fn tagged(timestamp: DateTime<Utc>, score: f64, faction: Faction) -> Self {
        Self { timestamp, score, faction: Some(faction) }
    }

    pub fn point(&self) -> ForecastPoint {
        ForecastPoint { timestamp: self.timestamp, score: self.score }
    }
}

/// Start and end of a season in one region
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SeasonWindow {
    #[serde(default, with = "chrono::serde::ts_milliseconds_option")]
    pub start_date: Option<DateTime<Utc>>,
    #[serde(default, with = "chrono::serde::ts_milliseconds_option")]
    pub end_date: Option<DateTime<Utc>>,
}

impl SeasonWindow {
    pub fn new(start_date: Option<DateTime<Utc>>, end_date: Option<DateTime<Utc>>) -> Self {
        Self { start_date, end_date }
    }

    /// Fractional days from `now` to the announced end; negative once the end has passed
    pub fn days_until_end(&self, now: DateTime<Utc>) -> Option<f64> {
        self.end_date.map(|end| fractional_days(end - now))
    }

    pub fn has_ended(&self, now: DateTime<Utc>) -> bool {
        self.end_date.is_some_and(|end| end <= now)
    }
}

/// Season metadata shared by all regions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Season {
    pub slug: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub cross_faction_support: CrossFactionSupport,
    #[serde(default)]
    pub windows: BTreeMap<Region, SeasonWindow>,
}

impl Season {
    /// Window for a region; regions without a schedule get an empty window
    pub fn window(&self, region: Region) -> SeasonWindow {
        self.windows.get(&region).copied().unwrap_or_default()
    }
}

/// A projected `(timestamp, score)` pair
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ForecastPoint {
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub timestamp: DateTime<Utc>,
    pub score: f64,
}

/// Outcome of extrapolating one series
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "data", rename_all = "snake_case")]
pub enum ForecastResult {
    /// No forecast for this series
    None,
    /// Daily projected trajectory starting at the last real observation
    DenseCurve(Vec<ForecastPoint>),
    /// Minimal projection used when too little time remains
    Segment { from: Observation, to: ForecastPoint },
}

impl ForecastResult {
    pub fn is_none(&self) -> bool {
        matches!(self, ForecastResult::None)
    }

    /// Final projected point, if any
    pub fn last_point(&self) -> Option<ForecastPoint> {
        match self {
            ForecastResult::None => None,
            ForecastResult::DenseCurve(points) => points.last().copied(),
            ForecastResult::Segment { to, .. } => Some(*to),
        }
    }

    /// All points in chart order
    pub fn points(&self) -> Vec<ForecastPoint> {
        match self {
            ForecastResult::None => Vec::new(),
            ForecastResult::DenseCurve(points) => points.clone(),
            ForecastResult::Segment { from, to } => vec![from.point(), *to],
        }
    }
}

/// Net score change of each faction bucket over one week
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct WeeklyDelta {
    pub horde_delta: f64,
    pub alliance_delta: f64,
    pub combined_delta: f64,
}

/// One row of the weekly gains table
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WeeklyGain {
    /// Zero based week index since the season start
    pub week: u32,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub from: DateTime<Utc>,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub to: DateTime<Utc>,
    pub delta: WeeklyDelta,
}

/// Initially visible time range of the chart
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ZoomWindow {
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub start: DateTime<Utc>,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub end: DateTime<Utc>,
}

/// Input document: season metadata plus every region's observations
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeasonSnapshot {
    pub season: Season,
    #[serde(default)]
    pub series: BTreeMap<Region, Vec<Observation>>,
}

impl SeasonSnapshot {
    /// Load a snapshot from a JSON file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let snapshot: SeasonSnapshot = serde_json::from_str(&content)?;
        Ok(snapshot)
    }

    /// Observations for a region, empty when the region is not reporting yet
    pub fn series_for(&self, region: Region) -> &[Observation] {
        self.series.get(&region).map(Vec::as_slice).unwrap_or(&[])
    }
}

/// Forecast of one faction bucket (or the combined series when `faction` is absent)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FactionForecast {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub faction: Option<Faction>,
    pub forecast: ForecastResult,
}

/// Everything the chart needs for one region
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegionForecast {
    pub region: Region,
    pub forecasts: Vec<FactionForecast>,
    pub zoom: Option<ZoomWindow>,
    pub weekly_gains: Vec<WeeklyGain>,
}

/// Result of forecasting every region of a season
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeasonForecast {
    pub season: String,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub generated_at: DateTime<Utc>,
    pub regions: BTreeMap<Region, RegionForecast>,
}

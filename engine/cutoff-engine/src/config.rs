use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{CutoffError, Result};
use crate::{
    DEFAULT_HORIZON_DAYS, DEFAULT_MIN_WEIGHT, DEFAULT_MIN_WEIGHTED_SAMPLES,
    DEFAULT_WARMUP_WEEKS, DEFAULT_WEIGHT_HORIZON_WEEKS, MAX_SPAN_DAYS,
};

/// Configuration for the cutoff engine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct ForecastConfig {
    /// Growth estimation and trajectory parameters
    #[serde(default)]
    pub extrapolation: ExtrapolationParameters,

    /// Initial chart window parameters
    #[serde(default)]
    pub zoom: ZoomParameters,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtrapolationParameters {
    /// Weeks after the season start excluded from growth estimation
    pub warmup_weeks: u32,

    /// Weekly samples required before the recency-weighted strategy is used
    pub min_weighted_samples: usize,

    /// Forecast length in days when a season has no known end
    pub default_horizon_days: f64,

    /// Weeks over which a sample's weight decays from 1.0 to zero (before the floor)
    pub weight_horizon_weeks: f64,

    /// Lowest weight any sample can receive
    pub min_weight: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ZoomParameters {
    /// Look-back when less than a day remains
    pub final_day_lookback_days: f64,

    /// Look-back in the final week, with and without a forecast
    pub final_week_lookback_days_with_forecast: f64,
    pub final_week_lookback_days: f64,

    /// Look-back otherwise, with and without a forecast
    pub lookback_days_with_forecast: f64,
    pub lookback_days: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,

    /// Log format (json, pretty, compact)
    pub format: String,
}

impl Default for ExtrapolationParameters {
    fn default() -> Self {
        Self {
            warmup_weeks: DEFAULT_WARMUP_WEEKS,
            min_weighted_samples: DEFAULT_MIN_WEIGHTED_SAMPLES,
            default_horizon_days: DEFAULT_HORIZON_DAYS,
            weight_horizon_weeks: DEFAULT_WEIGHT_HORIZON_WEEKS,
            min_weight: DEFAULT_MIN_WEIGHT,
        }
    }
}

impl Default for ZoomParameters {
    fn default() -> Self {
        Self {
            final_day_lookback_days: 8.0,
            final_week_lookback_days_with_forecast: 21.0,
            final_week_lookback_days: 14.0,
            lookback_days_with_forecast: 42.0,
            lookback_days: 28.0,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "compact".to_string(),
        }
    }
}

impl ForecastConfig {
    /// Load configuration from environment variables on top of the defaults
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();

        if let Ok(weeks) = std::env::var("CUTOFF_WARMUP_WEEKS") {
            config.extrapolation.warmup_weeks = weeks.parse().unwrap_or(DEFAULT_WARMUP_WEEKS);
        }

        if let Ok(samples) = std::env::var("CUTOFF_MIN_SAMPLES") {
            config.extrapolation.min_weighted_samples =
                samples.parse().unwrap_or(DEFAULT_MIN_WEIGHTED_SAMPLES);
        }

        if let Ok(days) = std::env::var("CUTOFF_HORIZON_DAYS") {
            config.extrapolation.default_horizon_days =
                days.parse().unwrap_or(DEFAULT_HORIZON_DAYS);
        }

        if let Ok(level) = std::env::var("CUTOFF_LOG_LEVEL") {
            config.logging.level = level;
        }

        if let Ok(format) = std::env::var("CUTOFF_LOG_FORMAT") {
            config.logging.format = format;
        }

        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a TOML file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: ForecastConfig = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to a TOML file
    pub fn to_file(&self, path: impl AsRef<Path>) -> Result<()> {
        std::fs::write(path, self.to_toml()?)?;
        Ok(())
    }

    pub fn to_toml(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Reject parameter combinations the engine cannot work with
    pub fn validate(&self) -> Result<()> {
        let ext = &self.extrapolation;
        if ext.min_weighted_samples == 0 {
            return Err(CutoffError::Configuration(
                "min_weighted_samples must be at least 1".to_string(),
            ));
        }
        if !(ext.default_horizon_days > 0.0 && ext.default_horizon_days <= MAX_SPAN_DAYS) {
            return Err(CutoffError::Configuration(format!(
                "default_horizon_days must be in (0, {}], got {}",
                MAX_SPAN_DAYS, ext.default_horizon_days
            )));
        }
        if !(ext.weight_horizon_weeks.is_finite() && ext.weight_horizon_weeks > 0.0) {
            return Err(CutoffError::Configuration(format!(
                "weight_horizon_weeks must be positive, got {}",
                ext.weight_horizon_weeks
            )));
        }
        if !(ext.min_weight > 0.0 && ext.min_weight <= 1.0) {
            return Err(CutoffError::Configuration(format!(
                "min_weight must be in (0, 1], got {}",
                ext.min_weight
            )));
        }

        let zoom = &self.zoom;
        let lookbacks = [
            zoom.final_day_lookback_days,
            zoom.final_week_lookback_days_with_forecast,
            zoom.final_week_lookback_days,
            zoom.lookback_days_with_forecast,
            zoom.lookback_days,
        ];
        if lookbacks.iter().any(|days| !(*days >= 0.0 && *days <= MAX_SPAN_DAYS)) {
            return Err(CutoffError::Configuration(format!(
                "zoom look-backs must be in [0, {}]",
                MAX_SPAN_DAYS
            )));
        }
        Ok(())
    }
}

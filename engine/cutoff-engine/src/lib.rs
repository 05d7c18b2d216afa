//! Season Cutoff Engine
//!
//! Tracks a competitive ranking cutoff observed as periodic snapshots and
//! projects it to the end of the season (or an override date, or a default
//! horizon), then picks the initial chart window for the result.
//!
//! Every forecasting function is pure: "now" is always passed in, inputs are
//! never mutated, and insufficient data degrades to no forecast instead of
//! an error.

pub mod anchor;
pub mod calculator;
pub mod cli;
pub mod config;
pub mod delta;
pub mod engine;
pub mod error;
pub mod extrapolation;
pub mod logging;
pub mod models;
pub mod zoom;


pub use calculator::CutoffCalculator;
pub use config::ForecastConfig;
pub use delta::{compute_weekly_delta, weekly_gains};
pub use engine::CutoffEngine;
pub use error::{CutoffError, Result};
pub use extrapolation::{compute_extrapolation, extrapolate_factions, parse_override_date};
pub use logging::{initialize_logging, initialize_logging_with_config};
pub use models::*;
pub use zoom::compute_zoom_window;

/// Current version of the cutoff engine
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Weeks of early-season data excluded from growth estimation
pub const DEFAULT_WARMUP_WEEKS: u32 = 4;

/// Weekly samples needed for the recency-weighted strategy
pub const DEFAULT_MIN_WEIGHTED_SAMPLES: usize = 4;

/// Forecast length for seasons without a known end
pub const DEFAULT_HORIZON_DAYS: f64 = 21.0;

/// Weeks for a sample's recency weight to decay from 1.0 to zero
pub const DEFAULT_WEIGHT_HORIZON_WEEKS: f64 = 10.0;

/// Recency weight floor
pub const DEFAULT_MIN_WEIGHT: f64 = 0.1;

/// Longest default horizon or zoom look-back a configuration may ask for
pub const MAX_SPAN_DAYS: f64 = 3650.0;

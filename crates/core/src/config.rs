//! Analysis configuration.
//!
//! Parses the dashboard's `key=value` configuration dialect: one assignment
//! per line, `#` starts a comment, unknown keys are ignored, missing keys keep
//! their defaults. Key names follow the original configuration file
//! (`lats_vent`, `filter_frp`, ...) with additions for the clustering and
//! flow-simulation thresholds.

use crate::cluster::ClusterParams;
use crate::error::ConfigurationError;
use crate::flow::{FlowParams, DEFAULT_MAX_CELL_VISITS};
use crate::geo::GeoPoint;
use crate::hotspot::HotspotFilter;
use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Full configuration of one analysis run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisConfig {
    /// Volcano display name.
    pub volcano: String,
    /// Vent position.
    pub vent: GeoPoint,
    /// Start of the analysis window (inclusive).
    pub start: DateTime<Utc>,
    /// End of the analysis window (inclusive).
    pub end: DateTime<Utc>,
    /// Minimum fire radiative power in MW (`filter_frp`).
    pub min_radiative_power: f64,
    /// Maximum scan-track width in km (`filter_track`).
    pub max_track: f64,
    /// Search radius around the vent in meters (`ref_radius_m`).
    pub search_radius_m: f64,
    /// Clustering spatial radius in meters.
    pub cluster_radius_m: f64,
    /// Clustering temporal gap in minutes.
    pub max_temporal_gap_min: i64,
    /// Heat budget at each flow source.
    pub initial_temperature_budget: f64,
    /// Budget drained per unit of traversal cost.
    pub cooling_rate_per_cost: f64,
    /// Safety bound on visited cells per flow simulation.
    pub max_cell_visits: usize,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            volcano: "Volcano".to_owned(),
            vent: GeoPoint::new(0.0, 0.0),
            start: parse_day_first("01/01/2024 00:00").expect("default start date is valid"),
            end: parse_day_first("01/01/2026 00:00").expect("default end date is valid"),
            min_radiative_power: 0.0,
            max_track: 0.5,
            search_radius_m: 3_000.0,
            cluster_radius_m: 500.0,
            max_temporal_gap_min: 24 * 60,
            initial_temperature_budget: 500.0,
            cooling_rate_per_cost: 1.0,
            max_cell_visits: DEFAULT_MAX_CELL_VISITS,
        }
    }
}

impl AnalysisConfig {
    /// Parse configuration text in the `key=value` dialect.
    ///
    /// # Errors
    /// Returns [`ConfigurationError`] naming the offending key when a value
    /// does not parse as the expected type.
    pub fn from_key_values(text: &str) -> Result<Self, ConfigurationError> {
        let mut config = Self::default();

        for line in text.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let Some((key, value)) = line.split_once('=') else {
                continue;
            };
            let (key, value) = (key.trim(), value.trim());

            match key {
                "volcano" => config.volcano = value.to_owned(),
                "lats_vent" => config.vent.latitude = parse_f64(key, value)?,
                "longs_vent" => config.vent.longitude = parse_f64(key, value)?,
                "start_day_str" => config.start = parse_day_first(value).map_err(|e| retag(key, e))?,
                "end_day_str" => config.end = parse_day_first(value).map_err(|e| retag(key, e))?,
                "filter_frp" => config.min_radiative_power = parse_f64(key, value)?,
                "filter_track" => config.max_track = parse_f64(key, value)?,
                "ref_radius_m" => config.search_radius_m = parse_f64(key, value)?,
                "cluster_radius_m" => config.cluster_radius_m = parse_f64(key, value)?,
                "max_temporal_gap_min" => {
                    config.max_temporal_gap_min = value.parse().map_err(|_| {
                        ConfigurationError::new(key, format!("expected an integer, got '{value}'"))
                    })?;
                }
                "initial_temperature_budget" => {
                    config.initial_temperature_budget = parse_f64(key, value)?;
                }
                "cooling_rate_per_cost" => config.cooling_rate_per_cost = parse_f64(key, value)?,
                "max_cell_visits" => {
                    config.max_cell_visits = value.parse().map_err(|_| {
                        ConfigurationError::new(key, format!("expected an integer, got '{value}'"))
                    })?;
                }
                // Unknown keys (dashboard-only settings) are ignored
                _ => {}
            }
        }
        Ok(config)
    }

    /// Read and parse a configuration file.
    ///
    /// # Errors
    /// Returns [`ConfigurationError`] if the file cannot be read or a value
    /// does not parse.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigurationError> {
        let text = fs::read_to_string(&path).map_err(|e| {
            ConfigurationError::new(
                "config_path",
                format!("cannot read '{}': {e}", path.as_ref().display()),
            )
        })?;
        Self::from_key_values(&text)
    }

    /// The record filter implied by this configuration.
    #[must_use]
    pub fn filter(&self) -> HotspotFilter {
        HotspotFilter {
            min_radiative_power: self.min_radiative_power,
            max_track: self.max_track,
            window: Some((self.start, self.end)),
        }
    }

    /// The clustering thresholds implied by this configuration.
    #[must_use]
    pub fn cluster_params(&self) -> ClusterParams {
        ClusterParams {
            spatial_radius_m: self.cluster_radius_m,
            max_temporal_gap: Duration::minutes(self.max_temporal_gap_min),
        }
    }

    /// The flow-simulation parameters implied by this configuration.
    #[must_use]
    pub fn flow_params(&self) -> FlowParams {
        FlowParams {
            initial_temperature_budget: self.initial_temperature_budget,
            cooling_rate_per_cost: self.cooling_rate_per_cost,
            max_cell_visits: self.max_cell_visits,
        }
    }
}

fn parse_f64(key: &str, value: &str) -> Result<f64, ConfigurationError> {
    value.parse::<f64>().map_err(|_| {
        ConfigurationError::new(
            key.to_owned(),
            format!("expected a number, got '{value}'"),
        )
    })
}

/// Parse a day-first timestamp (`DD/MM/YYYY HH:MM`), accepting a bare date.
fn parse_day_first(value: &str) -> Result<DateTime<Utc>, ConfigurationError> {
    if let Ok(dt) = NaiveDateTime::parse_from_str(value, "%d/%m/%Y %H:%M") {
        return Ok(dt.and_utc());
    }
    if let Ok(day) = NaiveDate::parse_from_str(value, "%d/%m/%Y") {
        if let Some(dt) = day.and_hms_opt(0, 0, 0) {
            return Ok(dt.and_utc());
        }
    }
    Err(ConfigurationError::new(
        "date",
        format!("expected DD/MM/YYYY [HH:MM], got '{value}'"),
    ))
}

fn retag(key: &str, mut error: ConfigurationError) -> ConfigurationError {
    error.parameter = key.to_owned();
    error
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn defaults_match_the_documented_values() {
        let config = AnalysisConfig::default();
        assert_eq!(config.volcano, "Volcano");
        assert_eq!(config.max_track, 0.5);
        assert_eq!(config.search_radius_m, 3_000.0);
        assert_eq!(config.start, Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap());
    }

    #[test]
    fn parses_overrides_comments_and_unknown_keys() {
        let text = "\
# analysis window
volcano = Sangay
lats_vent = -2.005
longs_vent = -78.341
start_day_str = 15/03/2025 06:30
end_day_str = 20/03/2025
filter_frp = 2.5
cluster_radius_m = 750
max_temporal_gap_min = 720
include_reference_radius = True
";
        let config = AnalysisConfig::from_key_values(text).unwrap();

        assert_eq!(config.volcano, "Sangay");
        assert_eq!(config.vent.latitude, -2.005);
        assert_eq!(
            config.start,
            Utc.with_ymd_and_hms(2025, 3, 15, 6, 30, 0).unwrap()
        );
        // Bare date defaults to midnight
        assert_eq!(
            config.end,
            Utc.with_ymd_and_hms(2025, 3, 20, 0, 0, 0).unwrap()
        );
        assert_eq!(config.min_radiative_power, 2.5);
        assert_eq!(config.cluster_radius_m, 750.0);
        assert_eq!(config.max_temporal_gap_min, 720);
        // include_reference_radius is a dashboard key: ignored, no error
        assert_eq!(config.max_track, 0.5);
    }

    #[test]
    fn malformed_values_name_the_key() {
        let err = AnalysisConfig::from_key_values("lats_vent = south").unwrap_err();
        assert_eq!(err.parameter, "lats_vent");

        let err = AnalysisConfig::from_key_values("start_day_str = 2025-03-15").unwrap_err();
        assert_eq!(err.parameter, "start_day_str");

        let err = AnalysisConfig::from_key_values("max_cell_visits = -4").unwrap_err();
        assert_eq!(err.parameter, "max_cell_visits");
    }

    #[test]
    fn conversions_carry_the_thresholds() {
        let config = AnalysisConfig {
            cluster_radius_m: 600.0,
            max_temporal_gap_min: 90,
            initial_temperature_budget: 42.0,
            ..AnalysisConfig::default()
        };

        let cp = config.cluster_params();
        assert_eq!(cp.spatial_radius_m, 600.0);
        assert_eq!(cp.max_temporal_gap, Duration::minutes(90));

        let fp = config.flow_params();
        assert_eq!(fp.initial_temperature_budget, 42.0);

        let filter = config.filter();
        assert_eq!(filter.window, Some((config.start, config.end)));
    }

    #[test]
    fn missing_file_is_a_configuration_error() {
        let err = AnalysisConfig::load("/nonexistent/config.txt").unwrap_err();
        assert_eq!(err.parameter, "config_path");
    }
}

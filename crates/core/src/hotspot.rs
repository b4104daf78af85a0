//! Hotspot record normalization.
//!
//! FIRMS delivers thermal-anomaly detections as loosely typed CSV rows. This
//! module turns one raw row ([`RawHotspot`]) into a validated, immutable
//! [`HotspotRecord`], rejecting anything malformed with a typed
//! [`ValidationError`] instead of a silent attribute miss.
//!
//! Also hosts the pre-analysis filter (FRP floor, scan-track ceiling, date
//! window) and the exact-repeat deduplication applied when overlapping
//! downloads are merged.

use crate::error::ValidationError;
use crate::geo::GeoPoint;
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};

/// Detection confidence as reported by the source sensor.
///
/// VIIRS reports letter classes (`l`/`n`/`h`); MODIS reports a 0-100
/// percentage. Both map to a weight in (0, 1] used for confidence-weighted
/// centroid computation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Confidence {
    /// VIIRS low confidence.
    Low,
    /// VIIRS nominal confidence.
    Nominal,
    /// VIIRS high confidence.
    High,
    /// MODIS percentage confidence, 0-100.
    Percent(f64),
}

impl Confidence {
    /// Centroid weight in (0, 1].
    ///
    /// Percentage confidences are floored at 0.05 so a zero-confidence member
    /// still contributes to (and cannot zero out) the weighted mean.
    #[must_use]
    pub fn weight(&self) -> f64 {
        match self {
            Confidence::Low => 0.3,
            Confidence::Nominal => 0.6,
            Confidence::High => 1.0,
            Confidence::Percent(p) => (p / 100.0).clamp(0.05, 1.0),
        }
    }

    /// Parse a source confidence string.
    ///
    /// # Errors
    /// Returns [`ValidationError`] if the value is neither a VIIRS letter
    /// class nor a percentage in [0, 100].
    pub fn parse(value: &str) -> Result<Self, ValidationError> {
        match value.trim().to_ascii_lowercase().as_str() {
            "l" | "low" => Ok(Confidence::Low),
            "n" | "nominal" => Ok(Confidence::Nominal),
            "h" | "high" => Ok(Confidence::High),
            other => match other.parse::<f64>() {
                Ok(p) if (0.0..=100.0).contains(&p) => Ok(Confidence::Percent(p)),
                _ => Err(ValidationError::new(
                    "confidence",
                    format!("expected l/n/h or a percentage in [0, 100], got '{value}'"),
                )),
            },
        }
    }
}

/// One raw detection row as handed over by the ingestion layer.
///
/// Field names follow the FIRMS CSV columns. `radiative_power` (FRP, MW) and
/// `track` (scan-track width, km) are ancillary columns used by filtering and
/// analytics; not every archive carries them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawHotspot {
    /// Latitude in WGS84 degrees.
    pub latitude: f64,
    /// Longitude in WGS84 degrees.
    pub longitude: f64,
    /// Acquisition date, `DD/MM/YYYY`.
    pub acq_date: String,
    /// Acquisition time of day, `HHMM` (leading zeros optional).
    pub acq_time: String,
    /// Brightness temperature in kelvin.
    pub brightness: f64,
    /// Source confidence (`l`/`n`/`h` or a percentage).
    pub confidence: String,
    /// Satellite identifier (e.g. `SNPP`, `NOAA20`).
    pub satellite: String,
    /// Fire radiative power in MW, if present.
    pub radiative_power: Option<f64>,
    /// Scan-track width in km, if present.
    pub track: Option<f64>,
}

/// A validated, canonical detection. Immutable once created.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HotspotRecord {
    /// Detection position.
    pub position: GeoPoint,
    /// Acquisition instant (UTC).
    pub acquired: DateTime<Utc>,
    /// Brightness temperature in kelvin, always positive.
    pub brightness_k: f64,
    /// Sensor confidence.
    pub confidence: Confidence,
    /// Satellite identifier.
    pub satellite: String,
    /// Fire radiative power in MW, if present.
    pub radiative_power: Option<f64>,
    /// Scan-track width in km, if present.
    pub track: Option<f64>,
}

/// Validate and canonicalize one raw detection.
///
/// Pure transformation: no side effects, no mutation of the input.
///
/// # Errors
/// Returns [`ValidationError`] naming the offending field when the latitude is
/// outside [-90, 90], the longitude is outside [-180, 180], the brightness is
/// not a positive finite kelvin value, the timestamp does not parse, the
/// confidence is unrecognized, or the satellite identifier is empty.
pub fn normalize(raw: &RawHotspot) -> Result<HotspotRecord, ValidationError> {
    if !raw.latitude.is_finite() || !(-90.0..=90.0).contains(&raw.latitude) {
        return Err(ValidationError::new(
            "latitude",
            format!("must be within [-90, 90], got {}", raw.latitude),
        ));
    }
    if !raw.longitude.is_finite() || !(-180.0..=180.0).contains(&raw.longitude) {
        return Err(ValidationError::new(
            "longitude",
            format!("must be within [-180, 180], got {}", raw.longitude),
        ));
    }
    if !raw.brightness.is_finite() || raw.brightness <= 0.0 {
        return Err(ValidationError::new(
            "brightness",
            format!("must be a positive kelvin value, got {}", raw.brightness),
        ));
    }
    if raw.satellite.trim().is_empty() {
        return Err(ValidationError::new(
            "satellite",
            "identifier must not be empty",
        ));
    }

    let acquired = parse_acquisition_time(&raw.acq_date, &raw.acq_time)?;
    let confidence = Confidence::parse(&raw.confidence)?;

    for (field, value) in [
        ("radiative_power", raw.radiative_power),
        ("track", raw.track),
    ] {
        if let Some(v) = value {
            if !v.is_finite() || v < 0.0 {
                return Err(ValidationError::new(
                    field,
                    format!("must be a non-negative finite value, got {v}"),
                ));
            }
        }
    }

    Ok(HotspotRecord {
        position: GeoPoint::new(raw.latitude, raw.longitude),
        acquired,
        brightness_k: raw.brightness,
        confidence,
        satellite: raw.satellite.trim().to_owned(),
        radiative_power: raw.radiative_power,
        track: raw.track,
    })
}

/// Parse the FIRMS `acq_date` + `acq_time` pair into a UTC instant.
///
/// Dates are day-first (`DD/MM/YYYY`); times are `HHMM` with the leading
/// zeros the CSV export drops restored before parsing.
fn parse_acquisition_time(date: &str, time: &str) -> Result<DateTime<Utc>, ValidationError> {
    let day = NaiveDate::parse_from_str(date.trim(), "%d/%m/%Y").map_err(|e| {
        ValidationError::new("acq_date", format!("expected DD/MM/YYYY, got '{date}' ({e})"))
    })?;

    let padded = format!("{:0>4}", time.trim());
    let tod = NaiveTime::parse_from_str(&padded, "%H%M").map_err(|e| {
        ValidationError::new("acq_time", format!("expected HHMM, got '{time}' ({e})"))
    })?;

    Ok(day.and_time(tod).and_utc())
}

/// Pre-analysis record filter.
///
/// Mirrors the dashboard-side selection: keep detections with radiative power
/// at or above a floor, scan-track width at or below a ceiling, and an
/// acquisition time inside the analysis window. A record missing an optional
/// column passes that criterion rather than being discarded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HotspotFilter {
    /// Minimum fire radiative power in MW.
    pub min_radiative_power: f64,
    /// Maximum scan-track width in km.
    pub max_track: f64,
    /// Inclusive acquisition window, if bounded.
    pub window: Option<(DateTime<Utc>, DateTime<Utc>)>,
}

impl Default for HotspotFilter {
    fn default() -> Self {
        Self {
            min_radiative_power: 0.0,
            max_track: f64::INFINITY,
            window: None,
        }
    }
}

impl HotspotFilter {
    /// Whether a record passes every criterion.
    #[must_use]
    pub fn matches(&self, record: &HotspotRecord) -> bool {
        if let Some(frp) = record.radiative_power {
            if frp < self.min_radiative_power {
                return false;
            }
        }
        if let Some(track) = record.track {
            if track > self.max_track {
                return false;
            }
        }
        if let Some((start, end)) = self.window {
            if record.acquired < start || record.acquired > end {
                return false;
            }
        }
        true
    }

    /// Retain only the records passing the filter, preserving order.
    #[must_use]
    pub fn apply(&self, records: Vec<HotspotRecord>) -> Vec<HotspotRecord> {
        records.into_iter().filter(|r| self.matches(r)).collect()
    }
}

/// Drop exact repeats from overlapping downloads, keeping the first.
///
/// Two records are repeats when their coordinates agree to four decimal
/// places (~11 m) and their acquisition instant and satellite match. This is
/// the only cross-observation merging performed below the clustering engine.
#[must_use]
pub fn dedup_records(records: Vec<HotspotRecord>) -> Vec<HotspotRecord> {
    let mut seen: FxHashSet<(i64, i64, i64, String)> = FxHashSet::default();
    records
        .into_iter()
        .filter(|r| {
            let key = (
                (r.position.latitude * 10_000.0).round() as i64,
                (r.position.longitude * 10_000.0).round() as i64,
                r.acquired.timestamp(),
                r.satellite.clone(),
            );
            seen.insert(key)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn raw(lat: f64, lon: f64) -> RawHotspot {
        RawHotspot {
            latitude: lat,
            longitude: lon,
            acq_date: "15/03/2025".to_owned(),
            acq_time: "132".to_owned(),
            brightness: 331.5,
            confidence: "n".to_owned(),
            satellite: "SNPP".to_owned(),
            radiative_power: Some(12.4),
            track: Some(0.45),
        }
    }

    #[test]
    fn normalize_valid_record() {
        let record = normalize(&raw(-2.005, -78.341)).expect("record should validate");

        assert_eq!(record.position.latitude, -2.005);
        assert_eq!(record.satellite, "SNPP");
        assert_eq!(record.confidence, Confidence::Nominal);
        // acq_time "132" must be treated as 01:32 UTC
        let expected = Utc.with_ymd_and_hms(2025, 3, 15, 1, 32, 0).unwrap();
        assert_eq!(record.acquired, expected);
    }

    #[test]
    fn normalize_rejects_out_of_range_latitude() {
        let err = normalize(&raw(95.2, 0.0)).unwrap_err();
        assert_eq!(err.field, "latitude");
        assert!(err.reason.contains("95.2"));
    }

    #[test]
    fn normalize_rejects_non_positive_brightness() {
        let mut r = raw(0.0, 0.0);
        r.brightness = 0.0;
        assert_eq!(normalize(&r).unwrap_err().field, "brightness");

        r.brightness = f64::NAN;
        assert_eq!(normalize(&r).unwrap_err().field, "brightness");
    }

    #[test]
    fn normalize_rejects_bad_timestamp() {
        let mut r = raw(0.0, 0.0);
        r.acq_date = "2025-03-15".to_owned();
        assert_eq!(normalize(&r).unwrap_err().field, "acq_date");

        let mut r = raw(0.0, 0.0);
        r.acq_time = "2561".to_owned();
        assert_eq!(normalize(&r).unwrap_err().field, "acq_time");
    }

    #[test]
    fn confidence_parsing_and_weights() {
        assert_eq!(Confidence::parse("h").unwrap(), Confidence::High);
        assert_eq!(Confidence::parse("Nominal").unwrap(), Confidence::Nominal);
        assert_eq!(Confidence::parse("85").unwrap(), Confidence::Percent(85.0));
        assert!(Confidence::parse("maybe").is_err());
        assert!(Confidence::parse("140").is_err());

        assert_eq!(Confidence::High.weight(), 1.0);
        assert!(Confidence::Low.weight() < Confidence::Nominal.weight());
        // Zero-percent confidence still gets a usable weight
        assert!(Confidence::Percent(0.0).weight() > 0.0);
    }

    #[test]
    fn filter_applies_frp_track_and_window() {
        let record = normalize(&raw(-2.0, -78.3)).unwrap();

        let mut filter = HotspotFilter {
            min_radiative_power: 20.0,
            ..HotspotFilter::default()
        };
        assert!(!filter.matches(&record)); // frp 12.4 < 20

        filter.min_radiative_power = 5.0;
        filter.max_track = 0.4;
        assert!(!filter.matches(&record)); // track 0.45 > 0.4

        filter.max_track = 0.5;
        let start = Utc.with_ymd_and_hms(2025, 3, 16, 0, 0, 0).unwrap();
        let end = Utc.with_ymd_and_hms(2025, 3, 17, 0, 0, 0).unwrap();
        filter.window = Some((start, end));
        assert!(!filter.matches(&record)); // acquired 15/03 before window

        filter.window = None;
        assert!(filter.matches(&record));
    }

    #[test]
    fn filter_passes_records_missing_optional_columns() {
        let mut r = raw(-2.0, -78.3);
        r.radiative_power = None;
        r.track = None;
        let record = normalize(&r).unwrap();

        let filter = HotspotFilter {
            min_radiative_power: 50.0,
            max_track: 0.1,
            window: None,
        };
        assert!(filter.matches(&record));
    }

    #[test]
    fn dedup_drops_exact_repeats_keeps_first() {
        let a = normalize(&raw(-2.00051, -78.30002)).unwrap();
        let b = normalize(&raw(-2.00049, -78.29998)).unwrap(); // rounds to same 4dp key
        let mut c = normalize(&raw(-2.00051, -78.30002)).unwrap();
        c.satellite = "NOAA20".to_owned(); // different satellite, kept

        let out = dedup_records(vec![a.clone(), b, c]);
        assert_eq!(out.len(), 2);
        assert_eq!(out[0], a);
        assert_eq!(out[1].satellite, "NOAA20");
    }
}

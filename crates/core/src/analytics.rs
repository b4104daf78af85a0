//! Vent-relative analytics over normalized detections.
//!
//! Everything here is derived reporting on top of the clustering/flow core:
//! daily maximum flow distance from the vent per satellite, breakthrough
//! propagation events with advance speed, cumulative radiative-power
//! statistics, and anomaly counts per calendar bucket.

use crate::error::ConfigurationError;
use crate::geo::{haversine_distance_m, GeoPoint};
use crate::hotspot::HotspotRecord;
use chrono::{DateTime, Datelike, Duration, NaiveDate, Utc, Weekday};
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

/// Maximum vent distance observed on one UTC day by one satellite.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyMaxDistance {
    /// UTC acquisition day.
    pub date: NaiveDate,
    /// Satellite identifier.
    pub satellite: String,
    /// Farthest detection from the vent that day, kilometers.
    pub max_distance_km: f64,
    /// Highest fire radiative power that day in MW, if reported.
    pub peak_radiative_power: Option<f64>,
}

/// Per-day, per-satellite maximum distance from the vent.
///
/// Output is sorted by date, then satellite identifier.
#[must_use]
pub fn daily_max_distances(records: &[HotspotRecord], vent: GeoPoint) -> Vec<DailyMaxDistance> {
    let mut groups: FxHashMap<(NaiveDate, String), (f64, Option<f64>)> = FxHashMap::default();

    for record in records {
        let key = (record.acquired.date_naive(), record.satellite.clone());
        let distance_km = haversine_distance_m(record.position, vent) / 1000.0;
        let entry = groups.entry(key).or_insert((0.0, None));
        entry.0 = entry.0.max(distance_km);
        entry.1 = match (entry.1, record.radiative_power) {
            (Some(a), Some(b)) => Some(a.max(b)),
            (a, b) => a.or(b),
        };
    }

    let mut out: Vec<DailyMaxDistance> = groups
        .into_iter()
        .map(
            |((date, satellite), (max_distance_km, peak_radiative_power))| DailyMaxDistance {
                date,
                satellite,
                max_distance_km,
                peak_radiative_power,
            },
        )
        .collect();
    out.sort_by(|a, b| a.date.cmp(&b.date).then_with(|| a.satellite.cmp(&b.satellite)));
    out
}

/// A breakthrough: a day whose maximum distance exceeded every previous day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropagationEvent {
    /// Day of the breakthrough.
    pub date: NaiveDate,
    /// New cumulative maximum distance, kilometers.
    pub max_distance_km: f64,
    /// Advance over the previous maximum, meters.
    pub advance_m: f64,
    /// Hours since the previous breakthrough; `None` for the first one.
    pub hours_since_previous: Option<f64>,
    /// Advance speed in m/h; `None` for the first breakthrough.
    pub speed_m_per_h: Option<f64>,
}

/// Extract breakthrough events from the daily distance summary.
///
/// Satellites are collapsed to a single per-day maximum first so the running
/// cumulative maximum is well-defined, then each day that pushes the maximum
/// outward becomes an event carrying the advance and its speed.
#[must_use]
pub fn propagation_events(daily: &[DailyMaxDistance]) -> Vec<PropagationEvent> {
    let mut per_day: FxHashMap<NaiveDate, f64> = FxHashMap::default();
    for entry in daily {
        let d = per_day.entry(entry.date).or_insert(0.0);
        *d = d.max(entry.max_distance_km);
    }

    let mut days: Vec<(NaiveDate, f64)> = per_day.into_iter().collect();
    days.sort_by_key(|(date, _)| *date);

    let mut events = Vec::new();
    let mut running_max = 0.0_f64;
    let mut previous_event: Option<NaiveDate> = None;

    for (date, distance_km) in days {
        if distance_km <= running_max {
            continue;
        }
        let advance_m = (distance_km - running_max) * 1000.0;
        let hours_since_previous =
            previous_event.map(|prev| (date - prev).num_hours() as f64);
        let speed_m_per_h = hours_since_previous
            .filter(|h| *h > 0.0)
            .map(|h| advance_m / h);

        events.push(PropagationEvent {
            date,
            max_distance_km: distance_km,
            advance_m,
            hours_since_previous,
            speed_m_per_h,
        });
        running_max = distance_km;
        previous_event = Some(date);
    }
    events
}

/// Cumulative radiative-power statistics up to one sample instant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CumulativePowerStats {
    /// Sample instant (inclusive upper bound of the window).
    pub timestamp: DateTime<Utc>,
    /// Mean FRP of all detections up to the instant, MW.
    pub mean: f64,
    /// First quartile.
    pub q25: f64,
    /// Median.
    pub median: f64,
    /// Third quartile.
    pub q75: f64,
    /// Number of detections contributing.
    pub samples: usize,
}

/// Cumulative FRP mean and quartiles sampled on a fixed interval.
///
/// Sampling runs from midnight of the first detection day to the day after
/// the last, stepping by `step` (the dashboard uses 12 h). Detections without
/// a reported FRP do not contribute. Instants before the first detection
/// produce no row.
///
/// # Errors
/// Returns [`ConfigurationError`] if `step` is not positive.
pub fn cumulative_power_stats(
    records: &[HotspotRecord],
    step: Duration,
) -> Result<Vec<CumulativePowerStats>, ConfigurationError> {
    if step <= Duration::zero() {
        return Err(ConfigurationError::new(
            "step",
            format!("must be positive, got {}s", step.num_seconds()),
        ));
    }

    let mut timed: Vec<(DateTime<Utc>, f64)> = records
        .iter()
        .filter_map(|r| r.radiative_power.map(|frp| (r.acquired, frp)))
        .collect();
    if timed.is_empty() {
        return Ok(Vec::new());
    }
    timed.sort_by_key(|(t, _)| *t);

    let first = timed[0].0.date_naive().and_hms_opt(0, 0, 0);
    let last = timed[timed.len() - 1].0.date_naive().and_hms_opt(0, 0, 0);
    let (Some(first), Some(last)) = (first, last) else {
        return Ok(Vec::new());
    };
    let start = first.and_utc();
    let end = last.and_utc() + Duration::days(1);

    let mut out = Vec::new();
    let mut sorted_frp: Vec<f64> = Vec::with_capacity(timed.len());
    let mut sum = 0.0_f64;
    let mut next = 0usize;

    let mut t = start;
    while t <= end {
        while next < timed.len() && timed[next].0 <= t {
            let frp = timed[next].1;
            let pos = sorted_frp.partition_point(|v| *v < frp);
            sorted_frp.insert(pos, frp);
            sum += frp;
            next += 1;
        }
        if !sorted_frp.is_empty() {
            out.push(CumulativePowerStats {
                timestamp: t,
                mean: sum / sorted_frp.len() as f64,
                q25: quantile(&sorted_frp, 0.25),
                median: quantile(&sorted_frp, 0.50),
                q75: quantile(&sorted_frp, 0.75),
                samples: sorted_frp.len(),
            });
        }
        t += step;
    }
    Ok(out)
}

/// Linear-interpolated quantile of an ascending-sorted slice.
fn quantile(sorted: &[f64], q: f64) -> f64 {
    let pos = q * (sorted.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    if lo == hi {
        sorted[lo]
    } else {
        let frac = pos - lo as f64;
        sorted[lo] * (1.0 - frac) + sorted[hi] * frac
    }
}

/// Calendar bucketing for anomaly counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CountInterval {
    /// Weeks starting on the given weekday.
    Weekly(Weekday),
    /// Calendar months.
    Monthly,
}

/// Detection count for one calendar bucket and satellite.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnomalyCount {
    /// First day of the bucket.
    pub bucket_start: NaiveDate,
    /// Satellite identifier.
    pub satellite: String,
    /// Number of detections in the bucket.
    pub count: usize,
}

/// Count detections per calendar bucket and satellite.
///
/// Output is sorted by bucket start, then satellite identifier.
#[must_use]
pub fn count_by_interval(records: &[HotspotRecord], interval: CountInterval) -> Vec<AnomalyCount> {
    let mut groups: FxHashMap<(NaiveDate, String), usize> = FxHashMap::default();

    for record in records {
        let date = record.acquired.date_naive();
        let bucket_start = match interval {
            CountInterval::Weekly(week_start) => {
                let offset = i64::from(
                    (7 + date.weekday().num_days_from_monday()
                        - week_start.num_days_from_monday())
                        % 7,
                );
                date - Duration::days(offset)
            }
            CountInterval::Monthly => NaiveDate::from_ymd_opt(date.year(), date.month(), 1)
                .expect("first of month is always a valid date"),
        };
        *groups
            .entry((bucket_start, record.satellite.clone()))
            .or_insert(0) += 1;
    }

    let mut out: Vec<AnomalyCount> = groups
        .into_iter()
        .map(|((bucket_start, satellite), count)| AnomalyCount {
            bucket_start,
            satellite,
            count,
        })
        .collect();
    out.sort_by(|a, b| {
        a.bucket_start
            .cmp(&b.bucket_start)
            .then_with(|| a.satellite.cmp(&b.satellite))
    });
    out
}

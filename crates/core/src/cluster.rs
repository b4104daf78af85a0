//! Spatiotemporal clustering of hotspot detections.
//!
//! Groups normalized detections into discrete thermal-anomaly events with a
//! greedy online single pass: each record either joins the nearest open
//! cluster within the spatial radius or opens a new one, and a cluster seals
//! as soon as the stream has moved past its temporal gap. Overlapping
//! satellite passes of the same physical event therefore collapse into one
//! cluster instead of duplicating it.
//!
//! Determinism: input is sorted internally by (timestamp, latitude,
//! longitude, satellite), so the output is a pure function of the record set
//! and the two thresholds regardless of arrival order.
//!
//! Known approximation: absorption is decided against the centroid *at
//! absorption time*. The centroid drifts as members arrive, so members are
//! not guaranteed to lie within the radius of the *final* centroid. This is a
//! deliberate online-algorithm tradeoff; there is no offline reconciliation
//! pass.

use crate::error::ConfigurationError;
use crate::geo::{haversine_distance_m, GeoPoint};
use crate::hotspot::HotspotRecord;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Thresholds controlling cluster membership.
#[derive(Debug, Clone, PartialEq)]
pub struct ClusterParams {
    /// Maximum distance from a record to an open cluster's centroid.
    pub spatial_radius_m: f64,
    /// Maximum gap between consecutive members before a cluster seals.
    pub max_temporal_gap: Duration,
}

impl ClusterParams {
    /// Validate the thresholds.
    ///
    /// # Errors
    /// Returns [`ConfigurationError`] if the radius is not positive and
    /// finite, or the temporal gap is not positive.
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        if !self.spatial_radius_m.is_finite() || self.spatial_radius_m <= 0.0 {
            return Err(ConfigurationError::not_positive(
                "spatial_radius_m",
                self.spatial_radius_m,
            ));
        }
        if self.max_temporal_gap <= Duration::zero() {
            return Err(ConfigurationError::new(
                "max_temporal_gap",
                format!("must be positive, got {}s", self.max_temporal_gap.num_seconds()),
            ));
        }
        Ok(())
    }
}

/// A sealed group of detections judged to be one physical thermal event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnomalyCluster {
    /// Creation-order identifier, unique within one clustering run.
    pub id: u32,
    /// Confidence-weighted mean position of the members.
    pub centroid: GeoPoint,
    /// Earliest member acquisition time.
    pub first_seen: DateTime<Utc>,
    /// Latest member acquisition time.
    pub last_seen: DateTime<Utc>,
    /// Maximum brightness temperature among the members, kelvin.
    pub peak_brightness_k: f64,
    /// Members in detection order.
    pub members: Vec<HotspotRecord>,
}

impl AnomalyCluster {
    /// Number of member detections.
    #[must_use]
    pub fn member_count(&self) -> usize {
        self.members.len()
    }

    /// Span between the first and last member acquisition.
    #[must_use]
    pub fn time_window(&self) -> Duration {
        self.last_seen - self.first_seen
    }
}

/// A cluster still accepting members, with running centroid accumulators.
struct OpenCluster {
    id: u32,
    weight_sum: f64,
    lat_acc: f64,
    lon_acc: f64,
    centroid: GeoPoint,
    first_seen: DateTime<Utc>,
    last_seen: DateTime<Utc>,
    peak_brightness_k: f64,
    members: Vec<HotspotRecord>,
}

impl OpenCluster {
    fn open(id: u32, record: HotspotRecord) -> Self {
        let w = record.confidence.weight();
        Self {
            id,
            weight_sum: w,
            lat_acc: w * record.position.latitude,
            lon_acc: w * record.position.longitude,
            centroid: record.position,
            first_seen: record.acquired,
            last_seen: record.acquired,
            peak_brightness_k: record.brightness_k,
            members: vec![record],
        }
    }

    fn absorb(&mut self, record: HotspotRecord) {
        let w = record.confidence.weight();
        self.weight_sum += w;
        self.lat_acc += w * record.position.latitude;
        self.lon_acc += w * record.position.longitude;
        self.centroid = GeoPoint::new(
            self.lat_acc / self.weight_sum,
            self.lon_acc / self.weight_sum,
        );
        self.last_seen = record.acquired;
        self.peak_brightness_k = self.peak_brightness_k.max(record.brightness_k);
        self.members.push(record);
    }

    fn seal(self) -> AnomalyCluster {
        AnomalyCluster {
            id: self.id,
            centroid: self.centroid,
            first_seen: self.first_seen,
            last_seen: self.last_seen,
            peak_brightness_k: self.peak_brightness_k,
            members: self.members,
        }
    }
}

/// Cluster a batch of detections into thermal-anomaly events.
///
/// Records are sorted internally into the documented deterministic order
/// (ascending timestamp, ties broken by latitude, then longitude, then
/// satellite identifier), then processed in a single greedy pass. The result
/// is ordered by cluster id, i.e. creation (first-detection) order.
///
/// # Errors
/// Returns [`ConfigurationError`] before touching any record if either
/// threshold is invalid.
pub fn cluster(
    mut records: Vec<HotspotRecord>,
    params: &ClusterParams,
) -> Result<Vec<AnomalyCluster>, ConfigurationError> {
    params.validate()?;

    records.sort_by(|a, b| {
        a.acquired
            .cmp(&b.acquired)
            .then_with(|| a.position.latitude.total_cmp(&b.position.latitude))
            .then_with(|| a.position.longitude.total_cmp(&b.position.longitude))
            .then_with(|| a.satellite.cmp(&b.satellite))
    });

    let mut open: Vec<OpenCluster> = Vec::new();
    let mut sealed: Vec<AnomalyCluster> = Vec::new();
    let mut next_id: u32 = 0;

    for record in records {
        // Time-ordered input implies temporal closure: once the stream is
        // past a cluster's gap, nothing can join it anymore.
        let now = record.acquired;
        let mut i = 0;
        while i < open.len() {
            if now - open[i].last_seen > params.max_temporal_gap {
                sealed.push(open.remove(i).seal());
            } else {
                i += 1;
            }
        }

        // `open` is in ascending id order (pushes append, removals preserve
        // order), so strict `<` resolves distance ties to the lowest id.
        let mut best: Option<(usize, f64)> = None;
        for (idx, oc) in open.iter().enumerate() {
            let d = haversine_distance_m(record.position, oc.centroid);
            if d <= params.spatial_radius_m && best.is_none_or(|(_, bd)| d < bd) {
                best = Some((idx, d));
            }
        }

        match best {
            Some((idx, _)) => open[idx].absorb(record),
            None => {
                open.push(OpenCluster::open(next_id, record));
                next_id += 1;
            }
        }
    }

    sealed.extend(open.into_iter().map(OpenCluster::seal));
    sealed.sort_by_key(|c| c.id);
    Ok(sealed)
}

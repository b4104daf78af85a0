//! End-to-end analysis pipeline and result aggregation.
//!
//! Wires the stages together: normalize raw detections, filter and
//! deduplicate, cluster into thermal events, locate each event on the terrain
//! grid, and simulate its lava flow. The output is a single exportable
//! dataset pairing every sealed cluster with its flow extent.
//!
//! Flow simulations are independent of one another and run task-parallel
//! across events: each owns an exclusive mutable flow state while sharing the
//! immutable terrain grid read-only. Clustering stays sequential because
//! later decisions depend on earlier cluster state.

use crate::cluster::{cluster, AnomalyCluster};
use crate::config::AnalysisConfig;
use crate::error::{ConfigurationError, CoreError};
use crate::flow::{simulate, FlowExtent};
use crate::hotspot::{dedup_records, normalize, RawHotspot};
use crate::terrain::TerrainGrid;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

/// A raw record that failed normalization, with the offending field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RejectedHotspot {
    /// The record as received.
    pub record: RawHotspot,
    /// Offending field name.
    pub field: String,
    /// Rejection reason including the offending value.
    pub reason: String,
}

/// One thermal event with its simulated flow.
///
/// `flow` is `None` when the event centroid falls outside the terrain grid;
/// the event itself is still reported.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EruptionEvent {
    /// The sealed detection cluster.
    pub cluster: AnomalyCluster,
    /// Simulated flow extent, if the source could be located on the grid.
    pub flow: Option<FlowExtent>,
}

/// The exportable result of one analysis run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EruptionDataset {
    /// Events in creation (first-detection) order.
    pub events: Vec<EruptionEvent>,
    /// Records rejected during normalization, none silently dropped.
    pub rejected: Vec<RejectedHotspot>,
}

/// Run the full analysis over a batch of raw detections.
///
/// Stages: normalize (rejects collected, not dropped), filter by the
/// configured FRP/track/window thresholds, deduplicate exact repeats,
/// cluster, then simulate one flow per event in parallel. Events whose
/// centroid cannot be located on the grid keep `flow: None`.
///
/// # Errors
/// Returns [`ConfigurationError`] if the grid has no georeference or any
/// threshold is invalid; all configuration checks run before the first record
/// is processed.
pub fn analyze(
    raw: &[RawHotspot],
    grid: &TerrainGrid,
    config: &AnalysisConfig,
) -> Result<EruptionDataset, CoreError> {
    if grid.georeference().is_none() {
        return Err(ConfigurationError::new(
            "georeference",
            "terrain grid must be georeferenced to locate event sources",
        )
        .into());
    }
    let cluster_params = config.cluster_params();
    cluster_params.validate()?;
    let flow_params = config.flow_params();
    flow_params.validate()?;

    let mut records = Vec::with_capacity(raw.len());
    let mut rejected = Vec::new();
    for r in raw {
        match normalize(r) {
            Ok(record) => records.push(record),
            Err(e) => {
                debug!(field = e.field, reason = %e.reason, "rejected raw detection");
                rejected.push(RejectedHotspot {
                    record: r.clone(),
                    field: e.field.to_owned(),
                    reason: e.reason,
                });
            }
        }
    }

    let records = config.filter().apply(records);
    let records = dedup_records(records);
    let clusters = cluster(records, &cluster_params)?;

    // Parameters were validated up front, so a failed simulation here can
    // only mean an unlocatable source; the event is kept without a flow.
    let flows: Vec<Option<FlowExtent>> = clusters
        .par_iter()
        .map(|c| {
            let Some(source) = grid.locate(c.centroid) else {
                warn!(
                    cluster_id = c.id,
                    latitude = c.centroid.latitude,
                    longitude = c.centroid.longitude,
                    "event centroid outside terrain grid, no flow simulated"
                );
                return None;
            };
            match simulate(source, grid, &flow_params) {
                Ok(extent) => Some(extent),
                Err(e) => {
                    warn!(cluster_id = c.id, error = %e, "flow simulation skipped");
                    None
                }
            }
        })
        .collect();

    let events: Vec<EruptionEvent> = clusters
        .into_iter()
        .zip(flows)
        .map(|(cluster, flow)| EruptionEvent { cluster, flow })
        .collect();

    info!(
        events = events.len(),
        rejected = rejected.len(),
        "analysis complete"
    );

    Ok(EruptionDataset { events, rejected })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geo::GeoPoint;
    use crate::terrain::GridGeoreference;

    fn raw(lat: f64, lon: f64, time: &str) -> RawHotspot {
        RawHotspot {
            latitude: lat,
            longitude: lon,
            acq_date: "15/03/2025".to_owned(),
            acq_time: time.to_owned(),
            brightness: 340.0,
            confidence: "h".to_owned(),
            satellite: "SNPP".to_owned(),
            radiative_power: Some(8.0),
            track: Some(0.4),
        }
    }

    fn test_config() -> AnalysisConfig {
        AnalysisConfig::from_key_values(
            "start_day_str = 01/03/2025\n\
             end_day_str = 31/03/2025\n\
             initial_temperature_budget = 10\n\
             cooling_rate_per_cost = 1.0",
        )
        .unwrap()
    }

    #[test]
    fn ungeoreferenced_grid_is_rejected_up_front() {
        let grid = TerrainGrid::flat(5, 5, 100.0, 0.0).unwrap();
        let err = analyze(&[], &grid, &test_config()).unwrap_err();
        assert!(matches!(err, CoreError::Configuration(_)));
    }

    #[test]
    fn empty_input_yields_empty_dataset() {
        let grid = TerrainGrid::flat(5, 5, 100.0, 0.0)
            .unwrap()
            .with_georeference(GridGeoreference {
                origin: GeoPoint::new(0.0, 0.0),
            });
        let dataset = analyze(&[], &grid, &test_config()).unwrap();
        assert!(dataset.events.is_empty());
        assert!(dataset.rejected.is_empty());
    }

    #[test]
    fn rejected_records_are_surfaced_not_dropped() {
        let grid = TerrainGrid::flat(5, 5, 100.0, 0.0)
            .unwrap()
            .with_georeference(GridGeoreference {
                origin: GeoPoint::new(0.0, 0.0),
            });

        let bad = raw(95.0, 0.0, "0100");
        let dataset = analyze(&[bad.clone()], &grid, &test_config()).unwrap();

        assert!(dataset.events.is_empty());
        assert_eq!(dataset.rejected.len(), 1);
        assert_eq!(dataset.rejected[0].field, "latitude");
        assert_eq!(dataset.rejected[0].record, bad);
    }
}

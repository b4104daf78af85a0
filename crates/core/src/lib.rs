//! Lava Flow Analysis Core Library
//!
//! Turns NASA FIRMS satellite thermal-anomaly detections around a volcano
//! into discrete eruption events and simulated lava-flow extents:
//!
//! - Validation and canonicalization of raw hotspot records
//! - Greedy online spatiotemporal clustering that deduplicates overlapping
//!   satellite passes into thermal events
//! - A terrain-aware flow simulator: least-cost frontier expansion over an
//!   elevation grid, bounded by a decaying heat budget
//! - Vent-relative analytics (daily maximum flow distance, breakthrough
//!   propagation speed, cumulative radiative-power statistics, anomaly counts)
//!
//! The core is deterministic and side-effect free: feed retrieval, raw-file
//! caching, DEM loading, and visualization live in the surrounding layers.

pub mod analytics;
pub mod cluster;
pub mod config;
pub mod error;
pub mod flow;
pub mod geo;
pub mod hotspot;
pub mod pipeline;
pub mod terrain;

// Re-export the data model and entry points
pub use analytics::{
    count_by_interval, cumulative_power_stats, daily_max_distances, propagation_events,
    AnomalyCount, CountInterval, CumulativePowerStats, DailyMaxDistance, PropagationEvent,
};
pub use cluster::{cluster, AnomalyCluster, ClusterParams};
pub use config::AnalysisConfig;
pub use error::{ConfigurationError, CoreError, OutOfBoundsError, ValidationError};
pub use flow::{simulate, FlowCell, FlowExtent, FlowParams, DEFAULT_MAX_CELL_VISITS};
pub use geo::{bounding_box, haversine_distance_m, BoundingBox, GeoPoint};
pub use hotspot::{
    dedup_records, normalize, Confidence, HotspotFilter, HotspotRecord, RawHotspot,
};
pub use pipeline::{analyze, EruptionDataset, EruptionEvent, RejectedHotspot};
pub use terrain::{GridGeoreference, TerrainGrid};

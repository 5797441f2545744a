//! Arrival-clock freshness filtering and per-type grouping
//!
//! Builds the per-device [`StaticObservation`] aggregate the vitals
//! extractor works from: read the shared buffer, keep readings for the
//! device that are still fresh on the arrival clock, and group them by
//! reading type in append order.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use log::debug;

use super::store::ObservationStore;
use super::{Observation, ObservationKind, StaticObservation};

/// Arrival-clock freshness. The boundary is exclusive: a reading taken
/// exactly one staleness window ago is already stale.
pub fn is_fresh_on_arrival(
    observation: &Observation,
    now: DateTime<Utc>,
    staleness: Duration,
) -> bool {
    now.signed_duration_since(observation.taken_at) < staleness
}

pub struct SnapshotBuilder {
    store: Arc<ObservationStore>,
    staleness: Duration,
}

impl SnapshotBuilder {
    pub fn new(store: Arc<ObservationStore>, staleness: Duration) -> Self {
        SnapshotBuilder { store, staleness }
    }

    /// Current aggregate for one device, or `None` when the buffer holds no
    /// fresh readings for it.
    pub fn latest_for_device(
        &self,
        device_id: &str,
        now: DateTime<Utc>,
    ) -> Option<StaticObservation> {
        let observations = self.store.read();
        if observations.is_empty() {
            return None;
        }

        let kept: Vec<Observation> = observations
            .into_iter()
            .filter(|observation| {
                observation.device_id == device_id
                    && is_fresh_on_arrival(observation, now, self.staleness)
            })
            .collect();
        debug!(
            "{} fresh observations for device {}",
            kept.len(),
            device_id
        );

        group(kept)
    }
}

/// Group readings by type, preserving append order within each type.
///
/// `last_updated` is the arrival stamp of the last reading of the input
/// sequence overall, not the most recent per type.
pub fn group(observations: Vec<Observation>) -> Option<StaticObservation> {
    let last_updated = observations.last()?.taken_at;

    let mut grouped: HashMap<ObservationKind, Vec<Observation>> = HashMap::new();
    for observation in observations {
        grouped
            .entry(observation.observation_id)
            .or_default()
            .push(observation);
    }

    Some(StaticObservation {
        observations: grouped,
        last_updated,
    })
}

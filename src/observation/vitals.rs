//! Vitals extraction
//!
//! Collapses a device's grouped snapshot into the consolidated record an
//! automated round files. Every vital resolves independently: a value that
//! is stale on the device clock, fails validity, or is simply missing
//! degrades to null without touching the rest of the record. The only total
//! outcome is "no fresh snapshot", reported as `None`.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use chrono_tz::Tz;
use log::{debug, info};

use super::snapshot::SnapshotBuilder;
use super::store::ObservationStore;
use super::validity;
use super::{BloodPressure, DailyRoundObservation, Observation, ObservationKind};

type Grouped = HashMap<ObservationKind, Vec<Observation>>;

/// Device-clock freshness, measured after conversion to the reference zone.
///
/// Unlike the arrival check this boundary is inclusive: the reading is
/// rejected only when it is strictly older than the staleness window. A
/// reading without a device timestamp is never fresh.
pub fn is_fresh_on_device_clock(
    observation: &Observation,
    now: DateTime<Utc>,
    staleness: Duration,
    zone: Tz,
) -> bool {
    let measured_at = match observation.date_time {
        Some(date_time) => date_time.with_timezone(&zone),
        None => return false,
    };
    let local_now = now.with_timezone(&zone);
    local_now.signed_duration_since(measured_at) <= staleness
}

/// Per-type extraction result.
enum ResolvedVital {
    Scalar(f64),
    Temperature {
        value: f64,
        measured_at: DateTime<chrono::FixedOffset>,
    },
    BloodPressure {
        systolic: Option<f64>,
        diastolic: Option<f64>,
    },
}

pub struct VitalsExtractor {
    snapshots: SnapshotBuilder,
    staleness: Duration,
    reference_zone: Tz,
}

impl VitalsExtractor {
    pub fn new(store: Arc<ObservationStore>, staleness: Duration, reference_zone: Tz) -> Self {
        VitalsExtractor {
            snapshots: SnapshotBuilder::new(store, staleness),
            staleness,
            reference_zone,
        }
    }

    /// Consolidated vitals for one device, or `None` when no fresh snapshot
    /// exists. Callers treat `None` as "skip this round", never as an error.
    pub fn vitals_for_device(
        &self,
        device_id: &str,
        now: DateTime<Utc>,
    ) -> Option<DailyRoundObservation> {
        info!("Deriving vitals from observations for device {}", device_id);

        let snapshot = self.snapshots.latest_for_device(device_id, now)?;
        if now.signed_duration_since(snapshot.last_updated) >= self.staleness {
            debug!("Snapshot for device {} is stale, skipping", device_id);
            return None;
        }
        let data = &snapshot.observations;

        let temperature = self
            .resolve(ObservationKind::BodyTemperature1, data, now)
            .or_else(|| self.resolve(ObservationKind::BodyTemperature2, data, now));
        let (temperature, temperature_measured_at) = match temperature {
            Some(ResolvedVital::Temperature { value, measured_at }) => {
                (Some(value), Some(measured_at))
            }
            _ => (None, None),
        };

        let bp = match self.resolve(ObservationKind::BloodPressure, data, now) {
            Some(ResolvedVital::BloodPressure {
                systolic,
                diastolic,
            }) => BloodPressure {
                systolic,
                diastolic,
            },
            _ => BloodPressure::default(),
        };

        Some(DailyRoundObservation {
            taken_at: snapshot.last_updated,
            spo2: self.scalar(ObservationKind::Spo2, data, now),
            ventilator_spo2: self.scalar(ObservationKind::Spo2, data, now),
            resp: self.scalar(ObservationKind::RespiratoryRate, data, now),
            pulse: self
                .scalar(ObservationKind::HeartRate, data, now)
                .or_else(|| self.scalar(ObservationKind::PulseRate, data, now)),
            temperature,
            temperature_measured_at,
            bp,
            rounds_type: "automated",
            is_parsed_by_ocr: false,
        })
    }

    fn scalar(&self, kind: ObservationKind, data: &Grouped, now: DateTime<Utc>) -> Option<f64> {
        match self.resolve(kind, data, now) {
            Some(ResolvedVital::Scalar(value)) => Some(value),
            _ => None,
        }
    }

    /// Resolve one reading type from the grouped data. The last reading of
    /// the type's sequence is authoritative.
    fn resolve(
        &self,
        kind: ObservationKind,
        data: &Grouped,
        now: DateTime<Utc>,
    ) -> Option<ResolvedVital> {
        let observation = data.get(&kind)?.last()?;

        let measured_at = observation
            .date_time?
            .with_timezone(&self.reference_zone);
        if !is_fresh_on_device_clock(observation, now, self.staleness, self.reference_zone) {
            return None;
        }
        if !validity::is_valid(observation) {
            return None;
        }

        match kind {
            ObservationKind::BodyTemperature1 | ObservationKind::BodyTemperature2 => {
                let value = observation.value?;
                let low = observation.low_limit?;
                let high = observation.high_limit?;
                // Strict on both bounds: a value at a limit is rejected.
                if low < value && value < high {
                    Some(ResolvedVital::Temperature {
                        value,
                        measured_at: measured_at.fixed_offset(),
                    })
                } else {
                    None
                }
            }
            ObservationKind::BloodPressure => Some(ResolvedVital::BloodPressure {
                systolic: observation.systolic.as_ref().and_then(|c| c.value),
                diastolic: observation.diastolic.as_ref().and_then(|c| c.value),
            }),
            _ => observation.value.map(ResolvedVital::Scalar),
        }
    }
}

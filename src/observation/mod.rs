//! Device observation types and the vitals pipeline
//!
//! Raw readings pushed by bedside monitors flow through three stages:
//! - the rolling [`store`] shared by all devices,
//! - the freshness filter and per-type grouping in [`snapshot`],
//! - the per-vital extraction in [`vitals`], gated by [`validity`].

pub mod snapshot;
pub mod store;
pub mod validity;
pub mod vitals;

use std::collections::HashMap;

use chrono::{DateTime, FixedOffset, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Reading types emitted by the monitors that the pipeline consumes.
///
/// Variants carry the wire names the devices report; anything else in an
/// ingested batch is treated as malformed and skipped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ObservationKind {
    #[serde(rename = "heart-rate")]
    HeartRate,
    #[serde(rename = "pulse-rate")]
    PulseRate,
    #[serde(rename = "SpO2")]
    Spo2,
    #[serde(rename = "respiratory-rate")]
    RespiratoryRate,
    #[serde(rename = "body-temperature1")]
    BodyTemperature1,
    #[serde(rename = "body-temperature2")]
    BodyTemperature2,
    #[serde(rename = "blood-pressure")]
    BloodPressure,
}

/// Device-reported status of a reading.
///
/// Either the literal `"final"` marker or a `Message-<name>` tag pointing
/// into the validity rules table. The raw wire string is preserved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Status {
    Final,
    Message(String),
}

impl Status {
    /// Message name with the fixed `Message-` prefix stripped.
    pub fn message_name(&self) -> Option<&str> {
        match self {
            Status::Final => None,
            Status::Message(raw) => Some(raw.strip_prefix("Message-").unwrap_or(raw)),
        }
    }
}

impl Serialize for Status {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Status::Final => serializer.serialize_str("final"),
            Status::Message(raw) => serializer.serialize_str(raw),
        }
    }
}

impl<'de> Deserialize<'de> for Status {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        if raw == "final" {
            Ok(Status::Final)
        } else {
            Ok(Status::Message(raw))
        }
    }
}

/// One sub-reading of a composite blood-pressure observation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BpComponent {
    #[serde(default)]
    pub value: Option<f64>,
}

/// A single reading pushed by a monitor.
///
/// `date_time` is the device clock; `taken_at` is stamped when the reading
/// is appended to the store. Both clocks are checked independently before a
/// value surfaces in a snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    pub device_id: String,
    pub observation_id: ObservationKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub systolic: Option<BpComponent>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub diastolic: Option<BpComponent>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<Status>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_time: Option<DateTime<Utc>>,
    pub taken_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub low_limit: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub high_limit: Option<f64>,
}

/// Per-device aggregate of the currently relevant readings, grouped by type.
///
/// Within a type the readings keep their append order; the last element is
/// the authoritative one for scalar extraction. `last_updated` is the
/// `taken_at` of the most recently appended contributing reading overall,
/// not per type.
#[derive(Debug, Clone, PartialEq)]
pub struct StaticObservation {
    pub observations: HashMap<ObservationKind, Vec<Observation>>,
    pub last_updated: DateTime<Utc>,
}

/// Consolidated blood-pressure pair; each side is independently optional.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BloodPressure {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub systolic: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub diastolic: Option<f64>,
}

/// The consolidated vitals record filed for an automated round.
///
/// Every scalar field is either a validated fresh value or null.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailyRoundObservation {
    pub taken_at: DateTime<Utc>,
    pub spo2: Option<f64>,
    pub ventilator_spo2: Option<f64>,
    pub resp: Option<f64>,
    pub pulse: Option<f64>,
    pub temperature: Option<f64>,
    pub temperature_measured_at: Option<DateTime<FixedOffset>>,
    pub bp: BloodPressure,
    pub rounds_type: &'static str,
    pub is_parsed_by_ocr: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn status_deserializes_final_and_message_tags() {
        let status: Status = serde_json::from_value(json!("final")).unwrap();
        assert_eq!(status, Status::Final);

        let status: Status = serde_json::from_value(json!("Message-Leads Off")).unwrap();
        assert_eq!(status, Status::Message("Message-Leads Off".to_string()));
        assert_eq!(status.message_name(), Some("Leads Off"));
    }

    #[test]
    fn status_message_name_tolerates_missing_prefix() {
        let status = Status::Message("Leads Off".to_string());
        assert_eq!(status.message_name(), Some("Leads Off"));
    }

    #[test]
    fn status_round_trips_through_the_wire_string() {
        let raw = json!("Message-No finger in probe");
        let status: Status = serde_json::from_value(raw.clone()).unwrap();
        assert_eq!(serde_json::to_value(&status).unwrap(), raw);
    }

    #[test]
    fn observation_kind_uses_device_wire_names() {
        let kind: ObservationKind = serde_json::from_value(json!("SpO2")).unwrap();
        assert_eq!(kind, ObservationKind::Spo2);
        assert_eq!(
            serde_json::to_value(ObservationKind::BodyTemperature1).unwrap(),
            json!("body-temperature1")
        );
    }

    #[test]
    fn observation_parses_a_device_payload() {
        let payload = json!({
            "device_id": "192.168.1.12",
            "observation_id": "heart-rate",
            "value": 72.0,
            "status": "final",
            "date_time": "2024-03-01T10:15:00Z",
            "taken_at": "2024-03-01T10:15:02Z",
        });
        let observation: Observation = serde_json::from_value(payload).unwrap();
        assert_eq!(observation.observation_id, ObservationKind::HeartRate);
        assert_eq!(observation.value, Some(72.0));
        assert_eq!(observation.status, Some(Status::Final));
        assert_eq!(observation.systolic, None);
    }

    #[test]
    fn empty_blood_pressure_serializes_as_empty_mapping() {
        let bp = BloodPressure::default();
        assert_eq!(serde_json::to_value(&bp).unwrap(), json!({}));
    }
}

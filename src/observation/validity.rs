//! Validity rules for device status messages
//!
//! Monitors attach free-text status tags to readings. A fixed table maps
//! each known message to the reading category it concerns and whether it
//! invalidates the value. Unknown messages are trusted: a reading is only
//! discarded when the table explicitly flags its message as invalid.

use super::{Observation, ObservationKind, Status};

/// Reading category a status message pertains to. Informational only; the
/// category is not enforced against the observation type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadingCategory {
    Ecg,
    Nibp,
    Spo2,
    Respiration,
    Temperature,
}

/// One entry of the status message table.
#[derive(Debug, Clone, Copy)]
pub struct StatusMessage {
    pub name: &'static str,
    pub description: &'static str,
    pub category: ReadingCategory,
    pub invalid: bool,
}

const fn message(
    name: &'static str,
    description: &'static str,
    category: ReadingCategory,
) -> StatusMessage {
    StatusMessage {
        name,
        description,
        category,
        invalid: false,
    }
}

pub const MESSAGES: &[StatusMessage] = &[
    message("Leads Off", "ECG leads disconnected", ReadingCategory::Ecg),
    message("Asystole", "Arrhythmia - Asystole", ReadingCategory::Ecg),
    message("Missed Beat", "Arrhythmia - Missed beat", ReadingCategory::Ecg),
    message("Tachy Cardia", "Arrhythmia - Tachycardia", ReadingCategory::Ecg),
    message("Brady Cardia", "Arrhythmia - Bradycardia", ReadingCategory::Ecg),
    message(
        "VFIB",
        "Arrhythmia - Ventricular fibrillation",
        ReadingCategory::Ecg,
    ),
    message(
        "VTAC",
        "Arrhythmia - Ventricular tachycardia",
        ReadingCategory::Ecg,
    ),
    message("R ON T", "Arrhythmia - R on T", ReadingCategory::Ecg),
    message("COUPLET", "Arrhythmia - PVC couplet", ReadingCategory::Ecg),
    message("BIGEMINY", "Arrhythmia - Bigeminy", ReadingCategory::Ecg),
    message("TRIGEMINY", "Arrhythmia - Trigeminy", ReadingCategory::Ecg),
    message(
        "PNC",
        "Arrhythmia - Premature nodal contraction",
        ReadingCategory::Ecg,
    ),
    message("PNP", "Arrhythmia - Pace not pacing", ReadingCategory::Ecg),
    message(
        "ARRHYTHMIA",
        "Arrhythmia present, specific rhythm not detected",
        ReadingCategory::Ecg,
    ),
    message("Run of PVCs", "Arrhythmia - Run of PVCs", ReadingCategory::Ecg),
    message(
        "Ventricular Premature Beat",
        "Arrhythmia - Ventricular premature beat",
        ReadingCategory::Ecg,
    ),
    message("PVC High", "Arrhythmia - PVC high", ReadingCategory::Ecg),
    message(
        "Non Standard Ventricular Tachycardia",
        "Arrhythmia - Nonstandard ventricular tachycardia",
        ReadingCategory::Ecg,
    ),
    message(
        "Extreme Tachycardia",
        "Arrhythmia - Extreme tachycardia",
        ReadingCategory::Ecg,
    ),
    message(
        "Extreme Bradycardia",
        "Arrhythmia - Extreme bradycardia",
        ReadingCategory::Ecg,
    ),
    message("Pause", "Arrhythmia - Heart pause", ReadingCategory::Ecg),
    message(
        "Irregular Rhythm",
        "Arrhythmia - Irregular rhythm",
        ReadingCategory::Ecg,
    ),
    message(
        "Ventricular Bradycardia",
        "Arrhythmia - Ventricular bradycardia",
        ReadingCategory::Ecg,
    ),
    message(
        "Ventricular Rhythm",
        "Arrhythmia - Ventricular rhythm",
        ReadingCategory::Ecg,
    ),
    message(
        "Wrong cuff",
        "Cuff size does not match the patient",
        ReadingCategory::Nibp,
    ),
    message("Connect Cuff", "No cuff or loose cuff", ReadingCategory::Nibp),
    message(
        "Measurement error",
        "Measurement taken is erroneous",
        ReadingCategory::Nibp,
    ),
    message(
        "No finger in probe",
        "SpO2 sensor has fallen off the patient finger",
        ReadingCategory::Spo2,
    ),
    message(
        "Probe unplugged",
        "SpO2 sensor probe disconnected from the monitor",
        ReadingCategory::Spo2,
    ),
    // Note the lowercase "off": the respiration message is a distinct entry
    // from the ECG "Leads Off".
    message(
        "Leads off",
        "Respiration leads have fallen off or disconnected",
        ReadingCategory::Respiration,
    ),
    StatusMessage {
        name: "Measurement invalid",
        description: "The measured value is invalid",
        category: ReadingCategory::Temperature,
        invalid: true,
    },
];

/// Outcome of looking a message up in the table.
///
/// `Unknown` defaults to valid: the pipeline trusts a reading unless it is
/// explicitly told the value is compromised.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Validity {
    KnownInvalid,
    KnownValid,
    Unknown,
}

pub fn lookup(message: &str) -> Option<&'static StatusMessage> {
    MESSAGES.iter().find(|entry| entry.name == message)
}

pub fn classify(message: &str) -> Validity {
    match lookup(message) {
        Some(entry) if entry.invalid => Validity::KnownInvalid,
        Some(_) => Validity::KnownValid,
        None => Validity::Unknown,
    }
}

/// Whether a reading may be surfaced in a snapshot.
///
/// A reading with no status is rejected, as is a non-blood-pressure reading
/// without a numeric value. A final status is always accepted regardless of
/// message content; otherwise the reading is rejected only when its message
/// is known invalid.
pub fn is_valid(observation: &Observation) -> bool {
    let status = match &observation.status {
        Some(status) => status,
        None => return false,
    };

    if observation.observation_id != ObservationKind::BloodPressure
        && observation.value.is_none()
    {
        return false;
    }

    match status {
        Status::Final => true,
        Status::Message(_) => {
            let name = status.message_name().unwrap_or("");
            classify(name) != Validity::KnownInvalid
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use pretty_assertions::assert_eq;

    fn reading(kind: ObservationKind, value: Option<f64>, status: Option<Status>) -> Observation {
        Observation {
            device_id: "192.168.1.5".to_string(),
            observation_id: kind,
            value,
            systolic: None,
            diastolic: None,
            status,
            date_time: Some(Utc::now()),
            taken_at: Utc::now(),
            low_limit: None,
            high_limit: None,
        }
    }

    #[test]
    fn classify_is_tri_state() {
        assert_eq!(classify("Measurement invalid"), Validity::KnownInvalid);
        assert_eq!(classify("Leads Off"), Validity::KnownValid);
        assert_eq!(classify("Some new firmware message"), Validity::Unknown);
    }

    #[test]
    fn final_status_is_always_valid() {
        let observation = reading(
            ObservationKind::HeartRate,
            Some(72.0),
            Some(Status::Final),
        );
        assert!(is_valid(&observation));
    }

    #[test]
    fn missing_status_rejects_the_reading() {
        let observation = reading(ObservationKind::HeartRate, Some(72.0), None);
        assert!(!is_valid(&observation));
    }

    #[test]
    fn non_numeric_value_rejects_all_types_except_blood_pressure() {
        let observation = reading(ObservationKind::Spo2, None, Some(Status::Final));
        assert!(!is_valid(&observation));

        let observation = reading(ObservationKind::BloodPressure, None, Some(Status::Final));
        assert!(is_valid(&observation));
    }

    #[test]
    fn known_invalid_message_rejects_the_reading() {
        let observation = reading(
            ObservationKind::BodyTemperature1,
            Some(38.0),
            Some(Status::Message("Message-Measurement invalid".to_string())),
        );
        assert!(!is_valid(&observation));
    }

    #[test]
    fn known_valid_message_is_trusted() {
        let observation = reading(
            ObservationKind::HeartRate,
            Some(72.0),
            Some(Status::Message("Message-Leads Off".to_string())),
        );
        assert!(is_valid(&observation));
    }

    #[test]
    fn unknown_message_fails_open() {
        let observation = reading(
            ObservationKind::Spo2,
            Some(97.0),
            Some(Status::Message("Message-Unmapped alarm".to_string())),
        );
        assert!(is_valid(&observation));
    }

    #[test]
    fn respiration_leads_off_is_distinct_from_ecg_entry() {
        let ecg = lookup("Leads Off").unwrap();
        let respiration = lookup("Leads off").unwrap();
        assert_eq!(ecg.category, ReadingCategory::Ecg);
        assert_eq!(respiration.category, ReadingCategory::Respiration);
    }
}

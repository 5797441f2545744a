//! Automated round recording
//!
//! Periodically walks the configured monitors, derives a vitals record for
//! each, and hands present records to a [`RoundSink`]. A device with no
//! fresh snapshot is logged and skipped; the loop never fails a whole pass
//! because one device is silent.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use log::info;
use tokio::time::interval;

use crate::observation::vitals::VitalsExtractor;
use crate::observation::DailyRoundObservation;

/// Consumer of completed round records, e.g. an upstream clinical system.
pub trait RoundSink: Send + Sync {
    fn file_round(&self, device_id: &str, vitals: &DailyRoundObservation);
}

/// Sink used when no upstream filer is wired in.
#[derive(Debug, Default)]
pub struct LogRoundSink;

impl RoundSink for LogRoundSink {
    fn file_round(&self, device_id: &str, vitals: &DailyRoundObservation) {
        info!("Automated round for device {}: {:?}", device_id, vitals);
    }
}

/// One pass over the monitored devices.
pub fn run_round(
    extractor: &VitalsExtractor,
    sink: &dyn RoundSink,
    devices: &[String],
    now: DateTime<Utc>,
) {
    info!("Starting automated rounds for {} monitors", devices.len());
    for device_id in devices {
        match extractor.vitals_for_device(device_id, now) {
            Some(vitals) => sink.file_round(device_id, &vitals),
            None => info!(
                "No fresh observations for device {}, skipping round",
                device_id
            ),
        }
    }
}

pub async fn run_automated_rounds(
    extractor: Arc<VitalsExtractor>,
    sink: Arc<dyn RoundSink>,
    devices: Vec<String>,
    every: Duration,
) {
    let mut ticker = interval(every);
    loop {
        ticker.tick().await;
        run_round(&extractor, sink.as_ref(), &devices, Utc::now());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::{Cache, MemoryCache};
    use crate::observation::store::ObservationStore;
    use crate::observation::{Observation, ObservationKind, Status};
    use chrono::Duration as ChronoDuration;
    use pretty_assertions::assert_eq;
    use std::sync::Mutex;

    #[derive(Default)]
    struct CapturingSink {
        filed: Mutex<Vec<(String, DailyRoundObservation)>>,
    }

    impl RoundSink for CapturingSink {
        fn file_round(&self, device_id: &str, vitals: &DailyRoundObservation) {
            self.filed
                .lock()
                .unwrap()
                .push((device_id.to_string(), vitals.clone()));
        }
    }

    fn heart_rate(device_id: &str, now: DateTime<Utc>) -> Observation {
        Observation {
            device_id: device_id.to_string(),
            observation_id: ObservationKind::HeartRate,
            value: Some(72.0),
            systolic: None,
            diastolic: None,
            status: Some(Status::Final),
            date_time: Some(now),
            taken_at: now,
            low_limit: None,
            high_limit: None,
        }
    }

    #[test]
    fn run_round_files_only_devices_with_fresh_snapshots() {
        let now = Utc::now();
        let cache: Arc<dyn Cache> = Arc::new(MemoryCache::new());
        let store = Arc::new(ObservationStore::new(
            cache,
            "observations",
            ChronoDuration::hours(1),
        ));
        store.append(vec![heart_rate("monitor-1", now)], now);

        let extractor = VitalsExtractor::new(
            store,
            ChronoDuration::milliseconds(5000),
            chrono_tz::Asia::Kolkata,
        );
        let sink = CapturingSink::default();
        let devices = vec!["monitor-1".to_string(), "monitor-2".to_string()];

        run_round(&extractor, &sink, &devices, now);

        let filed = sink.filed.lock().unwrap();
        assert_eq!(filed.len(), 1);
        assert_eq!(filed[0].0, "monitor-1");
        assert_eq!(filed[0].1.pulse, Some(72.0));
    }
}

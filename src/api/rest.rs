use std::convert::Infallible;
use std::sync::Arc;

use chrono::Utc;
use log::warn;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use warp::reply::Json;
use warp::Filter;

use crate::observation::store::ObservationStore;
use crate::observation::vitals::VitalsExtractor;
use crate::observation::Observation;

#[derive(Debug, Serialize, Deserialize)]
pub struct ApiResponse {
    pub status: String,
    pub message: String,
    pub data: Option<Value>,
}

pub struct RestApi {
    store: Arc<ObservationStore>,
    extractor: Arc<VitalsExtractor>,
}

impl RestApi {
    pub fn new(store: Arc<ObservationStore>, extractor: Arc<VitalsExtractor>) -> Self {
        RestApi { store, extractor }
    }

    pub fn routes(&self) -> impl Filter<Extract = impl warp::Reply, Error = warp::Rejection> + Clone {
        self.ingest_observations()
            .or(self.get_vitals())
            .or(self.ping())
    }

    /// Batch ingestion edge. Entries that do not parse as observations are
    /// counted and dropped; the rest of the batch still lands.
    fn ingest_observations(
        &self,
    ) -> impl Filter<Extract = impl warp::Reply, Error = warp::Rejection> + Clone {
        let store = Arc::clone(&self.store);

        warp::path!("observations")
            .and(warp::post())
            .and(warp::body::json())
            .and_then(move |batch: Vec<Value>| {
                let store = Arc::clone(&store);
                async move {
                    let now = Utc::now();
                    let mut accepted = Vec::new();
                    let mut skipped = 0usize;

                    for mut entry in batch {
                        // The arrival stamp belongs to the store, not the
                        // device; fill it in when the sender left it out.
                        if let Value::Object(fields) = &mut entry {
                            fields
                                .entry("taken_at")
                                .or_insert_with(|| json!(now));
                        }
                        match serde_json::from_value::<Observation>(entry) {
                            Ok(observation) => accepted.push(observation),
                            Err(e) => {
                                warn!("Rejecting malformed observation: {}", e);
                                skipped += 1;
                            }
                        }
                    }

                    let stored = store.append(accepted, now);
                    let response = ApiResponse {
                        status: "success".to_string(),
                        message: format!("{} stored, {} skipped", stored, skipped),
                        data: None,
                    };
                    Ok::<Json, Infallible>(warp::reply::json(&response))
                }
            })
    }

    fn get_vitals(
        &self,
    ) -> impl Filter<Extract = impl warp::Reply, Error = warp::Rejection> + Clone {
        let extractor = Arc::clone(&self.extractor);

        warp::path!("vitals" / String)
            .and(warp::get())
            .and_then(move |device_id: String| {
                let extractor = Arc::clone(&extractor);
                async move {
                    let response = match extractor.vitals_for_device(&device_id, Utc::now()) {
                        Some(vitals) => ApiResponse {
                            status: "success".to_string(),
                            message: "Vitals derived".to_string(),
                            data: Some(serde_json::to_value(&vitals).unwrap()),
                        },
                        None => ApiResponse {
                            status: "error".to_string(),
                            message: format!("No fresh observations for device {}", device_id),
                            data: None,
                        },
                    };
                    Ok::<Json, Infallible>(warp::reply::json(&response))
                }
            })
    }

    fn ping(&self) -> impl Filter<Extract = impl warp::Reply, Error = warp::Rejection> + Clone {
        warp::path!("health" / "ping")
            .and(warp::get())
            .map(|| warp::reply::json(&json!({ "pong": Utc::now() })))
    }
}

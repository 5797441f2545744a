//! Vitalsnap: a bedside-monitor vitals aggregation middleware
//!
//! Vitalsnap ingests streaming readings pushed by bedside monitors, keeps a
//! short rolling window of them in a shared cache, and derives a
//! validity-filtered snapshot of a patient's vitals on demand for automated
//! round recording.

pub mod api;
pub mod cache;
pub mod config;
pub mod observation;
pub mod rounds;

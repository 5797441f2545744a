//! HTTP surface
//!
//! Thin warp routes over the pipeline: batch ingestion, on-demand vitals,
//! and a liveness probe. No pipeline logic lives here.

pub mod rest;

//! Core records, ingest and matching rules for evaluating the Waggle Dance
//! Detector (WDD) against manually annotated waggle runs.
//!
//! The modules cover the whole batch: reading annotation spreadsheets and WDD
//! metadata, fitting the HD-to-WDD frame transform from reference markers,
//! and filtering detections by time window, classification and distance.

pub mod geometry;
pub mod ingest;
pub mod matching;
pub mod prelude;
pub mod records;
pub mod telemetry;

pub use prelude::{CandidateFilter, Position, WddError, WddResult};

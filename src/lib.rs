//! Engagement Tracker Library
//!
//! Persisted collections, domain invariants, import/export and the client
//! health aggregation engine. The binary in `main.rs` is a thin CLI over
//! these modules.

pub mod analytics;
pub mod cli;
pub mod config;
pub mod db;
pub mod domain;
pub mod error;
pub mod format;
pub mod interchange;
pub mod reports;
pub mod session;
pub mod store;
pub mod types;

//! Smartlinker - tracked link redirection with click analytics
//!
//! Every redirect through `/redirect` appends one row to an append-only CSV
//! click log. Reports (CTR, per-template, per-day, per-account) are computed
//! by replaying that log.
//!
//! # Features
//! - **server**: HTTP server mode (default)
//! - **cli**: Offline report commands
//!
//! # Architecture
//! - `storage`: Click log format and the append-only event store
//! - `analytics`: Click recording, CTR and aggregation
//! - `api`: HTTP services
//! - `interfaces`: Command-line reports
//! - `config`: Configuration management
//! - `runtime`: Startup wiring and execution modes
//! - `system`: Logging initialization

pub mod analytics;
pub mod api;
pub mod config;
pub mod errors;
pub mod interfaces;
pub mod runtime;
pub mod storage;
pub mod system;
pub mod utils;

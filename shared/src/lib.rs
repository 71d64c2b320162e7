//! Inventory analysis engine
//!
//! Pure domain logic shared by the server: row classification, expiration
//! evaluation, ideal stock estimation, duplicate detection and alert
//! dispatch decisions. Nothing in this crate reads the clock or touches the
//! network; callers pass `today` / `now` and supply store implementations.

pub mod alerts;
pub mod analysis;
pub mod archive;
pub mod classifier;
pub mod error;
pub mod estimator;
pub mod expiration;
pub mod fingerprint;
pub mod history;
pub mod models;
pub mod sample;
pub mod validation;

pub use error::*;
pub use models::*;

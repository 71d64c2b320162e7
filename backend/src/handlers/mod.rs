//! HTTP handlers for the inventory analysis API

pub mod admin;
pub mod alerts;
pub mod analysis;
pub mod health;
pub mod settings;

pub use health::health_check;

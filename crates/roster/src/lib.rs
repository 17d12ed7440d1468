//! Catalog reconciliation, presentation views and the application relay
//! behind the agency site.

pub mod applications;
pub mod catalog;
pub mod config;
pub mod error;
pub mod presentation;
pub mod telemetry;

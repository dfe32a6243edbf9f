//! HTTP handlers for registration-service.

pub mod health;
pub mod metrics;
pub mod registrations;

pub use health::health_check;
pub use metrics::metrics_endpoint;
pub use registrations::{create_registration, list_registrations};

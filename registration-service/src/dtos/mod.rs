pub mod health;
pub mod registration;

pub use health::{ConnectionStatus, HealthResponse};
pub use registration::{CreateRegistrationResponse, ListRegistrationsResponse, RegistrationRequest};

pub mod registration;

pub use registration::{
    format_timestamp, truthy, NewRegistration, Registration, RegistrationDocument,
    REQUIRED_FIELDS,
};

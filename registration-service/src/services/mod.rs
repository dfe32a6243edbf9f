pub mod database;
pub mod memory;
pub mod metrics;
pub mod store;

pub use database::{connect_store, MongoRegistrationStore};
pub use memory::InMemoryRegistrationStore;
pub use metrics::{
    get_metrics, init_metrics, record_registration_created, record_registration_rejected,
};
pub use store::{RegistrationStore, StoreConnection};

//! Adapters implementing the ports in `crate::ports`.

pub mod in_memory_registration_repository;
pub mod notifier;
pub mod postgres_registration_repository;

pub use in_memory_registration_repository::InMemoryRegistrationRepository;
pub use notifier::{HttpNotifier, LoggingNotifier};
pub use postgres_registration_repository::PostgresRegistrationRepository;

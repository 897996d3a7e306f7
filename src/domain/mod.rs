//! Domain layer: entities and value objects with no framework dependencies.

pub mod order_id;
pub mod payment;

pub use order_id::{OrderId, OrderIdError};
pub use payment::{
    PaymentStatus, PaymentUpdate, Registration, RegistrationStatus, Transition, UnknownStatus,
};

//! Use cases orchestrating domain logic over the ports.

pub mod create_checkout;
pub mod reconcile_payment;

pub use create_checkout::{CheckoutError, CreateCheckout};
pub use reconcile_payment::{ReconcileError, ReconcileOutcome, ReconcilePayment};

//! Services which define the core business logic behind the routes.
pub mod checkout;
pub mod notifications;
pub mod orders;
pub mod payments;
pub mod sessions;

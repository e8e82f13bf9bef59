//! Middleware applied in front of the application routes.
pub mod gate;

//! Small helpers shared by the routes.
pub mod httperror;

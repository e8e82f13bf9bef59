//! Defines the state shared across the Axum application.
use std::sync::Arc;

use crate::services::{
    notifications::OrderMailer, orders::OrderStore, payments::EventVerifier,
    sessions::SessionLookup,
};

#[derive(Clone)]
/// The state struct shared across routers. Every client sits behind a narrow
/// trait so tests can swap in doubles.
pub struct AppState {
    /// Where orders are marked paid (a database connection pool in production).
    pub orders: Arc<dyn OrderStore>,
    /// Verifies and parses payment provider webhooks.
    pub events: Arc<dyn EventVerifier>,
    /// Sends order emails to customers.
    pub mailer: Arc<dyn OrderMailer>,
    /// Resolves session cookies for the access gate.
    pub sessions: Arc<dyn SessionLookup>,
    /// Where the access gate sends unauthenticated visitors.
    pub sign_in_url: Arc<str>,
}

//! Constants for the access gate in front of the application routes.
use std::{env::var, sync::LazyLock};

/// Where unauthenticated visitors are sent to sign in. The identity provider
/// owns this flow, the gate only redirects to it.
pub static AUTH_SIGN_IN_URL: LazyLock<String> =
    LazyLock::new(|| var("AUTH_SIGN_IN_URL").unwrap_or_else(|_| String::from("/api/auth/login")));

/// The cookie carrying the session token.
pub const SESSION_COOKIE: &str = "session";

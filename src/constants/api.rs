//! Constants related to the general configuration of the entire API and its deployment.

use std::{env::var, sync::LazyLock};

/// The socket address the HTTP server binds to.
pub static LISTEN_ADDR: LazyLock<String> =
    LazyLock::new(|| var("LISTEN_ADDR").unwrap_or_else(|_| String::from("0.0.0.0:8080")));

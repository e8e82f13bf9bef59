//! Stripe webhook constants.
use std::{env::var, sync::LazyLock};

use super::secrets::read_secret;

/// Signing secret for the webhook endpoint (`whsec_...`).
pub static STRIPE_WEBHOOK_SECRET: LazyLock<String> = LazyLock::new(|| {
    var("STRIPE_WEBHOOK_SECRET").unwrap_or_else(|_| {
        let secret_path = var("STRIPE_WEBHOOK_SECRET_DOCKER_SECRET").expect(
            "Neither STRIPE_WEBHOOK_SECRET nor STRIPE_WEBHOOK_SECRET_DOCKER_SECRET provided in environment variables",
        );
        read_secret(&secret_path).expect("Failed to read STRIPE_WEBHOOK_SECRET docker secret")
    })
});

/// Maximum age in seconds of a signed webhook timestamp. Matches Stripe's SDK default.
pub static STRIPE_WEBHOOK_TOLERANCE: LazyLock<i64> = LazyLock::new(|| {
    var("STRIPE_WEBHOOK_TOLERANCE").map_or(300, |tolerance| {
        tolerance
            .parse()
            .expect("STRIPE_WEBHOOK_TOLERANCE is not a valid number of seconds")
    })
});

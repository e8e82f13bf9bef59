//! Constants for the transactional email provider (Resend).
use std::{env::var, sync::LazyLock};

use super::secrets::read_secret;

/// API key used to authenticate against the email provider.
pub static RESEND_API_KEY: LazyLock<String> = LazyLock::new(|| {
    var("RESEND_API_KEY").unwrap_or_else(|_| {
        let secret_path = var("RESEND_API_KEY_DOCKER_SECRET").expect(
            "Neither RESEND_API_KEY nor RESEND_API_KEY_DOCKER_SECRET provided in environment variables",
        );
        read_secret(&secret_path).expect("Failed to read RESEND_API_KEY docker secret")
    })
});

/// The endpoint emails are submitted to.
pub static RESEND_API_URL: LazyLock<String> = LazyLock::new(|| {
    var("RESEND_API_URL").unwrap_or_else(|_| String::from("https://api.resend.com/emails"))
});

/// The sender address used for order emails.
pub static EMAIL_FROM: LazyLock<String> =
    LazyLock::new(|| var("EMAIL_FROM").unwrap_or_else(|_| String::from("onboarding@resend.dev")));

//! Postgres connection constants.
use std::{env::var, sync::LazyLock};

use super::secrets::read_secret;

pub static DB_HOST: LazyLock<String> =
    LazyLock::new(|| var("DB_HOST").expect("DB_HOST not provided in environment variables"));

pub static DB_USERNAME: LazyLock<String> = LazyLock::new(|| {
    var("DB_USERNAME").expect("DB_USERNAME not provided in environment variables")
});

pub static DB_DATABASE: LazyLock<String> = LazyLock::new(|| {
    var("DB_DATABASE").expect("DB_DATABASE not provided in environment variables")
});

pub static DB_PASSWORD: LazyLock<String> = LazyLock::new(|| {
    var("DB_PASSWORD").unwrap_or_else(|_| {
        let secret_path = var("DB_PASSWORD_DOCKER_SECRET").expect(
            "Neither DB_PASSWORD nor DB_PASSWORD_DOCKER_SECRET provided in environment variables",
        );
        read_secret(&secret_path).expect("Failed to read DB_PASSWORD docker secret")
    })
});

/// Full connection URL. `DATABASE_URL` wins when set, otherwise it is
/// assembled from the individual `DB_*` variables.
pub static DB_URL: LazyLock<String> = LazyLock::new(|| {
    var("DATABASE_URL").unwrap_or_else(|_| {
        format!(
            "postgres://{}:{}@{}/{}",
            *DB_USERNAME,
            urlencoding::encode(&DB_PASSWORD),
            *DB_HOST,
            *DB_DATABASE
        )
    })
});

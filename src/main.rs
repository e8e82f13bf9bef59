mod constants;
mod db;
mod middleware;
mod routes;
mod services;
mod state;
#[cfg(test)]
mod testing;
mod utils;

use std::sync::Arc;

use constants::{
    api::LISTEN_ADDR,
    auth::AUTH_SIGN_IN_URL,
    email::{EMAIL_FROM, RESEND_API_KEY, RESEND_API_URL},
    stripe::{STRIPE_WEBHOOK_SECRET, STRIPE_WEBHOOK_TOLERANCE},
};
use secrecy::SecretString;
use services::{
    notifications::ResendMailer, payments::StripeWebhookVerifier, sessions::store::Connection,
};
use state::AppState;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    let _ = dotenvy::dotenv();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let db_conn = db::connect()
        .await
        .expect("Failed to connect to the database");
    db::migrate(&db_conn)
        .await
        .expect("Failed to apply database migrations");
    let session_store_conn = Connection::connect()
        .await
        .expect("Failed to connect to the session store");

    let state = AppState {
        orders: Arc::new(db_conn),
        events: Arc::new(StripeWebhookVerifier::new(
            SecretString::from(STRIPE_WEBHOOK_SECRET.clone()),
            *STRIPE_WEBHOOK_TOLERANCE,
        )),
        mailer: Arc::new(ResendMailer::new(
            &RESEND_API_URL,
            SecretString::from(RESEND_API_KEY.clone()),
            &EMAIL_FROM,
        )),
        sessions: Arc::new(session_store_conn),
        sign_in_url: Arc::from(AUTH_SIGN_IN_URL.as_str()),
    };

    let listener = tokio::net::TcpListener::bind(LISTEN_ADDR.as_str())
        .await
        .expect("Failed to bind listener");
    tracing::info!(addr = %LISTEN_ADDR.as_str(), "Storefront API listening");
    axum::serve(listener, routes::create_app(state))
        .await
        .expect("Failed to init Axum service");
}

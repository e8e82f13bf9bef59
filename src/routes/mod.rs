//! API routes within the application. Mainly exposes sub-routers which are
//! assembled into the full application by `create_app`.
pub mod webhook;

use axum::{middleware::from_fn_with_state, routing::get, Extension, Router};

use crate::{middleware::gate::access_gate, services::sessions::UserId, state::AppState};

/// Assemble the application: gated application routes plus the webhook
/// routes, which providers call without a session and so sit outside the gate.
pub fn create_app(state: AppState) -> Router {
    let gated = Router::new()
        .route("/", get(root))
        .layer(from_fn_with_state(state.clone(), access_gate));
    gated
        .nest("/api/webhooks", webhook::create_router())
        .with_state(state)
}

async fn root(Extension(UserId(user_id)): Extension<UserId>) -> String {
    format!("Storefront is running! Signed in as {user_id}.")
}

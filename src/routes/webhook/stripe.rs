//! The Stripe webhook: confirms paid orders when a checkout session completes.
use axum::{
    body::Body,
    extract::{FromRequest, State},
    http::{Request, StatusCode},
    routing::post,
    Json, Router,
};
use serde::Serialize;

use crate::{
    services::{
        checkout::{self, NotificationOutcome},
        orders::errors::OrderConfirmationError,
        payments::{PaymentEvent, VerifiedEvent},
    },
    state::AppState,
    utils::httperror::HttpError,
};

/// Header carrying the provider's signature over the raw body.
const SIGNATURE_HEADER: &str = "stripe-signature";

pub fn create_router() -> Router<AppState> {
    Router::new().route("/stripe", post(stripe_webhook_event))
}

/// A webhook event whose signature has been verified against the raw request body.
pub struct StripeEvent(VerifiedEvent);

impl FromRequest<AppState> for StripeEvent
where
    String: FromRequest<AppState>,
{
    type Rejection = HttpError;

    async fn from_request(req: Request<Body>, state: &AppState) -> Result<Self, Self::Rejection> {
        let signature = if let Some(sig) = req.headers().get(SIGNATURE_HEADER) {
            sig.to_owned()
        } else {
            tracing::warn!("Stripe webhook request is missing a signature");
            return Err(HttpError::new(
                StatusCode::BAD_REQUEST,
                Some(String::from("Missing Stripe signature")),
            ));
        };

        let payload = String::from_request(req, state)
            .await
            .map_err(|_rejection| {
                tracing::error!("Stripe webhook body could not be read as text");
                HttpError::internal()
            })?;

        let signature = signature.to_str().map_err(|_err| {
            tracing::error!("Stripe webhook signature contained non-visible-ASCII characters");
            HttpError::internal()
        })?;

        Ok(Self(
            state
                .events
                .verify_event(&payload, signature)
                .map_err(|err| {
                    tracing::error!("Invalid/Unauthenticated stripe webhook event: {err}");
                    HttpError::internal()
                })?,
        ))
    }
}

/// Body of a successful webhook response.
#[derive(Serialize, Debug)]
pub struct WebhookAck {
    ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    result: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    message: Option<&'static str>,
}

pub async fn stripe_webhook_event(
    State(state): State<AppState>,
    StripeEvent(event): StripeEvent,
) -> Result<Json<WebhookAck>, HttpError> {
    tracing::info!(
        event_id = %event.id(),
        event_type = %event.event_type(),
        "Stripe event received"
    );

    let checkout = match event.classify() {
        Ok(PaymentEvent::CheckoutCompleted(checkout)) => checkout,
        Ok(PaymentEvent::Unhandled(event_type)) => {
            tracing::debug!(%event_type, "Ignoring unhandled stripe event type");
            return Ok(Json(WebhookAck {
                ok: true,
                result: None,
                message: Some("Unhandled event type"),
            }));
        }
        Err(err) => {
            tracing::error!(event_id = %event.id(), "Rejecting checkout.session.completed: {err}");
            return Err(HttpError::internal());
        }
    };

    let receipt = checkout::complete_checkout(&checkout, &*state.orders, &*state.mailer)
        .await
        .map_err(|error| {
            match error {
                OrderConfirmationError::DatabaseError(err) => {
                    tracing::error!("Error raised by database while confirming order: {err}");
                }
                OrderConfirmationError::OrderNonExistent(order_id) => {
                    tracing::error!(
                        "Stripe attempted to confirm order {order_id}, which does not exist."
                    );
                }
            }
            HttpError::internal()
        })?;

    if let NotificationOutcome::Failed(ref reason) = receipt.notification {
        tracing::warn!(
            order_id = %receipt.order.order_id,
            "Order confirmed but customer was not notified: {reason}"
        );
    }

    Ok(Json(WebhookAck {
        ok: true,
        result: Some(event.envelope().clone()),
        message: None,
    }))
}

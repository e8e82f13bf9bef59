//! Test doubles and fixtures shared by the unit tests.
use std::{
    collections::HashMap,
    sync::{Arc, Mutex, PoisonError},
};

use async_trait::async_trait;
use axum::Router;
use secrecy::SecretString;
use serde_json::{json, Value};
use time::{macros::datetime, OffsetDateTime};

use crate::{
    db::models::address::AddressInsert,
    routes,
    services::{
        notifications::{errors::EmailError, OrderMailer, OrderReceivedEmail},
        orders::{errors::OrderConfirmationError, OrderStore, PaidOrder},
        payments::{CompletedCheckout, PostalAddress, StripeWebhookVerifier},
        sessions::{errors::SessionStorageError, SessionLookup, UserId},
    },
    state::AppState,
};

pub const TEST_WEBHOOK_SECRET: &str = "whsec_test_secret";

/// When every order in the in-memory store was placed.
pub const ORDER_CREATED_AT: OffsetDateTime = datetime!(2025-07-04 10:30 UTC);

/// A `checkout.session.completed` event for `order_id` with every field present.
pub fn checkout_event(order_id: &str) -> Value {
    json!({
        "id": "evt_test",
        "object": "event",
        "type": "checkout.session.completed",
        "data": {
            "object": {
                "id": "cs_test",
                "object": "checkout.session",
                "customer_details": {
                    "email": "jane@example.com",
                    "name": "Jane Doe",
                    "address": {
                        "city": "London",
                        "country": "GB",
                        "line1": "2 Bill Road",
                        "line2": null,
                        "postal_code": "SW1A 1AA",
                        "state": null
                    }
                },
                "shipping_details": {
                    "name": "Jane Doe",
                    "address": {
                        "city": "San Francisco",
                        "country": "US",
                        "line1": "1 Ship Street",
                        "line2": "Apt 4",
                        "postal_code": "94103",
                        "state": "CA"
                    }
                },
                "metadata": {
                    "orderId": order_id,
                    "userId": "user_1"
                }
            }
        }
    })
}

/// The typed form of `checkout_event(order_id)`.
pub fn completed_checkout(order_id: &str) -> CompletedCheckout {
    CompletedCheckout {
        order_id: order_id.to_owned(),
        user_id: String::from("user_1"),
        customer_email: String::from("jane@example.com"),
        customer_name: String::from("Jane Doe"),
        shipping: PostalAddress {
            street: String::from("1 Ship Street"),
            city: String::from("San Francisco"),
            postal_code: String::from("94103"),
            country: String::from("US"),
            state: Some(String::from("CA")),
        },
        billing: PostalAddress {
            street: String::from("2 Bill Road"),
            city: String::from("London"),
            postal_code: String::from("SW1A 1AA"),
            country: String::from("GB"),
            state: None,
        },
    }
}

pub fn test_verifier() -> StripeWebhookVerifier {
    StripeWebhookVerifier::new(SecretString::from(TEST_WEBHOOK_SECRET.to_owned()), 300)
}

/// A valid `Stripe-Signature` header for `body`, signed now.
pub fn signature_for(body: &str) -> String {
    let timestamp = OffsetDateTime::now_utc().unix_timestamp();
    format!("t={timestamp},v1={}", test_verifier().sign(body, timestamp))
}

/// One call to `OrderStore::mark_paid`.
#[derive(Debug, Clone)]
pub struct RecordedUpdate {
    pub order_id: String,
    pub shipping: AddressInsert,
    pub billing: AddressInsert,
}

/// An order store holding paid flags in memory and recording every update.
#[derive(Default)]
pub struct InMemoryOrders {
    paid: Mutex<HashMap<String, bool>>,
    updates: Mutex<Vec<RecordedUpdate>>,
}

impl InMemoryOrders {
    pub fn with_order(order_id: &str) -> Self {
        let orders = Self::default();
        orders
            .paid
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(order_id.to_owned(), false);
        orders
    }
    pub fn updates(&self) -> Vec<RecordedUpdate> {
        self.updates
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
    pub fn is_paid(&self, order_id: &str) -> bool {
        self.paid
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(order_id)
            .copied()
            .unwrap_or(false)
    }
}

#[async_trait]
impl OrderStore for InMemoryOrders {
    async fn mark_paid(
        &self,
        order_id: &str,
        shipping: &AddressInsert,
        billing: &AddressInsert,
    ) -> Result<PaidOrder, OrderConfirmationError> {
        let mut paid = self.paid.lock().unwrap_or_else(PoisonError::into_inner);
        let is_paid = paid
            .get_mut(order_id)
            .ok_or_else(|| OrderConfirmationError::OrderNonExistent(order_id.to_owned()))?;
        let was_already_paid = *is_paid;
        *is_paid = true;
        self.updates
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(RecordedUpdate {
                order_id: order_id.to_owned(),
                shipping: shipping.clone(),
                billing: billing.clone(),
            });
        Ok(PaidOrder {
            order_id: order_id.to_owned(),
            user_id: String::from("user_1"),
            created_at: ORDER_CREATED_AT,
            was_already_paid,
        })
    }
}

/// A mailer which records every email and always succeeds.
#[derive(Default)]
pub struct RecordingMailer {
    sent: Mutex<Vec<OrderReceivedEmail>>,
}

impl RecordingMailer {
    pub fn sent(&self) -> Vec<OrderReceivedEmail> {
        self.sent
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

#[async_trait]
impl OrderMailer for RecordingMailer {
    async fn send_order_email(&self, email: &OrderReceivedEmail) -> Result<String, EmailError> {
        email.render()?;
        let mut sent = self.sent.lock().unwrap_or_else(PoisonError::into_inner);
        sent.push(email.clone());
        Ok(format!("msg_{}", sent.len()))
    }
}

/// A mailer whose provider always refuses the message.
pub struct FailingMailer;

#[async_trait]
impl OrderMailer for FailingMailer {
    async fn send_order_email(&self, _email: &OrderReceivedEmail) -> Result<String, EmailError> {
        Err(EmailError::Rejected {
            status: reqwest::StatusCode::UNPROCESSABLE_ENTITY,
            body: String::from("invalid recipient"),
        })
    }
}

/// A session store knowing exactly one token, `valid-token`.
pub struct StaticSessions;

#[async_trait]
impl SessionLookup for StaticSessions {
    async fn user_id(&self, token: &str) -> Result<Option<UserId>, SessionStorageError> {
        Ok((token == "valid-token").then(|| UserId(String::from("user_1"))))
    }
}

/// A session store that cannot be reached.
pub struct BrokenSessions;

#[async_trait]
impl SessionLookup for BrokenSessions {
    async fn user_id(&self, _token: &str) -> Result<Option<UserId>, SessionStorageError> {
        Err(SessionStorageError(redis::RedisError::from((
            redis::ErrorKind::IoError,
            "connection refused",
        ))))
    }
}

/// The full application wired to in-memory doubles.
pub struct TestApp {
    pub orders: Arc<InMemoryOrders>,
    pub mailer: Arc<RecordingMailer>,
    state: AppState,
}

impl TestApp {
    fn build(order_id: &str, failing_mailer: bool, sessions: Arc<dyn SessionLookup>) -> Self {
        let orders = Arc::new(InMemoryOrders::with_order(order_id));
        let recording = Arc::new(RecordingMailer::default());
        let mailer: Arc<dyn OrderMailer> = if failing_mailer {
            Arc::new(FailingMailer)
        } else {
            Arc::clone(&recording) as Arc<dyn OrderMailer>
        };
        let state = AppState {
            orders: Arc::clone(&orders) as Arc<dyn OrderStore>,
            events: Arc::new(test_verifier()),
            mailer,
            sessions,
            sign_in_url: Arc::from("/api/auth/login"),
        };
        Self {
            orders,
            mailer: recording,
            state,
        }
    }
    /// An app with one unpaid order and a mailer that records what it sends.
    pub fn with_order(order_id: &str) -> Self {
        Self::build(order_id, false, Arc::new(StaticSessions))
    }
    /// An app with one unpaid order whose email provider always fails.
    pub fn with_failing_mailer(order_id: &str) -> Self {
        Self::build(order_id, true, Arc::new(StaticSessions))
    }
    /// An app whose session store is unreachable.
    pub fn with_broken_sessions() -> Self {
        Self::build("ord_1", false, Arc::new(BrokenSessions))
    }
    pub fn router(&self) -> Router {
        routes::create_app(self.state.clone())
    }
}

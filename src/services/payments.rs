//! Verification and parsing of payment provider (Stripe) webhook events.
//!
//! A raw webhook body is only trusted once its `Stripe-Signature` header has
//! been checked against the endpoint's signing secret. Verified events are
//! then classified into the closed set of events this service acts upon,
//! rejecting incomplete payloads before any handler logic runs.
use std::collections::HashMap;

use hmac::{Hmac, Mac as _};
use secrecy::{ExposeSecret as _, SecretString};
use serde::Deserialize;
use sha2::Sha256;
use time::OffsetDateTime;

use crate::db::models::address::AddressInsert;

/// The event type emitted when a customer completes a checkout session.
pub const CHECKOUT_SESSION_COMPLETED: &str = "checkout.session.completed";

type HmacSha256 = Hmac<Sha256>;

/// Verifies and parses signed webhook payloads.
pub trait EventVerifier: Send + Sync {
    /// Check `signature` against `payload` and parse the event it carries.
    fn verify_event(
        &self,
        payload: &str,
        signature: &str,
    ) -> Result<VerifiedEvent, errors::VerificationError>;
}

/// Verifies events using Stripe's `t=<timestamp>,v1=<hmac>` signature scheme.
pub struct StripeWebhookVerifier {
    /// The endpoint signing secret.
    secret: SecretString,
    /// Maximum distance in seconds between the signed timestamp and now.
    tolerance: i64,
}

impl StripeWebhookVerifier {
    /// Construct a verifier for the given signing secret.
    pub const fn new(secret: SecretString, tolerance: i64) -> Self {
        Self { secret, tolerance }
    }

    /// Compute the hex encoded signature Stripe would send for `payload` at `timestamp`.
    #[cfg(test)]
    pub fn sign(&self, payload: &str, timestamp: i64) -> String {
        hex::encode(self.mac(payload, timestamp).finalize().into_bytes())
    }

    fn mac(&self, payload: &str, timestamp: i64) -> HmacSha256 {
        let mut mac = HmacSha256::new_from_slice(self.secret.expose_secret().as_bytes())
            .expect("HMAC can take a key of any size");
        mac.update(timestamp.to_string().as_bytes());
        mac.update(b".");
        mac.update(payload.as_bytes());
        mac
    }

    fn verify_at(
        &self,
        payload: &str,
        signature: &str,
        now: i64,
    ) -> Result<VerifiedEvent, errors::VerificationError> {
        let header = SignatureHeader::parse(signature)?;
        if now.abs_diff(header.timestamp) > self.tolerance.unsigned_abs() {
            return Err(errors::VerificationError::TimestampOutsideTolerance {
                timestamp: header.timestamp,
                now,
            });
        }
        let expected = self.mac(payload, header.timestamp);
        let matched = header.signatures.iter().any(|candidate| {
            hex::decode(candidate)
                .is_ok_and(|bytes| expected.clone().verify_slice(&bytes).is_ok())
        });
        if !matched {
            return Err(errors::VerificationError::SignatureMismatch);
        }
        VerifiedEvent::parse(payload)
    }
}

impl EventVerifier for StripeWebhookVerifier {
    fn verify_event(
        &self,
        payload: &str,
        signature: &str,
    ) -> Result<VerifiedEvent, errors::VerificationError> {
        self.verify_at(payload, signature, OffsetDateTime::now_utc().unix_timestamp())
    }
}

/// The parts of a `Stripe-Signature` header.
struct SignatureHeader<'a> {
    timestamp: i64,
    signatures: Vec<&'a str>,
}

impl<'a> SignatureHeader<'a> {
    fn parse(header: &'a str) -> Result<Self, errors::VerificationError> {
        let mut timestamp = None;
        let mut signatures = Vec::new();
        for (key, value) in header
            .split(',')
            .filter_map(|pair| pair.trim().split_once('='))
        {
            match key {
                "t" => timestamp = value.parse().ok(),
                "v1" => signatures.push(value),
                _ => {}
            }
        }
        let timestamp = timestamp.ok_or(errors::VerificationError::MalformedHeader)?;
        if signatures.is_empty() {
            return Err(errors::VerificationError::MalformedHeader);
        }
        Ok(Self {
            timestamp,
            signatures,
        })
    }
}

/// An event whose signature has been verified. Read-only and never persisted.
#[derive(Debug, Clone)]
pub struct VerifiedEvent {
    id: String,
    event_type: String,
    object: serde_json::Value,
    envelope: serde_json::Value,
}

#[derive(Deserialize)]
struct EventEnvelope {
    id: String,
    #[serde(rename = "type")]
    event_type: String,
    data: EventData,
}

#[derive(Deserialize)]
struct EventData {
    object: serde_json::Value,
}

impl VerifiedEvent {
    fn parse(payload: &str) -> Result<Self, errors::VerificationError> {
        let envelope: serde_json::Value = serde_json::from_str(payload)?;
        let EventEnvelope {
            id,
            event_type,
            data,
        } = serde_json::from_value(envelope.clone())?;
        Ok(Self {
            id,
            event_type,
            object: data.object,
            envelope,
        })
    }
    /// The provider's event ID (`evt_...`).
    pub fn id(&self) -> &str {
        &self.id
    }
    /// The event type tag, e.g. `checkout.session.completed`.
    pub fn event_type(&self) -> &str {
        &self.event_type
    }
    /// The complete event as it was received.
    pub const fn envelope(&self) -> &serde_json::Value {
        &self.envelope
    }
    /// Classify this event, validating the payload of events that are acted upon.
    pub fn classify(&self) -> Result<PaymentEvent, errors::IncompleteCheckoutError> {
        if self.event_type == CHECKOUT_SESSION_COMPLETED {
            let session: CheckoutSessionObject = serde_json::from_value(self.object.clone())?;
            Ok(PaymentEvent::CheckoutCompleted(session.try_into()?))
        } else {
            Ok(PaymentEvent::Unhandled(self.event_type.clone()))
        }
    }
}

/// The events this service distinguishes between.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PaymentEvent {
    /// A customer completed checkout, carrying everything needed to confirm the order.
    CheckoutCompleted(CompletedCheckout),
    /// Any other event type. Acknowledged but not acted upon.
    Unhandled(String),
}

/// A postal address as collected by the provider at checkout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostalAddress {
    pub street: String,
    pub city: String,
    pub postal_code: String,
    pub country: String,
    pub state: Option<String>,
}

impl PostalAddress {
    /// Build the INSERT model for this address, addressed to `name`.
    pub fn to_insert(&self, name: &str) -> AddressInsert {
        AddressInsert {
            name: name.to_owned(),
            street: self.street.clone(),
            city: self.city.clone(),
            postal_code: self.postal_code.clone(),
            country: self.country.clone(),
            state: self.state.clone(),
        }
    }
}

/// A completed checkout with every field needed to confirm the order present.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletedCheckout {
    /// The order being paid for, from the session metadata.
    pub order_id: String,
    /// The user who placed the order, from the session metadata.
    pub user_id: String,
    pub customer_email: String,
    pub customer_name: String,
    pub shipping: PostalAddress,
    pub billing: PostalAddress,
}

#[derive(Deserialize)]
struct CheckoutSessionObject {
    customer_details: Option<CustomerDetails>,
    shipping_details: Option<ShippingDetails>,
    collected_information: Option<CollectedInformation>,
    metadata: Option<HashMap<String, String>>,
}

#[derive(Deserialize)]
struct CustomerDetails {
    email: Option<String>,
    name: Option<String>,
    address: Option<WireAddress>,
}

#[derive(Deserialize)]
struct CollectedInformation {
    shipping_details: Option<ShippingDetails>,
}

#[derive(Deserialize)]
struct ShippingDetails {
    address: Option<WireAddress>,
}

#[derive(Deserialize)]
struct WireAddress {
    city: Option<String>,
    country: Option<String>,
    line1: Option<String>,
    postal_code: Option<String>,
    state: Option<String>,
}

/// Take a field that must be present and non-empty.
fn required(
    value: Option<String>,
    field: &'static str,
) -> Result<String, errors::IncompleteCheckoutError> {
    value
        .filter(|value| !value.is_empty())
        .ok_or(errors::IncompleteCheckoutError::MissingField(field))
}

/// Names reported for the required fields of an address.
struct AddressFields {
    street: &'static str,
    city: &'static str,
    postal_code: &'static str,
    country: &'static str,
}

const SHIPPING_FIELDS: AddressFields = AddressFields {
    street: "shipping.line1",
    city: "shipping.city",
    postal_code: "shipping.postal_code",
    country: "shipping.country",
};

const BILLING_FIELDS: AddressFields = AddressFields {
    street: "billing.line1",
    city: "billing.city",
    postal_code: "billing.postal_code",
    country: "billing.country",
};

impl WireAddress {
    fn into_postal(
        self,
        fields: &AddressFields,
    ) -> Result<PostalAddress, errors::IncompleteCheckoutError> {
        Ok(PostalAddress {
            street: required(self.line1, fields.street)?,
            city: required(self.city, fields.city)?,
            postal_code: required(self.postal_code, fields.postal_code)?,
            country: required(self.country, fields.country)?,
            state: self.state.filter(|state| !state.is_empty()),
        })
    }
}

impl TryFrom<CheckoutSessionObject> for CompletedCheckout {
    type Error = errors::IncompleteCheckoutError;

    fn try_from(session: CheckoutSessionObject) -> Result<Self, Self::Error> {
        let customer = session
            .customer_details
            .ok_or(errors::IncompleteCheckoutError::MissingField("customer_details"))?;
        let customer_email = required(customer.email, "customer_details.email")?;
        let customer_name = required(customer.name, "customer_details.name")?;
        let billing = customer
            .address
            .ok_or(errors::IncompleteCheckoutError::MissingField("customer_details.address"))?;
        // Newer API versions moved shipping details under collected_information.
        let shipping = session
            .shipping_details
            .and_then(|details| details.address)
            .or_else(|| {
                session
                    .collected_information
                    .and_then(|collected| collected.shipping_details)
                    .and_then(|details| details.address)
            })
            .ok_or(errors::IncompleteCheckoutError::MissingField("shipping_details.address"))?;
        let mut metadata = session.metadata.unwrap_or_default();
        let order_id = required(metadata.remove("orderId"), "metadata.orderId")?;
        let user_id = required(metadata.remove("userId"), "metadata.userId")?;
        Ok(Self {
            order_id,
            user_id,
            customer_email,
            customer_name,
            shipping: shipping.into_postal(&SHIPPING_FIELDS)?,
            billing: billing.into_postal(&BILLING_FIELDS)?,
        })
    }
}

pub mod errors {
    use thiserror::Error;

    /// Reasons a webhook payload is not trusted.
    #[derive(Error, Debug)]
    pub enum VerificationError {
        #[error("Signature header is missing a timestamp or v1 signature")]
        MalformedHeader,
        #[error("Signed timestamp {timestamp} is outside the tolerance window (now {now})")]
        TimestampOutsideTolerance { timestamp: i64, now: i64 },
        #[error("No signature in the header matches the payload")]
        SignatureMismatch,
        #[error("Signed payload is not a valid event: {0}")]
        MalformedPayload(#[from] serde_json::Error),
    }

    /// A checkout session event without everything needed to confirm its order.
    #[derive(Error, Debug)]
    pub enum IncompleteCheckoutError {
        #[error("Checkout session is missing {0}")]
        MissingField(&'static str),
        #[error("Checkout session object is malformed: {0}")]
        MalformedObject(#[from] serde_json::Error),
    }
}

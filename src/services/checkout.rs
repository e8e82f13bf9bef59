//! Completion of a paid checkout: commit the order state, then notify the customer.
//!
//! The two phases fail differently. The commit must succeed or the whole
//! completion fails and the provider redelivers the event. The notification
//! is best-effort: once the order is marked paid, an email fault is recorded
//! in the receipt and logged, never propagated.
use super::{
    notifications::{OrderMailer, OrderReceivedEmail},
    orders::{errors::OrderConfirmationError, OrderStore, PaidOrder},
    payments::CompletedCheckout,
};

/// What happened to the customer notification after the order was committed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NotificationOutcome {
    /// The provider accepted the email, with the provider's message ID.
    Sent(String),
    /// The email could not be sent. The order is paid regardless.
    Failed(String),
}

/// The result of completing a checkout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletionReceipt {
    pub order: PaidOrder,
    pub notification: NotificationOutcome,
}

/// Mark the checkout's order paid, then send the order received email.
pub async fn complete_checkout(
    checkout: &CompletedCheckout,
    orders: &dyn OrderStore,
    mailer: &dyn OrderMailer,
) -> Result<CompletionReceipt, OrderConfirmationError> {
    let shipping = checkout.shipping.to_insert(&checkout.customer_name);
    let billing = checkout.billing.to_insert(&checkout.customer_name);
    let order = orders
        .mark_paid(&checkout.order_id, &shipping, &billing)
        .await?;
    if order.was_already_paid {
        tracing::warn!(
            order_id = %order.order_id,
            "Order was already paid, addresses re-created from redelivered checkout"
        );
    }
    if order.user_id != checkout.user_id {
        tracing::warn!(
            order_id = %order.order_id,
            order_user_id = %order.user_id,
            checkout_user_id = %checkout.user_id,
            "Checkout metadata names a different user than the order"
        );
    }
    tracing::info!(order_id = %order.order_id, user_id = %order.user_id, "Order marked paid");

    let email = OrderReceivedEmail {
        to: checkout.customer_email.clone(),
        order_id: order.order_id.clone(),
        order_date: order.created_at,
        shipping_name: checkout.customer_name.clone(),
        shipping_address: checkout.shipping.clone(),
    };
    let notification = match mailer.send_order_email(&email).await {
        Ok(message_id) => {
            tracing::info!(order_id = %order.order_id, %message_id, "Order email sent");
            NotificationOutcome::Sent(message_id)
        }
        Err(err) => {
            tracing::error!(order_id = %order.order_id, "Order email failed: {err}");
            NotificationOutcome::Failed(err.to_string())
        }
    };
    Ok(CompletionReceipt {
        order,
        notification,
    })
}

//! Order state changes driven by payment confirmation.
use async_trait::async_trait;
use time::OffsetDateTime;

use crate::db::{
    self,
    errors::DatabaseError,
    models::{
        address::{AddressInsert, AddressKind},
        apporder::AppOrder,
    },
};

/// An order after it has been marked paid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaidOrder {
    pub order_id: String,
    /// The user who placed the order.
    pub user_id: String,
    /// When the order was originally placed.
    pub created_at: OffsetDateTime,
    /// Whether the order had already been marked paid before this confirmation.
    pub was_already_paid: bool,
}

/// The persistent store of orders, as seen by payment confirmation.
#[async_trait]
pub trait OrderStore: Send + Sync {
    /// Mark the order paid, creating and attaching one shipping and one
    /// billing address. Either all of it happens or none of it does.
    async fn mark_paid(
        &self,
        order_id: &str,
        shipping: &AddressInsert,
        billing: &AddressInsert,
    ) -> Result<PaidOrder, errors::OrderConfirmationError>;
}

#[async_trait]
impl OrderStore for db::ConnectionPool {
    async fn mark_paid(
        &self,
        order_id: &str,
        shipping: &AddressInsert,
        billing: &AddressInsert,
    ) -> Result<PaidOrder, errors::OrderConfirmationError> {
        let mut tx = self.begin().await.map_err(DatabaseError::from)?;
        let mut order = AppOrder::select_one_for_update(order_id, &mut tx)
            .await?
            .ok_or_else(|| errors::OrderConfirmationError::OrderNonExistent(order_id.to_owned()))?;
        let was_already_paid = order.is_paid();
        let shipping_address_id = shipping.store(AddressKind::Shipping, &mut tx).await?;
        let billing_address_id = billing.store(AddressKind::Billing, &mut tx).await?;
        order.set_paid(shipping_address_id, billing_address_id);
        order.update(&mut tx).await?;
        tx.commit().await.map_err(DatabaseError::from)?;
        Ok(PaidOrder {
            order_id: order.id().to_owned(),
            user_id: order.user_id().to_owned(),
            created_at: order.created_at(),
            was_already_paid,
        })
    }
}

pub mod errors {
    use crate::db::errors::DatabaseError;
    use thiserror::Error;

    #[derive(Error, Debug)]
    pub enum OrderConfirmationError {
        #[error(transparent)]
        DatabaseError(#[from] DatabaseError),
        #[error("Order {0} does not exist")]
        OrderNonExistent(String),
    }
}

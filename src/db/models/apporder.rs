//! Models mapping to the apporder database table. Represents an order placed
//! by a user, which is marked paid once the payment provider confirms it.
use sqlx::{query, query_as};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::db::{errors::DatabaseError, Connection};

/// An `AppOrder` which is stored in the database. Can only be constructed by
/// reading it from the database.
#[derive(sqlx::FromRow, Debug)]
pub struct AppOrder {
    /// The order's opaque ID primary key.
    id: String,
    /// The user who placed the order.
    user_id: String,
    /// Whether payment for the order has been confirmed.
    is_paid: bool,
    /// When the order was placed.
    created_at: OffsetDateTime,
    /// Where the order ships to, once known.
    shipping_address_id: Option<Uuid>,
    /// The address the order was billed to, once known.
    billing_address_id: Option<Uuid>,
}

impl AppOrder {
    /// Select an order by ID, locking the row until the surrounding
    /// transaction ends.
    pub async fn select_one_for_update(
        id: &str,
        db_conn: &mut Connection,
    ) -> Result<Option<Self>, DatabaseError> {
        Ok(query_as::<_, Self>(
            "SELECT id, user_id, is_paid, created_at, shipping_address_id, billing_address_id \
             FROM apporder WHERE id = $1 FOR UPDATE",
        )
        .bind(id)
        .fetch_optional(db_conn)
        .await?)
    }
    /// Mark the order paid and attach its shipping and billing addresses.
    pub fn set_paid(&mut self, shipping_address_id: Uuid, billing_address_id: Uuid) {
        self.is_paid = true;
        self.shipping_address_id = Some(shipping_address_id);
        self.billing_address_id = Some(billing_address_id);
    }
    /// Update the corresponding database record to match this model's state.
    pub async fn update(&self, db_conn: &mut Connection) -> Result<(), DatabaseError> {
        query(
            "UPDATE apporder SET is_paid = $1, shipping_address_id = $2, billing_address_id = $3 \
             WHERE id = $4",
        )
        .bind(self.is_paid)
        .bind(self.shipping_address_id)
        .bind(self.billing_address_id)
        .bind(&self.id)
        .execute(db_conn)
        .await?;
        Ok(())
    }
    /// Get this order's ID primary key.
    pub fn id(&self) -> &str {
        &self.id
    }
    /// Get the ID of the user who placed this order.
    pub fn user_id(&self) -> &str {
        &self.user_id
    }
    /// Whether payment for this order has been confirmed.
    pub const fn is_paid(&self) -> bool {
        self.is_paid
    }
    /// When this order was placed.
    pub const fn created_at(&self) -> OffsetDateTime {
        self.created_at
    }
}

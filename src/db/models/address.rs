//! Models mapping to the shipping_address and billing_address tables. Both
//! tables share a layout, the kind picks which one a row lives in.
use sqlx::query_scalar;
use uuid::Uuid;

use crate::db::{errors::DatabaseError, Connection};

/// Which of the two address tables a record belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AddressKind {
    /// Where an order is sent.
    Shipping,
    /// Where an order is billed.
    Billing,
}

impl AddressKind {
    const fn insert_query(self) -> &'static str {
        match self {
            Self::Shipping => {
                "INSERT INTO shipping_address (id, name, street, city, postal_code, country, state) \
                 VALUES ($1, $2, $3, $4, $5, $6, $7) RETURNING id"
            }
            Self::Billing => {
                "INSERT INTO billing_address (id, name, street, city, postal_code, country, state) \
                 VALUES ($1, $2, $3, $4, $5, $6, $7) RETURNING id"
            }
        }
    }
}

/// INSERT model for an address. Used ONLY when confirming an order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AddressInsert {
    /// The name of the addressee.
    pub name: String,
    /// The first address line.
    pub street: String,
    /// The city.
    pub city: String,
    /// The postal code.
    pub postal_code: String,
    /// The ISO country code.
    pub country: String,
    /// The state, county or province, where the country has one.
    pub state: Option<String>,
}

impl AddressInsert {
    /// Store this INSERT model in the table for `kind`, returning the new row's ID.
    pub async fn store(
        &self,
        kind: AddressKind,
        db_conn: &mut Connection,
    ) -> Result<Uuid, DatabaseError> {
        Ok(query_scalar::<_, Uuid>(kind.insert_query())
            .bind(Uuid::new_v4())
            .bind(&self.name)
            .bind(&self.street)
            .bind(&self.city)
            .bind(&self.postal_code)
            .bind(&self.country)
            .bind(&self.state)
            .fetch_one(db_conn)
            .await?)
    }
}

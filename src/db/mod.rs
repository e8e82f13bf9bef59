//! Contains database models and interaction code.
pub mod models;
use crate::constants::db as constants;

/// An alias for the underlying DBMS specific pool type.
pub type ConnectionPool = sqlx::PgPool;

/// An alias for a single (possibly transactional) connection.
pub type Connection = sqlx::PgConnection;

/// Initiate a pooled connection to the database.
pub async fn connect() -> Result<ConnectionPool, errors::DatabaseError> {
    Ok(sqlx::PgPool::connect(&constants::DB_URL).await?)
}

/// Bring the schema up to date with the migrations shipped in the binary.
pub async fn migrate(db_conn: &ConnectionPool) -> Result<(), errors::DatabaseError> {
    sqlx::migrate!()
        .run(db_conn)
        .await
        .map_err(|err| errors::DatabaseError(err.into()))
}

pub mod errors {
    use thiserror::Error;

    #[derive(Error, Debug)]
    #[error(transparent)]
    pub struct DatabaseError(#[from] pub sqlx::Error);
}

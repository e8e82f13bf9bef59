//! Lookup of sessions issued by the identity provider. Sessions are created
//! and revoked elsewhere, this service only resolves a token to its user.
pub mod store;
use async_trait::async_trait;

#[derive(Clone, Debug, PartialEq, Eq)]
/// A fully authenticated user ID, inserted into request extensions by the gate.
pub struct UserId(pub String);

/// Resolves session tokens to the user they authenticate.
#[async_trait]
pub trait SessionLookup: Send + Sync {
    /// Get the user associated with `token`, or `None` if the session is
    /// unknown or has expired.
    async fn user_id(&self, token: &str) -> Result<Option<UserId>, errors::SessionStorageError>;
}

#[async_trait]
impl SessionLookup for store::Connection {
    async fn user_id(&self, token: &str) -> Result<Option<UserId>, errors::SessionStorageError> {
        Ok(self.info(token).await?.map(|info| UserId(info.user_id)))
    }
}

pub mod errors {
    use thiserror::Error;

    /// An error returned by the session store.
    #[derive(Error, Debug)]
    #[error(transparent)]
    pub struct SessionStorageError(#[from] pub super::store::StorageError);
}

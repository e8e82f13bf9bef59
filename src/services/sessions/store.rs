//! Provides an abstracted interface to the underlying session store. Accessible only
//! within the session service, since no other part of the code should ever access
//! the session store.
use crate::constants::redis as constants;
use redis::{aio::MultiplexedConnection, AsyncCommands as _, RedisError};

#[derive(Clone)]
/// A connection to the session store. Guaranteed to be safe to clone and share
/// between threads.
pub struct Connection(MultiplexedConnection);

pub type StorageError = RedisError;

/// Information stored under a given session token.
pub(super) struct SessionInfo {
    /// The user ID associated with this session.
    pub user_id: String,
}

impl Connection {
    /// Initiate a new (multiplexed) connection to the session store.
    /// This connection can be cloned and is safe share between threads.
    pub async fn connect() -> Result<Self, StorageError> {
        Ok(Self(
            redis::Client::open(constants::REDIS_URL.as_str())?
                .get_multiplexed_async_connection()
                .await?,
        ))
    }
    /// Get stored session info associated with a given token.
    pub(super) async fn info(&self, token: &str) -> Result<Option<SessionInfo>, StorageError> {
        let key = format!("session:{token}");
        let mut conn = self.0.clone();
        let user_id: Option<String> = conn.hget(&key, "user_id").await?;
        Ok(user_id.map(|user_id| SessionInfo { user_id }))
    }
}

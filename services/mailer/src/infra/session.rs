use std::collections::HashMap;
use std::sync::Arc;

use chrono::{Duration, Utc};
use deadpool_redis::Pool;
use deadpool_redis::redis::AsyncCommands;
use tokio::sync::RwLock;

use mailcraft_session::grant::Grant;

use crate::domain::repository::GrantStore;
use crate::error::MailerError;

/// How long an expired grant stays readable, so the client is told it expired
/// instead of finding no session at all.
pub const EXPIRED_GRANT_GRACE_SECS: u64 = 3600;

fn grant_key(session_id: &str) -> String {
    format!("grant_session:{session_id}")
}

// ── Redis ────────────────────────────────────────────────────────────────────

#[derive(Clone)]
pub struct RedisGrantStore {
    pub pool: Pool,
}

impl GrantStore for RedisGrantStore {
    async fn put(&self, session_id: &str, grant: &Grant) -> Result<(), MailerError> {
        let mut conn = self
            .pool
            .get()
            .await
            .map_err(|e| MailerError::Internal(e.into()))?;
        let payload = serde_json::to_vec(grant).map_err(|e| MailerError::Internal(e.into()))?;
        let ttl = grant.remaining_secs() + EXPIRED_GRANT_GRACE_SECS;
        let (): () = conn
            .set_ex(grant_key(session_id), payload, ttl)
            .await
            .map_err(|e: deadpool_redis::redis::RedisError| MailerError::Internal(e.into()))?;
        Ok(())
    }

    async fn get(&self, session_id: &str) -> Result<Option<Grant>, MailerError> {
        let mut conn = self
            .pool
            .get()
            .await
            .map_err(|e| MailerError::Internal(e.into()))?;
        let value: Option<Vec<u8>> = conn
            .get(grant_key(session_id))
            .await
            .map_err(|e| MailerError::Internal(e.into()))?;
        value
            .map(|bytes| serde_json::from_slice(&bytes))
            .transpose()
            .map_err(|e| MailerError::Internal(e.into()))
    }

    async fn remove(&self, session_id: &str) -> Result<(), MailerError> {
        let mut conn = self
            .pool
            .get()
            .await
            .map_err(|e| MailerError::Internal(e.into()))?;
        let _: i64 = conn
            .del(grant_key(session_id))
            .await
            .map_err(|e| MailerError::Internal(e.into()))?;
        Ok(())
    }
}

// ── In-memory ────────────────────────────────────────────────────────────────

/// Process-local grant store, used when no Redis URL is configured.
#[derive(Clone, Default)]
pub struct MemoryGrantStore {
    grants: Arc<RwLock<HashMap<String, Grant>>>,
}

impl MemoryGrantStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl GrantStore for MemoryGrantStore {
    async fn put(&self, session_id: &str, grant: &Grant) -> Result<(), MailerError> {
        let cutoff = Utc::now() - Duration::seconds(EXPIRED_GRANT_GRACE_SECS as i64);
        let mut grants = self.grants.write().await;
        grants.retain(|_, g| g.expires_at > cutoff);
        grants.insert(session_id.to_owned(), grant.clone());
        Ok(())
    }

    async fn get(&self, session_id: &str) -> Result<Option<Grant>, MailerError> {
        Ok(self.grants.read().await.get(session_id).cloned())
    }

    async fn remove(&self, session_id: &str) -> Result<(), MailerError> {
        self.grants.write().await.remove(session_id);
        Ok(())
    }
}

// ── Backend selection ────────────────────────────────────────────────────────

#[derive(Clone)]
pub enum SessionStore {
    Redis(RedisGrantStore),
    Memory(MemoryGrantStore),
}

impl SessionStore {
    pub fn backend(&self) -> &'static str {
        match self {
            Self::Redis(_) => "redis",
            Self::Memory(_) => "memory",
        }
    }
}

impl GrantStore for SessionStore {
    async fn put(&self, session_id: &str, grant: &Grant) -> Result<(), MailerError> {
        match self {
            Self::Redis(store) => store.put(session_id, grant).await,
            Self::Memory(store) => store.put(session_id, grant).await,
        }
    }

    async fn get(&self, session_id: &str) -> Result<Option<Grant>, MailerError> {
        match self {
            Self::Redis(store) => store.get(session_id).await,
            Self::Memory(store) => store.get(session_id).await,
        }
    }

    async fn remove(&self, session_id: &str) -> Result<(), MailerError> {
        match self {
            Self::Redis(store) => store.remove(session_id).await,
            Self::Memory(store) => store.remove(session_id).await,
        }
    }
}

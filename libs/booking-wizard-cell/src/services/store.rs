use std::collections::HashMap;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use deadpool_redis::{Config, Connection, Pool, Runtime};
use tokio::sync::RwLock;
use tracing::{debug, info};

use crate::error::WizardError;
use crate::models::BookingSession;

/// Where wizard sessions live between requests.
#[async_trait]
pub trait WizardStore: Send + Sync {
    async fn get(&self, id: &str) -> Result<Option<BookingSession>, WizardError>;

    /// Stores the session and restarts its expiry.
    async fn put(&self, session: &BookingSession) -> Result<(), WizardError>;

    /// Returns whether a live session was removed.
    async fn delete(&self, id: &str) -> Result<bool, WizardError>;
}

// ==============================================================================
// IN-PROCESS STORE
// ==============================================================================

pub struct MemoryWizardStore {
    sessions: RwLock<HashMap<String, (BookingSession, Instant)>>,
    ttl: Duration,
}

impl MemoryWizardStore {
    pub fn new(ttl: Duration) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            ttl,
        }
    }

    pub async fn session_count(&self) -> usize {
        self.sessions.read().await.len()
    }
}

#[async_trait]
impl WizardStore for MemoryWizardStore {
    async fn get(&self, id: &str) -> Result<Option<BookingSession>, WizardError> {
        {
            let sessions = self.sessions.read().await;
            match sessions.get(id) {
                None => return Ok(None),
                Some((session, stored_at)) if stored_at.elapsed() < self.ttl => {
                    return Ok(Some(session.clone()));
                }
                Some(_) => {}
            }
        }

        // a put may have refreshed the entry since the read lock was released
        let mut sessions = self.sessions.write().await;
        match sessions.get(id) {
            Some((session, stored_at)) if stored_at.elapsed() < self.ttl => Ok(Some(session.clone())),
            Some(_) => {
                debug!("Wizard session {} expired", id);
                sessions.remove(id);
                Ok(None)
            }
            None => Ok(None),
        }
    }

    async fn put(&self, session: &BookingSession) -> Result<(), WizardError> {
        let mut sessions = self.sessions.write().await;
        sessions.retain(|_, (_, stored_at)| stored_at.elapsed() < self.ttl);
        sessions.insert(session.id.clone(), (session.clone(), Instant::now()));
        Ok(())
    }

    async fn delete(&self, id: &str) -> Result<bool, WizardError> {
        let removed = self.sessions.write().await.remove(id);
        Ok(matches!(removed, Some((_, stored_at)) if stored_at.elapsed() < self.ttl))
    }
}

// ==============================================================================
// REDIS STORE
// ==============================================================================

const KEY_PREFIX: &str = "booking_wizard:";

pub struct RedisWizardStore {
    pool: Pool,
    ttl_secs: u64,
}

impl RedisWizardStore {
    pub async fn new(redis_url: &str, ttl_secs: u64) -> Result<Self, WizardError> {
        let cfg = Config::from_url(redis_url);
        let pool = cfg
            .create_pool(Some(Runtime::Tokio1))
            .map_err(|e| WizardError::Store(format!("Pool creation error: {}", e)))?;

        // Test connection
        let mut conn = pool
            .get()
            .await
            .map_err(|e| WizardError::Store(format!("Connection error: {}", e)))?;
        let _: String = redis::cmd("PING")
            .query_async(&mut conn)
            .await
            .map_err(|e| WizardError::Store(e.to_string()))?;

        info!("Redis wizard store initialized");
        Ok(Self { pool, ttl_secs })
    }

    async fn get_connection(&self) -> Result<Connection, WizardError> {
        self.pool
            .get()
            .await
            .map_err(|e| WizardError::Store(format!("Failed to get Redis connection: {}", e)))
    }

    fn key(id: &str) -> String {
        format!("{}{}", KEY_PREFIX, id)
    }
}

#[async_trait]
impl WizardStore for RedisWizardStore {
    async fn get(&self, id: &str) -> Result<Option<BookingSession>, WizardError> {
        let mut conn = self.get_connection().await?;
        let data: Option<String> = redis::cmd("GET")
            .arg(Self::key(id))
            .query_async(&mut conn)
            .await
            .map_err(|e| WizardError::Store(e.to_string()))?;

        data.map(|json| serde_json::from_str(&json))
            .transpose()
            .map_err(|e| WizardError::Store(format!("Corrupt wizard session {}: {}", id, e)))
    }

    async fn put(&self, session: &BookingSession) -> Result<(), WizardError> {
        let mut conn = self.get_connection().await?;
        let data = serde_json::to_string(session).map_err(|e| WizardError::Store(e.to_string()))?;

        let _: () = redis::cmd("SET")
            .arg(Self::key(&session.id))
            .arg(data)
            .arg("EX")
            .arg(self.ttl_secs)
            .query_async(&mut conn)
            .await
            .map_err(|e| WizardError::Store(e.to_string()))?;
        Ok(())
    }

    async fn delete(&self, id: &str) -> Result<bool, WizardError> {
        let mut conn = self.get_connection().await?;
        let removed: i64 = redis::cmd("DEL")
            .arg(Self::key(id))
            .query_async(&mut conn)
            .await
            .map_err(|e| WizardError::Store(e.to_string()))?;
        Ok(removed > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_memory_store_round_trip() {
        let store = MemoryWizardStore::new(Duration::from_secs(60));
        let session = BookingSession::new();

        store.put(&session).await.unwrap();
        assert_eq!(store.get(&session.id).await.unwrap(), Some(session.clone()));

        assert!(store.delete(&session.id).await.unwrap());
        assert!(store.get(&session.id).await.unwrap().is_none());
        assert!(!store.delete(&session.id).await.unwrap());
    }

    #[tokio::test]
    async fn test_memory_store_keeps_refreshed_session() {
        let store = MemoryWizardStore::new(Duration::from_millis(50));
        let session = BookingSession::new();

        store.put(&session).await.unwrap();
        tokio::time::sleep(Duration::from_millis(60)).await;
        store.put(&session).await.unwrap();

        assert_eq!(store.get(&session.id).await.unwrap(), Some(session.clone()));
        assert_eq!(store.session_count().await, 1);
    }

    #[tokio::test]
    async fn test_memory_store_expires_on_read() {
        let store = MemoryWizardStore::new(Duration::ZERO);
        let session = BookingSession::new();

        store.put(&session).await.unwrap();
        assert!(store.get(&session.id).await.unwrap().is_none());
        assert_eq!(store.session_count().await, 0);
    }
}

use std::sync::Arc;
use std::time::Duration;

use tracing::{info, warn};

use shared_config::AppConfig;

use crate::services::{BookingWizardService, MemoryWizardStore, RedisWizardStore, WizardStore};

#[derive(Clone)]
pub struct WizardState {
    pub config: Arc<AppConfig>,
    pub store: Arc<dyn WizardStore>,
}

impl WizardState {
    pub fn new(config: Arc<AppConfig>, store: Arc<dyn WizardStore>) -> Self {
        Self { config, store }
    }

    /// Sessions go to Redis when `REDIS_URL` is set and reachable, otherwise stay in process.
    pub async fn from_config(config: Arc<AppConfig>) -> Self {
        let ttl = config.wizard_session_ttl_secs;

        let store: Arc<dyn WizardStore> = match config.redis_url.as_deref() {
            Some(url) => match RedisWizardStore::new(url, ttl).await {
                Ok(store) => Arc::new(store),
                Err(e) => {
                    warn!("Redis unavailable for wizard sessions, using memory store: {}", e);
                    Arc::new(MemoryWizardStore::new(Duration::from_secs(ttl)))
                }
            },
            None => {
                info!("REDIS_URL not set, wizard sessions kept in memory");
                Arc::new(MemoryWizardStore::new(Duration::from_secs(ttl)))
            }
        };

        Self { config, store }
    }

    /// In-memory state, used by tests.
    pub fn in_memory(config: Arc<AppConfig>) -> Self {
        let ttl = Duration::from_secs(config.wizard_session_ttl_secs);
        Self::new(config, Arc::new(MemoryWizardStore::new(ttl)))
    }

    pub fn service(&self) -> BookingWizardService {
        BookingWizardService::new(self.config.clone(), self.store.clone())
    }
}

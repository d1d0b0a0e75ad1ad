use std::sync::Arc;

use crate::config::{AppConfig, StoreBackend};
use crate::database::{
    DatabaseError, DatabaseManager, MemoryStore, OpportunityStore, PgOpportunityRepository, PgUserRepository,
    UserStore,
};

/// Shared handles injected into every handler. Built once at startup.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub opportunities: Arc<dyn OpportunityStore>,
    pub users: Arc<dyn UserStore>,
}

impl AppState {
    pub fn new(config: AppConfig, opportunities: Arc<dyn OpportunityStore>, users: Arc<dyn UserStore>) -> Self {
        Self {
            config: Arc::new(config),
            opportunities,
            users,
        }
    }

    /// State backed by one fresh in-memory store for both collections.
    pub fn in_memory(config: AppConfig) -> Self {
        let store = Arc::new(MemoryStore::new());
        Self::new(config, store.clone(), store)
    }

    /// Open the configured backend. Returns the manager too so the caller can close the pool.
    pub async fn connect(config: AppConfig) -> Result<(Self, Option<DatabaseManager>), DatabaseError> {
        match config.database.backend {
            StoreBackend::Memory => {
                tracing::warn!("Using in-memory store; data is lost on shutdown");
                Ok((Self::in_memory(config), None))
            }
            StoreBackend::Postgres => {
                let manager = DatabaseManager::connect(&config.database).await?;
                let opportunities = PgOpportunityRepository::new(manager.collection(DatabaseManager::OPPORTUNITIES)?);
                let users = PgUserRepository::new(manager.collection(DatabaseManager::USERS)?);
                let state = Self::new(config, Arc::new(opportunities), Arc::new(users));
                Ok((state, Some(manager)))
            }
        }
    }
}

use std::sync::Arc;

use crate::{
    auth::repo::{PgUserRepo, UserRepo},
    config::{AppConfig, StoreConfig},
    db,
    memory::MemoryStore,
    todos::repo::{PgTodoRepo, TodoRepo},
};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub users: Arc<dyn UserRepo>,
    pub todos: Arc<dyn TodoRepo>,
}

impl AppState {
    pub async fn init(config: AppConfig) -> anyhow::Result<Self> {
        let config = Arc::new(config);
        match &config.store {
            StoreConfig::Postgres {
                database_url,
                max_connections,
            } => {
                let pool = db::connect(database_url, *max_connections).await?;
                db::migrate(&pool).await?;
                Ok(Self {
                    users: Arc::new(PgUserRepo::new(pool.clone())),
                    todos: Arc::new(PgTodoRepo::new(pool)),
                    config,
                })
            }
            StoreConfig::Memory => {
                tracing::warn!("using in-memory store; data is lost on restart");
                Ok(Self::in_memory(config))
            }
        }
    }

    pub fn in_memory(config: Arc<AppConfig>) -> Self {
        let store = Arc::new(MemoryStore::default());
        Self {
            config,
            users: store.clone(),
            todos: store,
        }
    }
}

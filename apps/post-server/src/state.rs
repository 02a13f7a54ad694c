//! Application state - shared across all handlers.

use std::sync::Arc;

use agora_core::PostService;
use agora_core::ports::EventPublisher;
use agora_infra::{InMemoryEventBus, InMemoryStore};

use crate::config::{AppConfig, EventsBackend};

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub posts: PostService,
    /// Storage backend name, reported by the health check.
    pub storage: &'static str,
}

impl AppState {
    /// Build the service over the configured storage and event bus.
    ///
    /// A configured database that cannot be reached is fatal. An unreachable
    /// Redis only degrades to the in-process bus.
    pub async fn new(config: &AppConfig) -> anyhow::Result<Self> {
        let events = build_events(config.events).await;

        #[cfg(feature = "postgres")]
        let postgres = match &config.database {
            Some(db_config) => Some(Self::postgres(db_config, events.clone()).await?),
            None => None,
        };

        #[cfg(not(feature = "postgres"))]
        let postgres: Option<Self> = {
            if config.database.is_some() {
                tracing::warn!("DATABASE_URL ignored: built without the postgres feature");
            }
            None
        };

        if let Some(state) = postgres {
            tracing::info!("Application state initialized (postgres)");
            return Ok(state);
        }

        if config.database.is_none() {
            tracing::warn!("DATABASE_URL not set. Running on the in-memory store.");
        }
        tracing::info!("Application state initialized (memory)");
        Ok(Self::with_events(events))
    }

    #[cfg(feature = "postgres")]
    async fn postgres(
        db_config: &agora_infra::DatabaseConfig,
        events: Arc<dyn EventPublisher>,
    ) -> anyhow::Result<Self> {
        use agora_infra::{
            PostgresCommentRepository, PostgresLikeRepository, PostgresPostRepository,
            PostgresViewRepository,
        };

        let db = Arc::new(agora_infra::database::connect(db_config).await?);
        Ok(Self {
            posts: PostService::new(
                Arc::new(PostgresPostRepository::new(db.clone())),
                Arc::new(PostgresCommentRepository::new(db.clone())),
                Arc::new(PostgresLikeRepository::new(db.clone())),
                Arc::new(PostgresViewRepository::new(db)),
                events,
            ),
            storage: "postgres",
        })
    }

    /// In-memory storage with the given publisher.
    pub fn with_events(events: Arc<dyn EventPublisher>) -> Self {
        let store = Arc::new(InMemoryStore::new());
        Self {
            posts: PostService::new(store.clone(), store.clone(), store.clone(), store, events),
            storage: "memory",
        }
    }

    /// Fully in-memory state.
    #[cfg(test)]
    pub fn in_memory() -> Self {
        Self::with_events(Arc::new(InMemoryEventBus::default()))
    }
}

async fn build_events(backend: EventsBackend) -> Arc<dyn EventPublisher> {
    match backend {
        EventsBackend::Memory => Arc::new(InMemoryEventBus::default()),
        #[cfg(feature = "redis")]
        EventsBackend::Redis => match agora_infra::RedisEventPublisher::from_env().await {
            Ok(publisher) => Arc::new(publisher),
            Err(e) => {
                tracing::warn!(error = %e, "Redis unavailable. Using in-memory event bus.");
                Arc::new(InMemoryEventBus::default())
            }
        },
        #[cfg(not(feature = "redis"))]
        EventsBackend::Redis => {
            tracing::warn!("Built without the redis feature. Using in-memory event bus.");
            Arc::new(InMemoryEventBus::default())
        }
    }
}

//! # Agora Infrastructure
//!
//! Concrete implementations of the ports defined in `agora-core`: SeaORM
//! repositories, an in-memory store and the event publishers.
//!
//! ## Feature Flags
//!
//! - `full` (default) - All features enabled
//! - `minimal` - No external dependencies, in-memory only
//! - `postgres` - PostgreSQL storage via SeaORM
//! - `redis` - Redis pub/sub event publisher

pub mod database;
pub mod events;
pub mod memory;

pub use database::DatabaseConfig;
pub use events::InMemoryEventBus;
pub use memory::InMemoryStore;

#[cfg(feature = "postgres")]
pub use database::{
    PostgresCommentRepository, PostgresLikeRepository, PostgresPostRepository,
    PostgresViewRepository,
};

#[cfg(feature = "redis")]
pub use events::{RedisConfig, RedisEventPublisher};

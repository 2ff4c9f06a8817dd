pub mod memory;
pub mod postgres;
pub mod redis;
pub mod repository;

pub use memory::MemoryStore;
pub use postgres::{create_pool, run_migrations, PgStore};
pub use self::redis::{create_redis_client, Cache, CacheKey, CacheWriterHandle, MOVIE_KEY_PATTERN};
pub use repository::{
    FriendRepository, MessageRepository, RecommendationRepository, UserRepository,
    WatchlistRepository,
};

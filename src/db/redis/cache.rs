use redis::AsyncCommands;
use redis::Client;
use sha2::{Digest, Sha256};
use std::fmt::Display;
use tokio::sync::mpsc;

use crate::error::AppError;
use crate::error::AppResult;

/// Matches every key written for the TMDb listing
pub const MOVIE_KEY_PATTERN: &str = "tmdb:*";

const SCAN_BATCH: usize = 100;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CacheKey {
    /// One upstream TMDb listing page, optionally for a search term
    MoviePage { page: u32, search: Option<String> },
    /// The TMDb movie genre list
    MovieGenres,
}

impl Display for CacheKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CacheKey::MoviePage { page, search: None } => write!(f, "tmdb:popular:{}", page),
            // Hashed so raw user input never lands in a key name
            CacheKey::MoviePage {
                page,
                search: Some(query),
            } => write!(
                f,
                "tmdb:search:{}:{}",
                hex::encode(Sha256::digest(query.to_lowercase())),
                page
            ),
            CacheKey::MovieGenres => write!(f, "tmdb:genres"),
        }
    }
}

/// Opens a Redis client for the shared catalog cache
pub fn create_redis_client(redis_url: &str) -> anyhow::Result<Client> {
    let client = Client::open(redis_url)?;
    Ok(client)
}

/// Pending write handed to the writer task
struct PendingWrite {
    key: String,
    value: String,
    ttl: u64,
}

/// Redis-backed cache for upstream catalog responses.
///
/// Reads go straight to Redis; writes are queued to a background task so a
/// slow Redis never delays a response.
#[derive(Clone)]
pub struct Cache {
    redis_client: Client,
    write_tx: mpsc::UnboundedSender<PendingWrite>,
}

/// Stops the writer task after draining queued writes
pub struct CacheWriterHandle {
    shutdown_tx: mpsc::Sender<()>,
}

impl CacheWriterHandle {
    pub async fn shutdown(self) {
        let _ = self.shutdown_tx.send(()).await;
        tracing::info!("Cache writer shutdown signal sent");
    }
}

impl Cache {
    /// Creates the cache and spawns its writer task
    pub async fn new(redis_client: Client) -> (Self, CacheWriterHandle) {
        let (write_tx, write_rx) = mpsc::unbounded_channel();
        let (shutdown_tx, shutdown_rx) = mpsc::channel(1);

        let client = redis_client.clone();
        tokio::spawn(async move {
            Self::run_writer(client, write_rx, shutdown_rx).await;
        });

        (
            Self {
                redis_client,
                write_tx,
            },
            CacheWriterHandle { shutdown_tx },
        )
    }

    async fn run_writer(
        client: Client,
        mut write_rx: mpsc::UnboundedReceiver<PendingWrite>,
        mut shutdown_rx: mpsc::Receiver<()>,
    ) {
        tracing::info!("Cache writer task started");

        loop {
            tokio::select! {
                Some(write) = write_rx.recv() => {
                    if let Err(e) = Self::write(&client, write).await {
                        tracing::error!(error = %e, "Failed to write to Redis cache");
                    }
                }
                _ = shutdown_rx.recv() => {
                    // Senders live in every Cache clone, so drain without waiting
                    let mut flushed = 0usize;
                    while let Ok(write) = write_rx.try_recv() {
                        if let Err(e) = Self::write(&client, write).await {
                            tracing::error!(error = %e, "Failed to flush cache write during shutdown");
                        }
                        flushed += 1;
                    }
                    tracing::info!(flushed, "Cache writer task stopped");
                    break;
                }
            }
        }
    }

    async fn write(client: &Client, write: PendingWrite) -> AppResult<()> {
        let mut conn = client.get_multiplexed_async_connection().await?;
        let _: () = conn.set_ex(write.key, write.value, write.ttl).await?;
        Ok(())
    }

    /// Reads and deserializes a cached value; `None` on a miss
    pub async fn get_from_cache<T: serde::de::DeserializeOwned>(
        &self,
        key: &CacheKey,
    ) -> AppResult<Option<T>> {
        let mut conn = self.redis_client.get_multiplexed_async_connection().await?;
        let cached: Option<String> = conn.get(key.to_string()).await?;

        cached
            .map(|json| {
                serde_json::from_str(&json).map_err(|e| {
                    AppError::Internal(format!("Cache deserialization error: {}", e))
                })
            })
            .transpose()
    }

    /// Queues a write with the given TTL in seconds; never blocks the caller
    pub fn set_in_background<T: serde::Serialize>(&self, key: &CacheKey, value: &T, ttl: u64) {
        let value = match serde_json::to_string(value) {
            Ok(json) => json,
            Err(e) => {
                tracing::error!(error = %e, key = %key, "Cache serialization error");
                return;
            }
        };

        let write = PendingWrite {
            key: key.to_string(),
            value,
            ttl,
        };
        if let Err(e) = self.write_tx.send(write) {
            tracing::error!(error = %e, "Cache writer is gone, dropping write");
        }
    }

    /// Removes every key matching a glob `pattern`, returning how many were deleted
    pub async fn invalidate_matching(&self, pattern: &str) -> AppResult<usize> {
        let mut conn = self.redis_client.get_multiplexed_async_connection().await?;

        let mut keys: Vec<String> = Vec::new();
        let mut cursor: u64 = 0;
        loop {
            let (next, batch): (u64, Vec<String>) = redis::cmd("SCAN")
                .arg(cursor)
                .arg("MATCH")
                .arg(pattern)
                .arg("COUNT")
                .arg(SCAN_BATCH)
                .query_async(&mut conn)
                .await?;
            keys.extend(batch);
            if next == 0 {
                break;
            }
            cursor = next;
        }

        if !keys.is_empty() {
            let _: () = conn.del(&keys).await?;
        }
        tracing::info!(pattern, removed = keys.len(), "Cache keys invalidated");
        Ok(keys.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cache_key_display_popular_page() {
        let key = CacheKey::MoviePage {
            page: 3,
            search: None,
        };
        assert_eq!(format!("{}", key), "tmdb:popular:3");
    }

    #[test]
    fn test_cache_key_display_search_is_hashed_case_insensitively() {
        let key = |search: &str| {
            CacheKey::MoviePage {
                page: 1,
                search: Some(search.to_string()),
            }
            .to_string()
        };
        let upper = key("THE MATRIX");

        assert_eq!(upper, key("the matrix"));
        assert_ne!(upper, key("the matrix reloaded"));
        assert!(upper.starts_with("tmdb:search:"));
        assert!(upper.ends_with(":1"));
        assert!(!upper.contains(' '));
        assert_eq!(upper.len(), "tmdb:search:".len() + 64 + ":1".len());
    }

    #[test]
    fn test_cache_key_display_genres() {
        assert_eq!(format!("{}", CacheKey::MovieGenres), "tmdb:genres");
    }

    fn redis_url() -> String {
        std::env::var("REDIS_URL").unwrap_or_else(|_| "redis://localhost:6379".to_string())
    }

    #[tokio::test]
    #[ignore = "requires a running Redis"]
    async fn test_cache_miss() {
        let client = create_redis_client(&redis_url()).unwrap();
        let (cache, _handle) = Cache::new(client).await;

        let key = CacheKey::MoviePage {
            page: 1,
            search: Some("nonexistent_key_12345".to_string()),
        };
        let retrieved: Option<Vec<String>> = cache.get_from_cache(&key).await.unwrap();

        assert_eq!(retrieved, None);
    }

    #[tokio::test]
    #[ignore = "requires a running Redis"]
    async fn test_writes_flushed_on_graceful_shutdown() {
        let client = create_redis_client(&redis_url()).unwrap();
        let (cache, handle) = Cache::new(client.clone()).await;

        let key = CacheKey::MoviePage {
            page: 1,
            search: Some("test_shutdown".to_string()),
        };
        let value = vec!["shutdown_test".to_string()];

        cache.set_in_background(&key, &value, 60);
        handle.shutdown().await;
        tokio::time::sleep(tokio::time::Duration::from_millis(50)).await;

        let retrieved: Option<Vec<String>> = cache.get_from_cache(&key).await.unwrap();
        assert_eq!(retrieved, Some(value));

        let mut conn = client.get_multiplexed_async_connection().await.unwrap();
        let _: () = conn.del(format!("{}", key)).await.unwrap();
    }

    #[tokio::test]
    #[ignore = "requires a running Redis"]
    async fn test_invalidate_matching_removes_pages_and_genres() {
        let client = create_redis_client(&redis_url()).unwrap();
        let (cache, _handle) = Cache::new(client.clone()).await;

        let page = CacheKey::MoviePage {
            page: 7,
            search: Some("test_invalidate_matching".to_string()),
        };
        let mut conn = client.get_multiplexed_async_connection().await.unwrap();
        for key in [&page, &CacheKey::MovieGenres] {
            let _: () = conn.set_ex(key.to_string(), "[]", 60).await.unwrap();
        }

        let removed = cache.invalidate_matching(MOVIE_KEY_PATTERN).await.unwrap();
        assert!(removed >= 2);

        let page_after: Option<Vec<String>> = cache.get_from_cache(&page).await.unwrap();
        let genres_after: Option<Vec<String>> =
            cache.get_from_cache(&CacheKey::MovieGenres).await.unwrap();
        assert_eq!(page_after, None);
        assert_eq!(genres_after, None);
    }
}

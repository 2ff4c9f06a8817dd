/// Read-through caching against the Redis [`Cache`](crate::db::Cache).
///
/// Returns the cached value for `$key` when present. Otherwise awaits
/// `$block`, queues the result for a background write with `$ttl` seconds and
/// returns it. Use it as the tail expression of a function returning
/// `AppResult` so the error type is inferred.
///
/// # Example
/// ```rust,ignore
/// async fn genres(&self) -> AppResult<TmdbGenreList> {
///     cached!(self.cache, CacheKey::MovieGenres, GENRE_TTL, self.fetch_genres())
/// }
/// ```
#[macro_export]
macro_rules! cached {
    ($cache:expr, $key:expr, $ttl:expr, $block:expr) => {{
        let key = $key;
        match $cache.get_from_cache(&key).await {
            Ok(Some(cached)) => {
                tracing::debug!(key = %key, "Cache hit");
                Ok(cached)
            }
            lookup => {
                match lookup {
                    Err(e) => tracing::warn!(error = %e, key = %key, "Cache read failed"),
                    _ => tracing::debug!(key = %key, "Cache miss"),
                }
                let value = $block.await?;
                $cache.set_in_background(&key, &value, $ttl);
                Ok(value)
            }
        }
    }};
}

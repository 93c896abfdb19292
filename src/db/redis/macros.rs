/// Read-through caching around an async computation.
///
/// Returns the value cached under `$key` when present. Otherwise awaits
/// `$block`, queues the result for caching with `$ttl` seconds and returns it.
/// Errors from the cache read or from `$block` are propagated with `?`.
///
/// # Example
/// ```rust,ignore
/// let volumes: Vec<GoogleVolume> = cached!(
///     cache,
///     CacheKey::IsbnLookup(isbn.to_string()),
///     ISBN_CACHE_TTL,
///     async move { fetch_volumes(isbn).await }
/// )?;
/// ```
#[macro_export]
macro_rules! cached {
    ($cache:expr, $key:expr, $ttl:expr, $block:expr) => {{
        let key = $key;
        if let Some(cached) = $cache.get_from_cache(&key).await? {
            tracing::debug!(key = %key, "Cache hit");
            Ok(cached)
        } else {
            tracing::debug!(key = %key, "Cache miss");
            let value = $block.await?;
            $cache.set_in_background(&key, &value, $ttl);
            Ok(value)
        }
    }};
}

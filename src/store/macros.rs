/// A macro to simplify memoization through [`Cache`](crate::store::Cache).
///
/// Returns the cached value when present. Otherwise awaits the block, stores a
/// successful result and returns it. Errors from the block propagate with `?`
/// and are never cached. The key stays locked from lookup to store, so
/// concurrent callers for one key wait for the first fill instead of
/// repeating it.
///
/// # Arguments
/// * `$cache`: The cache instance, exposing `get_from_cache` and `set_in_cache`.
/// * `$key`: The [`CacheKey`](crate::store::CacheKey) for the value.
/// * `$ttl`: `Option<Duration>` lifetime of the stored value.
/// * `$block`: Future computing the value on a miss.
///
/// # Example
/// ```rust,ignore
/// let url = cached!(cache, CacheKey::ImageLookup(name), None, async move {
///     fetch_thumbnail(&name).await
/// });
/// ```
#[macro_export]
macro_rules! cached {
    ($cache:expr, $key:expr, $ttl:expr, $block:expr) => {{
        let key = $key;
        let _key_guard = $cache.lock_key(&key).await;
        if let Some(cached) = $cache.get_from_cache(&key).await {
            Ok(cached)
        } else {
            let value = $block.await?;
            $cache.set_in_cache(&key, ::std::clone::Clone::clone(&value), $ttl).await;
            Ok(value)
        }
    }};
}

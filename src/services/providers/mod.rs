//! Image data provider abstraction
//!
//! A provider performs exactly one lookup attempt against an external catalog.
//! Retrying, memoization and fallback are layered on top by
//! [`CachingImageResolver`](crate::services::images::CachingImageResolver).

use crate::error::AppResult;

pub mod myanimelist;

pub use myanimelist::MyAnimeListProvider;

/// Trait for thumbnail lookup providers
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait ImageProvider: Send + Sync {
    /// Search the catalog for `name` and return the first result's thumbnail
    ///
    /// `Ok(None)` means the catalog answered but had no usable image.
    /// `Err` means the attempt itself failed; see [`AppError::is_transient`](crate::error::AppError::is_transient).
    async fn find_thumbnail(&self, name: &str) -> AppResult<Option<String>>;

    /// Provider name for logging and debugging
    fn name(&self) -> &'static str;
}

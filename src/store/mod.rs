pub mod artifacts;
pub mod cache;

mod macros;

pub use artifacts::{ArtifactError, ArtifactStore};
pub use cache::{Cache, CacheKey, KeyGuard};

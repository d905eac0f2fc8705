pub mod images;
pub mod providers;
pub mod recommendations;
pub mod throttle;

pub use images::{CachingImageResolver, ImageResolver, RetryPolicy};
pub use recommendations::Recommender;
pub use throttle::Throttle;

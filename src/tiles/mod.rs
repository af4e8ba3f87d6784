pub mod cache;
pub mod loader;
pub mod scheduler;
pub mod source;

// Re-exports for convenience
pub use cache::TileCache;
pub use loader::{HttpImageLoader, ImageLoader};
pub use scheduler::{CacheTarget, FetchScheduler, FetchStats, FetchWaker};
pub use source::{TileSource, UrlTemplate};

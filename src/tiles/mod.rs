pub mod cache;
pub mod grid;
pub mod loader;
pub mod queue;
pub mod source;

// Re-exports for convenience
pub use cache::TileCache;
pub use grid::{visible_tiles, VisibleTile};
pub use loader::{decode_image, HttpFetcher, TileFetcher};
pub use queue::FetchScheduler;
pub use source::{OpenStreetMapSource, TileSource, UrlTemplateSource};

use std::num::NonZeroUsize;
use std::sync::Arc;

use image::RgbaImage;
use lru::LruCache;

use crate::core::geo::TileCoord;

/// In-memory cache of decoded tiles.
///
/// Unbounded unless a capacity is given, in which case the least recently
/// drawn tile is evicted first. A tile is never fetched while it is cached.
#[derive(Debug)]
pub struct TileCache {
    cache: LruCache<TileCoord, Arc<RgbaImage>>,
}

impl TileCache {
    /// Create a cache holding at most `capacity` tiles, or every tile when `None`
    pub fn new(capacity: Option<usize>) -> Self {
        let cache = match capacity.and_then(NonZeroUsize::new) {
            Some(capacity) => LruCache::new(capacity),
            None => LruCache::unbounded(),
        };
        Self { cache }
    }

    pub fn unbounded() -> Self {
        Self::new(None)
    }

    /// Get a tile and mark it as recently drawn
    pub fn get(&mut self, coord: &TileCoord) -> Option<Arc<RgbaImage>> {
        self.cache.get(coord).cloned()
    }

    /// Insert a tile, returning the tile evicted to make room (if any)
    pub fn insert(&mut self, coord: TileCoord, image: Arc<RgbaImage>) -> Option<TileCoord> {
        match self.cache.push(coord, image) {
            Some((evicted, _)) if evicted != coord => Some(evicted),
            _ => None,
        }
    }

    pub fn contains(&self, coord: &TileCoord) -> bool {
        self.cache.contains(coord)
    }

    pub fn clear(&mut self) {
        self.cache.clear();
    }

    pub fn len(&self) -> usize {
        self.cache.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cache.is_empty()
    }

    /// Number of cached tiles at `zoom`
    pub fn count_at_zoom(&self, zoom: u8) -> usize {
        self.cache.iter().filter(|(coord, _)| coord.z == zoom).count()
    }
}

impl Default for TileCache {
    fn default() -> Self {
        Self::unbounded()
    }
}

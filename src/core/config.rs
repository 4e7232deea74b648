//! Configuration for the tile compositor
//!
//! `CompositorConfig` collects every tunable the compositor reads: surface size,
//! zoom limits, the altitude-to-span mapping, download concurrency and the
//! texture precision assumed by the consuming renderer. It serializes with serde
//! so hosts can ship it as JSON next to the rest of their settings.

use serde::{Deserialize, Serialize};

use crate::core::constants::{
    ALTITUDE_TO_LAT_SPAN, CANVAS_SIZE, MAX_CONCURRENT_FETCHES, MAX_LAT_SPAN, MAX_VIEW_LATITUDE,
    MAX_ZOOM, MIN_LAT_SPAN, MIN_ZOOM, TILE_MARGIN, TILE_SIZE, TILE_THRESHOLD,
};
use crate::core::viewport::TexturePrecision;
use crate::{CompositorError, Result};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompositorConfig {
    /// Edge length of the square surface in pixels
    pub canvas_size: u32,
    /// Pixel size of tiles served by the tile source
    pub tile_size: u32,
    pub min_zoom: u8,
    pub max_zoom: u8,
    /// Degrees of latitude per unit of altitude
    pub altitude_scale: f64,
    pub min_lat_span: f64,
    pub max_lat_span: f64,
    /// Latitude band the viewport center is clamped to
    pub max_view_lat: f64,
    /// Tiles of margin requested around the viewport window
    pub tile_margin: u32,
    /// Maximum concurrent tile downloads
    pub max_concurrent: usize,
    /// Tile cache bound; `None` keeps every tile for the whole session
    pub cache_capacity: Option<usize>,
    pub precision: TexturePrecision,
    /// Altitude at or below which the composited texture should be shown
    pub tile_threshold: f64,
    pub user_agent: String,
    pub request_timeout_ms: u64,
}

impl Default for CompositorConfig {
    fn default() -> Self {
        Self {
            canvas_size: CANVAS_SIZE,
            tile_size: TILE_SIZE,
            min_zoom: MIN_ZOOM,
            max_zoom: MAX_ZOOM,
            altitude_scale: ALTITUDE_TO_LAT_SPAN,
            min_lat_span: MIN_LAT_SPAN,
            max_lat_span: MAX_LAT_SPAN,
            max_view_lat: MAX_VIEW_LATITUDE,
            tile_margin: TILE_MARGIN,
            max_concurrent: MAX_CONCURRENT_FETCHES,
            cache_capacity: None,
            precision: TexturePrecision::Single,
            tile_threshold: TILE_THRESHOLD,
            user_agent: concat!("globetex/", env!("CARGO_PKG_VERSION")).to_string(),
            request_timeout_ms: 10_000,
        }
    }
}

/// Unified configuration presets
impl CompositorConfig {
    pub fn low_resource() -> Self {
        Self {
            canvas_size: 1024,
            max_concurrent: 4,
            cache_capacity: Some(512),
            ..Self::default()
        }
    }

    /// Small surface so tests stay fast; everything else keeps its default
    pub fn for_testing() -> Self {
        Self {
            canvas_size: 512,
            ..Self::default()
        }
    }

    pub fn with_canvas_size(mut self, canvas_size: u32) -> Self {
        self.canvas_size = canvas_size;
        self
    }

    pub fn with_max_concurrent(mut self, max_concurrent: usize) -> Self {
        self.max_concurrent = max_concurrent;
        self
    }

    pub fn with_cache_capacity(mut self, capacity: Option<usize>) -> Self {
        self.cache_capacity = capacity;
        self
    }

    pub fn with_precision(mut self, precision: TexturePrecision) -> Self {
        self.precision = precision;
        self
    }

    /// Whether a globe at `altitude` should display the composited texture
    pub fn wants_tiles(&self, altitude: f64) -> bool {
        altitude <= self.tile_threshold
    }

    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn validate(&self) -> Result<()> {
        if self.canvas_size == 0 || self.tile_size == 0 {
            return Err(CompositorError::Config(
                "canvas_size and tile_size must be positive".to_string(),
            ));
        }
        if self.min_zoom > self.max_zoom || self.max_zoom > 30 {
            return Err(CompositorError::Config(format!(
                "invalid zoom range {}..={}",
                self.min_zoom, self.max_zoom
            )));
        }
        if !(self.min_lat_span > 0.0 && self.min_lat_span <= self.max_lat_span) {
            return Err(CompositorError::Config(format!(
                "invalid latitude span range {}..={}",
                self.min_lat_span, self.max_lat_span
            )));
        }
        if !(self.altitude_scale > 0.0) {
            return Err(CompositorError::Config(
                "altitude_scale must be positive".to_string(),
            ));
        }
        if !(0.0..=90.0).contains(&self.max_view_lat) {
            return Err(CompositorError::Config(format!(
                "max_view_lat {} outside 0..=90",
                self.max_view_lat
            )));
        }
        if self.max_concurrent == 0 {
            return Err(CompositorError::Config(
                "max_concurrent must be at least 1".to_string(),
            ));
        }
        if self.cache_capacity == Some(0) {
            return Err(CompositorError::Config(
                "cache_capacity must be positive when set".to_string(),
            ));
        }
        Ok(())
    }
}

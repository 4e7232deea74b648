//! # globetex
//!
//! Dynamic texture compositing for 3D globes.
//!
//! A globe renderer wraps one texture around a sphere. A whole-world image is
//! far too coarse once the camera gets close, so this crate keeps a fixed-size
//! square raster that always shows just the region under the camera: a crop of a
//! whole-world base image as the underlay, with slippy-map tiles at the matching
//! zoom drawn on top as they arrive. The renderer maps that raster back onto the
//! sphere with the UV rectangle the compositor reports.

pub mod compositor;
pub mod core;
pub mod prelude;
pub mod rendering;
pub mod runtime;
pub mod tiles;
pub use crate::core::constants;

// Re-export public API
pub use crate::compositor::{CompositorStats, TileCompositor};

pub use crate::core::{
    builder::TileCompositorBuilder,
    config::CompositorConfig,
    geo::{LatLng, TileCoord},
    viewport::{TexturePrecision, TextureTransform, UvBounds, ViewWindow},
};

pub use crate::rendering::surface::Surface;

pub use crate::runtime::{AsyncSpawner, DeferredSpawner};

#[cfg(feature = "tokio-runtime")]
pub use crate::runtime::TokioSpawner;

pub use crate::tiles::{HttpFetcher, OpenStreetMapSource, TileFetcher, TileSource, UrlTemplateSource};

/// Common error types
#[derive(Debug, thiserror::Error)]
pub enum CompositorError {
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("HTTP {status} for {url}")]
    Http { status: u16, url: String },

    #[error("Image decode error: {0}")]
    Decode(#[from] image::ImageError),

    #[error("Invalid image: {0}")]
    InvalidImage(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Compositor not ready: {0}")]
    NotReady(String),

    #[error("Runtime error: {0}")]
    Runtime(String),

    #[error("Fetch error: {0}")]
    Fetch(String),
}

/// Error type alias for convenience
pub type Error = CompositorError;

/// Result type used throughout the library
pub type Result<T> = std::result::Result<T, Error>;
